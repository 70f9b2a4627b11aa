use chrono::{DateTime, Utc};
use examprep_core::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, ValidationError};

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudyMaterial {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub subject: String,
    pub material_type: String,
    pub file_name: String,
    #[serde(default)]
    pub file_size: String,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub download_count: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course_id: Option<DocumentId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uploaded_by: Option<DocumentId>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl StudyMaterial {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("subject", &self.subject)?;
        require_non_empty("file name", &self.file_name)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AnnouncementKind {
    #[default]
    General,
    Important,
    Update,
    Reminder,
    Maintenance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Audience {
    #[default]
    All,
    Students,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Announcement {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub title: String,
    pub content: String,
    #[serde(default, rename = "type")]
    pub kind: AnnouncementKind,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub target_audience: Audience,
    #[serde(default)]
    pub is_pinned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry_date: Option<DateTime<Utc>>,
    #[serde(default = "default_true")]
    pub is_active: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_by: Option<DocumentId>,
    pub created_at: DateTime<Utc>,
}

impl Announcement {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("title", &self.title)?;
        require_non_empty("content", &self.content)
    }

    #[must_use]
    pub fn is_visible(&self, now: DateTime<Utc>) -> bool {
        self.is_active && self.expiry_date.map_or(true, |expiry| expiry > now)
    }
}
