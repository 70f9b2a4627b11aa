use chrono::{DateTime, Utc};
use examprep_core::DocumentId;
use serde::{Deserialize, Serialize};

use crate::error::{require_non_empty, ValidationError};
use crate::rupees_to_paise;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Course {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    #[serde(default)]
    pub description: String,
    /// Price in rupees.
    pub price: f64,
    #[serde(default)]
    pub published: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thumbnail: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Course {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("course name", &self.name)?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError(
                "course price must be a non-negative number".to_string(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn price_in_paise(&self) -> u64 {
        rupees_to_paise(self.price)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub course_id: DocumentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chapter {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub course_id: DocumentId,
    pub subject_id: DocumentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Topic {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub course_id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject_id: Option<DocumentId>,
    pub chapter_id: DocumentId,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Test {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub course_id: DocumentId,
    pub topic_id: DocumentId,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_minutes: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_marks: Option<f64>,
    #[serde(default)]
    pub order: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum OptionKey {
    A,
    B,
    C,
    D,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    #[default]
    Medium,
    Hard,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[allow(non_snake_case)]
pub struct QuestionOptions {
    pub A: String,
    pub B: String,
    pub C: String,
    pub D: String,
}

impl QuestionOptions {
    fn iter(&self) -> impl Iterator<Item = (OptionKey, &str)> {
        [
            (OptionKey::A, self.A.as_str()),
            (OptionKey::B, self.B.as_str()),
            (OptionKey::C, self.C.as_str()),
            (OptionKey::D, self.D.as_str()),
        ]
        .into_iter()
    }
}

fn default_marks() -> f64 {
    2.0
}

fn default_negative_marks() -> f64 {
    0.66
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub test_id: DocumentId,
    pub question_text: String,
    pub options: QuestionOptions,
    pub correct_option: OptionKey,
    #[serde(default)]
    pub explanation: String,
    #[serde(default)]
    pub difficulty: Difficulty,
    #[serde(default = "default_marks")]
    pub marks: f64,
    #[serde(default = "default_negative_marks")]
    pub negative_marks: f64,
    #[serde(default = "default_true")]
    pub is_active: bool,
}

impl Question {
    pub fn validate(&self) -> Result<(), ValidationError> {
        require_non_empty("question text", &self.question_text)?;
        for (key, text) in self.options.iter() {
            if text.trim().is_empty() {
                return Err(ValidationError(format!("option {key:?} must not be empty")));
            }
        }
        if self.marks < 0.0 || self.negative_marks < 0.0 {
            return Err(ValidationError("marks must not be negative".to_string()));
        }
        Ok(())
    }
}
