use chrono::{DateTime, Utc};
use examprep_core::DocumentId;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

use crate::error::{require_non_empty, ValidationError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    Student,
    Admin,
    Subadmin,
}

impl Role {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input.trim() {
            "student" => Ok(Self::Student),
            "admin" => Ok(Self::Admin),
            "subadmin" => Ok(Self::Subadmin),
            other => Err(ValidationError(format!("unknown role `{other}`"))),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Student => "student",
            Self::Admin => "admin",
            Self::Subadmin => "subadmin",
        }
    }

    #[must_use]
    pub const fn is_staff(self) -> bool {
        matches!(self, Self::Admin | Self::Subadmin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnrollmentStatus {
    Locked,
    Unlocked,
}

impl EnrollmentStatus {
    pub fn parse(input: &str) -> Result<Self, ValidationError> {
        match input {
            "locked" => Ok(Self::Locked),
            "unlocked" => Ok(Self::Unlocked),
            _ => Err(ValidationError(
                "Status must be 'locked' or 'unlocked'".to_string(),
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Locked => "locked",
            Self::Unlocked => "unlocked",
        }
    }
}

impl Display for EnrollmentStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Enrollment {
    pub course_id: DocumentId,
    pub status: EnrollmentStatus,
    pub enrolled_at: DateTime<Utc>,
}

/// Result of [`User::set_course_status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnrollmentChange {
    Updated { previous: EnrollmentStatus },
    Added,
}

/// Result of [`User::unlock_course`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnlockOutcome {
    Unlocked,
    AlreadyUnlocked,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    pub name: String,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    #[serde(default)]
    pub role: Role,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub city: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dob: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_category: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected_exam: Option<String>,
    #[serde(default)]
    pub is_email_verified: bool,
    #[serde(default)]
    pub is_phone_verified: bool,
    #[serde(default)]
    pub enrolled_courses: Vec<Enrollment>,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(
        name: &str,
        email: &str,
        phone_number: Option<String>,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        require_non_empty("name", name)?;
        validate_email(email)?;
        Ok(Self {
            id: DocumentId::generate(),
            name: name.trim().to_string(),
            email: email.trim().to_ascii_lowercase(),
            phone_number,
            role: Role::Student,
            city: None,
            gender: None,
            dob: None,
            selected_category: None,
            selected_exam: None,
            is_email_verified: false,
            is_phone_verified: false,
            enrolled_courses: Vec::new(),
            created_at: now,
        })
    }

    #[must_use]
    pub fn enrollment_for(&self, course_id: &DocumentId) -> Option<&Enrollment> {
        self.enrolled_courses
            .iter()
            .find(|e| &e.course_id == course_id)
    }

    #[must_use]
    pub fn has_unlocked(&self, course_id: &DocumentId) -> bool {
        self.enrollment_for(course_id)
            .is_some_and(|e| e.status == EnrollmentStatus::Unlocked)
    }

    #[must_use]
    pub fn has_any_unlocked(&self) -> bool {
        self.enrolled_courses
            .iter()
            .any(|e| e.status == EnrollmentStatus::Unlocked)
    }

    pub fn unlocked_course_ids(&self) -> impl Iterator<Item = &DocumentId> {
        self.enrolled_courses
            .iter()
            .filter(|e| e.status == EnrollmentStatus::Unlocked)
            .map(|e| &e.course_id)
    }

    /// Sets the status of an existing enrollment, or appends a new one.
    pub fn set_course_status(
        &mut self,
        course_id: &DocumentId,
        status: EnrollmentStatus,
        now: DateTime<Utc>,
    ) -> EnrollmentChange {
        if let Some(existing) = self
            .enrolled_courses
            .iter_mut()
            .find(|e| &e.course_id == course_id)
        {
            let previous = existing.status;
            existing.status = status;
            return EnrollmentChange::Updated { previous };
        }
        self.enrolled_courses.push(Enrollment {
            course_id: course_id.clone(),
            status,
            enrolled_at: now,
        });
        EnrollmentChange::Added
    }

    pub fn unlock_course(&mut self, course_id: &DocumentId, now: DateTime<Utc>) -> UnlockOutcome {
        match self.set_course_status(course_id, EnrollmentStatus::Unlocked, now) {
            EnrollmentChange::Updated {
                previous: EnrollmentStatus::Unlocked,
            } => UnlockOutcome::AlreadyUnlocked,
            _ => UnlockOutcome::Unlocked,
        }
    }
}

pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    let email = email.trim();
    let valid = email
        .split_once('@')
        .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.'))
        && !email.contains(char::is_whitespace);
    if !valid {
        return Err(ValidationError(format!("invalid email `{email}`")));
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Admin {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl Admin {
    pub fn new(
        email: &str,
        password_hash: String,
        role: Role,
        now: DateTime<Utc>,
    ) -> Result<Self, ValidationError> {
        validate_email(email)?;
        if !role.is_staff() {
            return Err(ValidationError(
                "admin role must be admin or subadmin".to_string(),
            ));
        }
        Ok(Self {
            id: DocumentId::generate(),
            name: None,
            email: email.trim().to_ascii_lowercase(),
            password_hash,
            phone_number: None,
            role,
            created_at: now,
        })
    }

    #[must_use]
    pub fn profile(&self) -> AdminProfile {
        AdminProfile {
            id: self.id.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone_number: self.phone_number.clone(),
            role: self.role,
            created_at: self.created_at,
        }
    }
}

/// Admin record as exposed over the API; never carries the password hash.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminProfile {
    #[serde(rename = "_id")]
    pub id: DocumentId,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone_number: Option<String>,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}
