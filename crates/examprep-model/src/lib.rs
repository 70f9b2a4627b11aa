#![forbid(unsafe_code)]
//! Examprep domain model.
//!
//! Records are document shaped: each carries its own `_id` and refers to
//! its parents by id, the way they are kept in the document store.

mod catalog;
mod content;
mod error;
mod payment;
mod structure;
mod user;

pub use catalog::{
    Chapter, Course, Difficulty, OptionKey, Question, QuestionOptions, Subject, Test, Topic,
};
pub use content::{Announcement, AnnouncementKind, Audience, Priority, StudyMaterial};
pub use error::ValidationError;
pub use payment::{Payment, PaymentStatus, Receipt, ReceiptData};
pub use structure::{assemble_course_structure, ChapterNode, SubjectNode, TopicNode};
pub use user::{
    validate_email, Admin, AdminProfile, Enrollment, EnrollmentChange, EnrollmentStatus, Role,
    UnlockOutcome, User,
};

pub use examprep_core::DocumentId;

pub const CRATE_NAME: &str = "examprep-model";

/// Rupee amounts are stored in paise on payments and receipts.
#[must_use]
pub fn rupees_to_paise(rupees: f64) -> u64 {
    if !rupees.is_finite() || rupees <= 0.0 {
        return 0;
    }
    (rupees * 100.0).round() as u64
}

#[must_use]
pub fn format_paise(paise: u64) -> String {
    format!("{}.{:02}", paise / 100, paise % 100)
}
