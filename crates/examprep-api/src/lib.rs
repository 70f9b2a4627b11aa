#![forbid(unsafe_code)]

pub mod catalog;
pub mod dto;
pub mod error_mapping;
pub mod errors;
mod openapi;
pub mod params;

pub use catalog::{
    AnnouncementInput, ChapterInput, CourseInput, PublishRequest, QuestionInput,
    StudyMaterialInput, SubjectInput, TestInput, TopicInput,
};
pub use dto::{
    ChangePasswordRequest, CourseStatistics, CreateAdminRequest, CreateOrderRequest,
    LoginRequest, LoginResponse, PaymentSummary, UnlockCourseRequest, UpdateCourseStatusRequest,
    UpdateStudentRequest, VerifiedPaymentFields, VerifyPaymentRequest,
};
pub use errors::{ApiError, ApiErrorCode};
pub use openapi::{openapi_v1_spec, ROUTES};

pub const CRATE_NAME: &str = "examprep-api";
pub const API_VERSION: &str = "v1";
