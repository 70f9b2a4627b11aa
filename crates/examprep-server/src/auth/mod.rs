mod guards;
mod password;
mod tokens;

pub use guards::{
    bearer_token, AdminAuth, AdminOnly, IdentitySource, OptionalAuth, StudentAuth,
    StudentIdentity, DEMO_STUDENT_EMAIL, DEV_ADMIN_ID,
};
pub use password::{hash_password, verify_password};
pub use tokens::{Claims, TokenIssuer};
