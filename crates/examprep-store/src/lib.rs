#![forbid(unsafe_code)]

mod backend;
mod error;
pub mod filter;
mod memory;
mod repo;
mod sqlite;

pub use backend::{Collection, DocumentStore};
pub use error::{StoreError, StoreErrorCode};
pub use filter::{Condition, Filter, Sort};
pub use memory::MemoryStore;
pub use repo::{Document, Repo};
pub use sqlite::SqliteStore;

pub const CRATE_NAME: &str = "examprep-store";
