use async_trait::async_trait;
use serde_json::Value;

use crate::error::StoreError;
use crate::filter::{Filter, Sort};

/// Flat collections kept by the platform. Hierarchies are expressed through
/// reference fields, never by nesting documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Collection {
    Users,
    Admins,
    Courses,
    Subjects,
    Chapters,
    Topics,
    Tests,
    Questions,
    Payments,
    Receipts,
    StudyMaterials,
    Announcements,
}

impl Collection {
    pub const ALL: [Self; 12] = [
        Self::Users,
        Self::Admins,
        Self::Courses,
        Self::Subjects,
        Self::Chapters,
        Self::Topics,
        Self::Tests,
        Self::Questions,
        Self::Payments,
        Self::Receipts,
        Self::StudyMaterials,
        Self::Announcements,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Users => "users",
            Self::Admins => "admins",
            Self::Courses => "courses",
            Self::Subjects => "subjects",
            Self::Chapters => "chapters",
            Self::Topics => "topics",
            Self::Tests => "tests",
            Self::Questions => "questions",
            Self::Payments => "payments",
            Self::Receipts => "receipts",
            Self::StudyMaterials => "study_materials",
            Self::Announcements => "announcements",
        }
    }
}

/// Document persistence. Every document is a JSON object carrying a
/// string `_id` that is unique within its collection.
#[async_trait]
pub trait DocumentStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn insert(&self, collection: Collection, doc: Value) -> Result<(), StoreError>;

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError>;

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>, StoreError>;

    /// Replaces an existing document wholesale.
    async fn replace(&self, collection: Collection, id: &str, doc: Value)
        -> Result<(), StoreError>;

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError>;

    async fn delete_many(&self, collection: Collection, filter: &Filter)
        -> Result<usize, StoreError>;

    async fn find_one(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<Option<Value>, StoreError> {
        Ok(self.find(collection, filter, None).await?.into_iter().next())
    }

    async fn count(&self, collection: Collection, filter: &Filter) -> Result<usize, StoreError> {
        Ok(self.find(collection, filter, None).await?.len())
    }
}

pub(crate) fn document_id(doc: &Value) -> Result<&str, StoreError> {
    doc.get("_id")
        .and_then(Value::as_str)
        .filter(|id| !id.is_empty())
        .ok_or_else(|| StoreError::validation("document must carry a non-empty string `_id`"))
}
