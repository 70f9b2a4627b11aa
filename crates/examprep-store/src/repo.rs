use examprep_core::DocumentId;
use examprep_model::{
    Admin, Announcement, Chapter, Course, Payment, Question, Receipt, StudyMaterial, Subject,
    Test, Topic, User,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::backend::{Collection, DocumentStore};
use crate::error::StoreError;
use crate::filter::{Filter, Sort};

/// A record stored in one collection under its own id.
pub trait Document: Serialize + DeserializeOwned + Send + Sync + 'static {
    const COLLECTION: Collection;

    fn id(&self) -> &DocumentId;
}

macro_rules! impl_document {
    ($ty:ty, $collection:expr) => {
        impl Document for $ty {
            const COLLECTION: Collection = $collection;

            fn id(&self) -> &DocumentId {
                &self.id
            }
        }
    };
}

impl_document!(User, Collection::Users);
impl_document!(Admin, Collection::Admins);
impl_document!(Course, Collection::Courses);
impl_document!(Subject, Collection::Subjects);
impl_document!(Chapter, Collection::Chapters);
impl_document!(Topic, Collection::Topics);
impl_document!(Test, Collection::Tests);
impl_document!(Question, Collection::Questions);
impl_document!(Payment, Collection::Payments);
impl_document!(Receipt, Collection::Receipts);
impl_document!(StudyMaterial, Collection::StudyMaterials);
impl_document!(Announcement, Collection::Announcements);

/// Typed view over one collection of a [`DocumentStore`].
pub struct Repo<T> {
    store: Arc<dyn DocumentStore>,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for Repo<T> {
    fn clone(&self) -> Self {
        Self {
            store: Arc::clone(&self.store),
            _marker: PhantomData,
        }
    }
}

fn decode<T: DeserializeOwned>(collection: Collection, doc: Value) -> Result<T, StoreError> {
    serde_json::from_value(doc).map_err(|e| {
        StoreError::internal(format!("corrupt {} document: {e}", collection.as_str()))
    })
}

impl<T: Document> Repo<T> {
    #[must_use]
    pub fn new(store: Arc<dyn DocumentStore>) -> Self {
        Self {
            store,
            _marker: PhantomData,
        }
    }

    pub async fn insert(&self, record: &T) -> Result<(), StoreError> {
        self.store
            .insert(T::COLLECTION, serde_json::to_value(record)?)
            .await
    }

    pub async fn get(&self, id: &DocumentId) -> Result<Option<T>, StoreError> {
        self.store
            .get(T::COLLECTION, id.as_str())
            .await?
            .map(|doc| decode(T::COLLECTION, doc))
            .transpose()
    }

    pub async fn find(&self, filter: &Filter, sort: Option<&Sort>) -> Result<Vec<T>, StoreError> {
        self.store
            .find(T::COLLECTION, filter, sort)
            .await?
            .into_iter()
            .map(|doc| decode(T::COLLECTION, doc))
            .collect()
    }

    pub async fn find_one(&self, filter: &Filter) -> Result<Option<T>, StoreError> {
        self.store
            .find_one(T::COLLECTION, filter)
            .await?
            .map(|doc| decode(T::COLLECTION, doc))
            .transpose()
    }

    pub async fn save(&self, record: &T) -> Result<(), StoreError> {
        self.store
            .replace(
                T::COLLECTION,
                record.id().as_str(),
                serde_json::to_value(record)?,
            )
            .await
    }

    pub async fn delete(&self, id: &DocumentId) -> Result<bool, StoreError> {
        self.store.delete(T::COLLECTION, id.as_str()).await
    }

    pub async fn delete_where(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.store.delete_many(T::COLLECTION, filter).await
    }

    pub async fn count(&self, filter: &Filter) -> Result<usize, StoreError> {
        self.store.count(T::COLLECTION, filter).await
    }
}
