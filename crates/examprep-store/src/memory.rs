use async_trait::async_trait;
use serde_json::Value;
use std::collections::{BTreeMap, HashMap};
use tokio::sync::RwLock;

use crate::backend::{document_id, Collection, DocumentStore};
use crate::error::{StoreError, StoreErrorCode};
use crate::filter::{Filter, Sort};

/// Process-local store used in development mode and tests.
#[derive(Default)]
pub struct MemoryStore {
    collections: RwLock<HashMap<Collection, BTreeMap<String, Value>>>,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl DocumentStore for MemoryStore {
    fn backend_tag(&self) -> &'static str {
        "memory"
    }

    async fn insert(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
        let id = document_id(&doc)?.to_string();
        let mut guard = self.collections.write().await;
        let docs = guard.entry(collection).or_default();
        if docs.contains_key(&id) {
            return Err(StoreError::new(
                StoreErrorCode::Conflict,
                format!("{} `{id}` already exists", collection.as_str()),
            ));
        }
        docs.insert(id, doc);
        Ok(())
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let guard = self.collections.read().await;
        Ok(guard.get(&collection).and_then(|docs| docs.get(id)).cloned())
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>, StoreError> {
        let guard = self.collections.read().await;
        let mut out: Vec<Value> = guard
            .get(&collection)
            .map(|docs| docs.values().filter(|d| filter.matches(d)).cloned().collect())
            .unwrap_or_default();
        drop(guard);
        if let Some(sort) = sort {
            sort.apply(&mut out);
        }
        Ok(out)
    }

    async fn replace(
        &self,
        collection: Collection,
        id: &str,
        doc: Value,
    ) -> Result<(), StoreError> {
        if document_id(&doc)? != id {
            return Err(StoreError::validation("document `_id` does not match target id"));
        }
        let mut guard = self.collections.write().await;
        let slot = guard
            .get_mut(&collection)
            .and_then(|docs| docs.get_mut(id))
            .ok_or_else(|| StoreError::not_found(format!("{} `{id}`", collection.as_str())))?;
        *slot = doc;
        Ok(())
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let mut guard = self.collections.write().await;
        Ok(guard
            .get_mut(&collection)
            .is_some_and(|docs| docs.remove(id).is_some()))
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<usize, StoreError> {
        let mut guard = self.collections.write().await;
        let Some(docs) = guard.get_mut(&collection) else {
            return Ok(0);
        };
        let before = docs.len();
        docs.retain(|_, doc| !filter.matches(doc));
        Ok(before - docs.len())
    }
}
