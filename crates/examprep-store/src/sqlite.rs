use async_trait::async_trait;
use rusqlite::{params, Connection, OptionalExtension};
use serde_json::Value;
use std::path::Path;
use std::sync::{Arc, Mutex};
use tracing::debug;

use crate::backend::{document_id, Collection, DocumentStore};
use crate::error::{StoreError, StoreErrorCode};
use crate::filter::{Filter, Sort};

const SCHEMA_SQL: &str = "
CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, id)
);
";

/// Durable store keeping each document as a JSON row. Filters run in
/// process after a per-collection scan, so results match [`crate::MemoryStore`].
pub struct SqliteStore {
    conn: Arc<Mutex<Connection>>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)?;
        Self::init(conn)
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self, StoreError> {
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA synchronous=NORMAL;")?;
        conn.execute_batch(SCHEMA_SQL)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    async fn run<T, F>(&self, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Connection) -> Result<T, StoreError> + Send + 'static,
    {
        let conn = Arc::clone(&self.conn);
        tokio::task::spawn_blocking(move || {
            let guard = conn
                .lock()
                .map_err(|_| StoreError::internal("sqlite connection lock poisoned"))?;
            op(&guard)
        })
        .await
        .map_err(|e| StoreError::internal(format!("sqlite task failed: {e}")))?
    }
}

fn scan(conn: &Connection, collection: Collection) -> Result<Vec<Value>, StoreError> {
    let mut stmt =
        conn.prepare_cached("SELECT body FROM documents WHERE collection = ?1 ORDER BY id")?;
    let rows = stmt.query_map(params![collection.as_str()], |row| row.get::<_, String>(0))?;
    let mut out = Vec::new();
    for body in rows {
        out.push(serde_json::from_str(&body?)?);
    }
    Ok(out)
}

#[async_trait]
impl DocumentStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn insert(&self, collection: Collection, doc: Value) -> Result<(), StoreError> {
        let id = document_id(&doc)?.to_string();
        let body = serde_json::to_string(&doc)?;
        self.run(move |conn| {
            let inserted = conn.execute(
                "INSERT OR IGNORE INTO documents (collection, id, body) VALUES (?1, ?2, ?3)",
                params![collection.as_str(), id, body],
            )?;
            if inserted == 0 {
                return Err(StoreError::new(
                    StoreErrorCode::Conflict,
                    format!("{} `{id}` already exists", collection.as_str()),
                ));
            }
            Ok(())
        })
        .await
    }

    async fn get(&self, collection: Collection, id: &str) -> Result<Option<Value>, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let body: Option<String> = conn
                .query_row(
                    "SELECT body FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection.as_str(), id],
                    |row| row.get(0),
                )
                .optional()?;
            body.map(|b| serde_json::from_str(&b).map_err(StoreError::from))
                .transpose()
        })
        .await
    }

    async fn find(
        &self,
        collection: Collection,
        filter: &Filter,
        sort: Option<&Sort>,
    ) -> Result<Vec<Value>, StoreError> {
        let filter = filter.clone();
        let sort = sort.cloned();
        let out = self
            .run(move |conn| {
                let mut docs: Vec<Value> = scan(conn, collection)?
                    .into_iter()
                    .filter(|d| filter.matches(d))
                    .collect();
                if let Some(sort) = sort {
                    sort.apply(&mut docs);
                }
                Ok(docs)
            })
            .await?;
        debug!(collection = collection.as_str(), rows = out.len(), "sqlite find");
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
        let id = id.to_string();
        let body = serde_json::to_string(&doc)?;
        self.run(move |conn| {
            let updated = conn.execute(
                "UPDATE documents SET body = ?3 WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id, body],
            )?;
            if updated == 0 {
                return Err(StoreError::not_found(format!(
                    "{} `{id}`",
                    collection.as_str()
                )));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, collection: Collection, id: &str) -> Result<bool, StoreError> {
        let id = id.to_string();
        self.run(move |conn| {
            let removed = conn.execute(
                "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                params![collection.as_str(), id],
            )?;
            Ok(removed > 0)
        })
        .await
    }

    async fn delete_many(
        &self,
        collection: Collection,
        filter: &Filter,
    ) -> Result<usize, StoreError> {
        let filter = filter.clone();
        self.run(move |conn| {
            let ids: Vec<String> = scan(conn, collection)?
                .iter()
                .filter(|d| filter.matches(d))
                .filter_map(|d| d.get("_id").and_then(Value::as_str).map(str::to_string))
                .collect();
            let tx = conn.unchecked_transaction()?;
            {
                let mut stmt =
                    tx.prepare_cached("DELETE FROM documents WHERE collection = ?1 AND id = ?2")?;
                for id in &ids {
                    stmt.execute(params![collection.as_str(), id])?;
                }
            }
            tx.commit()?;
            Ok(ids.len())
        })
        .await
    }
}
