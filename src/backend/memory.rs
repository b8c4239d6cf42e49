use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use tracing::debug;
use uuid::Uuid;

use super::{Document, DocumentStore, Fields, Query};
use crate::error::AppError;

/// Process-local document store. Can be switched offline to simulate a
/// backend outage.
#[derive(Default)]
pub struct InMemoryStore {
    collections: DashMap<String, BTreeMap<String, Fields>>,
    offline: AtomicBool,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    /// Number of reads that reached the store.
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of writes that reached the store.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn check_online(&self) -> Result<(), AppError> {
        if self.offline.load(Ordering::SeqCst) {
            return Err(AppError::Backend("backend unavailable".to_string()));
        }
        Ok(())
    }

    fn begin_read(&self) -> Result<(), AppError> {
        self.check_online()?;
        self.reads.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn begin_write(&self) -> Result<(), AppError> {
        self.check_online()?;
        self.writes.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

#[async_trait]
impl DocumentStore for InMemoryStore {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError> {
        self.begin_read()?;

        let documents: Vec<Document> = self
            .collections
            .get(collection)
            .map(|docs| {
                docs.iter()
                    .map(|(id, fields)| Document::new(id.clone(), fields.clone()))
                    .collect()
            })
            .unwrap_or_default();

        Ok(query.apply(documents))
    }

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError> {
        self.begin_read()?;

        Ok(self
            .collections
            .get(collection)
            .and_then(|docs| docs.get(id).map(|fields| Document::new(id, fields.clone()))))
    }

    async fn create(&self, collection: &str, fields: Fields) -> Result<String, AppError> {
        self.begin_write()?;

        let id = Uuid::new_v4().simple().to_string();
        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.clone(), fields);

        debug!(collection, document_id = %id, "document created");
        Ok(id)
    }

    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        self.begin_write()?;

        self.collections
            .entry(collection.to_string())
            .or_default()
            .insert(id.to_string(), fields);

        debug!(collection, document_id = %id, "document written");
        Ok(())
    }

    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        self.begin_write()?;

        let mut docs = self
            .collections
            .get_mut(collection)
            .ok_or_else(|| AppError::NotFound(format!("document {collection}/{id} not found")))?;
        let existing = docs
            .get_mut(id)
            .ok_or_else(|| AppError::NotFound(format!("document {collection}/{id} not found")))?;
        existing.extend(fields);

        debug!(collection, document_id = %id, "document updated");
        Ok(())
    }

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.begin_write()?;

        if let Some(mut docs) = self.collections.get_mut(collection) {
            docs.remove(id);
        }

        debug!(collection, document_id = %id, "document deleted");
        Ok(())
    }
}
