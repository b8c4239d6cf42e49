use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::error;

use crate::backend::{to_fields, DocumentStore, Fields, Query};
use crate::error::AppError;
use crate::observability::metrics::Metrics;

/// Typed access to backend collections. Every failure is logged and counted
/// here, then handed back to the caller unchanged.
#[derive(Clone)]
pub struct CollectionReader {
    store: Arc<dyn DocumentStore>,
    metrics: Metrics,
}

impl CollectionReader {
    pub fn new(store: Arc<dyn DocumentStore>, metrics: Metrics) -> Self {
        Self { store, metrics }
    }

    pub async fn list<T: DeserializeOwned>(
        &self,
        collection: &str,
        query: &Query,
    ) -> Result<Vec<T>, AppError> {
        let documents = self
            .store
            .query(collection, query)
            .await
            .map_err(|err| self.failed("query", collection, err))?;

        documents
            .into_iter()
            .map(|doc| doc.into_record())
            .collect::<Result<Vec<T>, _>>()
            .map_err(|err| self.failed("decode", collection, err))
    }

    pub async fn get<T: DeserializeOwned>(
        &self,
        collection: &str,
        id: &str,
    ) -> Result<Option<T>, AppError> {
        let document = self
            .store
            .get(collection, id)
            .await
            .map_err(|err| self.failed("get", collection, err))?;

        document
            .map(|doc| doc.into_record())
            .transpose()
            .map_err(|err| self.failed("decode", collection, err))
    }

    pub async fn create<T: Serialize>(&self, collection: &str, record: &T) -> Result<String, AppError> {
        let fields = to_fields(record)?;
        self.store
            .create(collection, fields)
            .await
            .map_err(|err| self.failed("create", collection, err))
    }

    pub async fn set<T: Serialize>(
        &self,
        collection: &str,
        id: &str,
        record: &T,
    ) -> Result<(), AppError> {
        let fields = to_fields(record)?;
        self.store
            .set(collection, id, fields)
            .await
            .map_err(|err| self.failed("set", collection, err))
    }

    pub async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError> {
        self.store
            .update(collection, id, fields)
            .await
            .map_err(|err| self.failed("update", collection, err))
    }

    pub async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError> {
        self.store
            .delete(collection, id)
            .await
            .map_err(|err| self.failed("delete", collection, err))
    }

    fn failed(&self, operation: &str, collection: &str, err: AppError) -> AppError {
        error!(operation, collection, error = %err, "backend call failed");
        self.metrics
            .backend_errors_total
            .with_label_values(&[operation])
            .inc();
        err
    }
}
