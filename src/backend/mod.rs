pub mod memory;
pub mod query;
pub mod seed;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};

use crate::error::AppError;

pub use query::{Direction, FieldValue, Query};

/// Collection names shared by every surface.
pub mod collections {
    pub const DRIVERS: &str = "drivers";
    pub const DISPATCH_RECORDS: &str = "dispatch_records";
    pub const STORES: &str = "stores";
    pub const VEHICLES: &str = "vehicles";
    pub const LOAD_TYPES: &str = "load_types";
    pub const SHIFTS: &str = "shifts";
    pub const ROUNDS: &str = "rounds";
    pub const MANAGEMENT_TYPES: &str = "management_types";
    pub const STATUSES: &str = "statuses";
    pub const USERS: &str = "users";
}

pub type Fields = Map<String, Value>;

/// A stored document: its generated id plus its fields.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    pub id: String,
    pub fields: Fields,
}

impl Document {
    pub fn new(id: impl Into<String>, fields: Fields) -> Self {
        Self {
            id: id.into(),
            fields,
        }
    }

    /// Decodes the document into a record, with the document id attached as
    /// the record's `id` field.
    pub fn into_record<T: DeserializeOwned>(self) -> Result<T, AppError> {
        let Document { id, mut fields } = self;
        fields.insert("id".to_string(), Value::String(id.clone()));
        serde_json::from_value(Value::Object(fields))
            .map_err(|err| AppError::Backend(format!("malformed document {id}: {err}")))
    }
}

/// Encodes a record as document fields. The `id` field is dropped since it
/// lives in the document key.
pub fn to_fields<T: Serialize>(record: &T) -> Result<Fields, AppError> {
    match serde_json::to_value(record) {
        Ok(Value::Object(mut fields)) => {
            fields.remove("id");
            Ok(fields)
        }
        Ok(other) => Err(AppError::Internal(format!(
            "document must be an object, got {other}"
        ))),
        Err(err) => Err(AppError::Internal(format!("failed to encode document: {err}"))),
    }
}

/// Managed document database seam.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn query(&self, collection: &str, query: &Query) -> Result<Vec<Document>, AppError>;

    async fn get(&self, collection: &str, id: &str) -> Result<Option<Document>, AppError>;

    /// Inserts a document under a generated id and returns that id.
    async fn create(&self, collection: &str, fields: Fields) -> Result<String, AppError>;

    /// Writes a document under a caller-chosen id, replacing any previous one.
    async fn set(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError>;

    /// Merges fields into an existing document.
    async fn update(&self, collection: &str, id: &str, fields: Fields) -> Result<(), AppError>;

    async fn delete(&self, collection: &str, id: &str) -> Result<(), AppError>;
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;
    use crate::models::reference::ReferenceItem;

    #[test]
    fn into_record_attaches_document_id() {
        let fields = json!({ "name": "Night" }).as_object().unwrap().clone();
        let item: ReferenceItem = Document::new("shift-2", fields).into_record().unwrap();
        assert_eq!(item.id, "shift-2");
        assert_eq!(item.name, "Night");
    }

    #[test]
    fn to_fields_drops_id() {
        let item = ReferenceItem {
            id: "shift-2".to_string(),
            name: "Night".to_string(),
        };
        let fields = to_fields(&item).unwrap();
        assert!(!fields.contains_key("id"));
        assert_eq!(fields["name"], "Night");
    }

    #[test]
    fn malformed_document_is_backend_error() {
        let fields = json!({ "label": 3 }).as_object().unwrap().clone();
        let result: Result<ReferenceItem, _> = Document::new("x", fields).into_record();
        assert!(matches!(result, Err(AppError::Backend(_))));
    }
}
