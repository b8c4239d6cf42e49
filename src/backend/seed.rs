use std::collections::BTreeMap;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::info;

use super::{DocumentStore, Fields};
use crate::auth::memory::InMemoryAuth;
use crate::error::AppError;

#[derive(Debug, Clone, Deserialize)]
pub struct SeedAccount {
    pub uid: String,
    pub email: String,
    pub password: String,
}

/// Initial contents for the in-memory backends.
///
/// ```json
/// {
///   "accounts": [{ "uid": "u1", "email": "ana@example.com", "password": "secret-1" }],
///   "collections": { "drivers": [{ "id": "u1", "name": "Ana Rojas", ... }] }
/// }
/// ```
///
/// Documents with an `id` field keep it as their key; the rest get a
/// generated one.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Seed {
    #[serde(default)]
    pub accounts: Vec<SeedAccount>,
    #[serde(default)]
    pub collections: BTreeMap<String, Vec<Fields>>,
}

impl Seed {
    pub async fn load(path: &Path) -> Result<Self, AppError> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|err| {
            AppError::Internal(format!("failed to read seed {}: {err}", path.display()))
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, AppError> {
        serde_json::from_str(raw).map_err(|err| AppError::Internal(format!("invalid seed: {err}")))
    }

    pub async fn apply(self, store: &dyn DocumentStore, auth: &InMemoryAuth) -> Result<(), AppError> {
        for account in &self.accounts {
            auth.register_with_uid(&account.uid, &account.email, &account.password)
                .await?;
        }

        let mut documents = 0;
        for (collection, docs) in self.collections {
            for mut fields in docs {
                match fields.remove("id") {
                    Some(Value::String(id)) => store.set(&collection, &id, fields).await?,
                    _ => {
                        store.create(&collection, fields).await?;
                    }
                }
                documents += 1;
            }
        }

        info!(
            accounts = self.accounts.len(),
            documents, "seed data loaded"
        );
        Ok(())
    }
}
