use async_trait::async_trait;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use super::AuthProvider;
use crate::error::AppError;
use crate::models::account::Account;

const MIN_PASSWORD_LEN: usize = 6;

#[derive(Debug, Clone)]
struct StoredAccount {
    uid: String,
    email: String,
    password_hash: String,
}

/// Process-local auth provider with bcrypt-hashed passwords. Password-reset
/// requests are recorded instead of mailed.
pub struct InMemoryAuth {
    accounts: DashMap<String, StoredAccount>,
    reset_requests: DashMap<String, usize>,
    state_tx: watch::Sender<Option<Account>>,
    hash_cost: u32,
}

impl InMemoryAuth {
    pub fn new(hash_cost: u32) -> Self {
        let (state_tx, _unused_rx) = watch::channel(None);
        Self {
            accounts: DashMap::new(),
            reset_requests: DashMap::new(),
            state_tx,
            hash_cost,
        }
    }

    /// Registers an account under a known uid, as loaded from a seed file.
    pub async fn register_with_uid(
        &self,
        uid: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let email = normalize_email(email)?;
        if password.len() < MIN_PASSWORD_LEN {
            return Err(AppError::BadRequest(format!(
                "password must have at least {MIN_PASSWORD_LEN} characters"
            )));
        }
        if self.accounts.contains_key(&email) {
            return Err(AppError::Conflict(format!("{email} is already registered")));
        }

        let password_hash = hash_password(password, self.hash_cost).await?;
        // Checked again under the entry lock; hashing yields.
        match self.accounts.entry(email.clone()) {
            Entry::Occupied(_) => {
                return Err(AppError::Conflict(format!("{email} is already registered")));
            }
            Entry::Vacant(slot) => {
                slot.insert(StoredAccount {
                    uid: uid.to_string(),
                    email: email.clone(),
                    password_hash,
                });
            }
        }

        info!(uid, email = %email, "account created");
        Ok(Account {
            uid: uid.to_string(),
            email,
        })
    }

    /// How many reset emails were requested for `email`.
    pub fn reset_requests(&self, email: &str) -> usize {
        self.reset_requests
            .get(&email.trim().to_lowercase())
            .map(|count| *count)
            .unwrap_or(0)
    }
}

#[async_trait]
impl AuthProvider for InMemoryAuth {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let email = normalize_email(email).map_err(|_| AppError::InvalidCredentials)?;
        let stored = self
            .accounts
            .get(&email)
            .map(|entry| entry.value().clone())
            .ok_or(AppError::InvalidCredentials)?;

        if !verify_password(password, &stored.password_hash).await? {
            warn!(email = %email, "sign-in rejected");
            return Err(AppError::InvalidCredentials);
        }

        let account = Account {
            uid: stored.uid,
            email: stored.email,
        };
        self.state_tx.send_replace(Some(account.clone()));
        info!(uid = %account.uid, "signed in");
        Ok(account)
    }

    async fn sign_up(&self, email: &str, password: &str) -> Result<Account, AppError> {
        let uid = Uuid::new_v4().simple().to_string();
        self.register_with_uid(&uid, email, password).await
    }

    async fn sign_out(&self) -> Result<(), AppError> {
        if let Some(previous) = self.state_tx.send_replace(None) {
            info!(uid = %previous.uid, "signed out");
        }
        Ok(())
    }

    async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        let email = normalize_email(email)?;
        if !self.accounts.contains_key(&email) {
            return Err(AppError::NotFound(format!("no account for {email}")));
        }

        *self.reset_requests.entry(email.clone()).or_insert(0) += 1;
        info!(email = %email, "password reset requested");
        Ok(())
    }

    fn subscribe(&self) -> watch::Receiver<Option<Account>> {
        self.state_tx.subscribe()
    }
}

fn normalize_email(raw: &str) -> Result<String, AppError> {
    let email = raw.trim().to_lowercase();
    match email.split_once('@') {
        Some((local, domain)) if !local.is_empty() && domain.contains('.') => Ok(email),
        _ => Err(AppError::BadRequest(format!("invalid email {raw:?}"))),
    }
}

async fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|err| AppError::Internal(format!("hashing task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to hash password: {err}")))
}

async fn verify_password(password: &str, hash: &str) -> Result<bool, AppError> {
    let password = password.to_string();
    let hash = hash.to_string();
    tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash))
        .await
        .map_err(|err| AppError::Internal(format!("verify task failed: {err}")))?
        .map_err(|err| AppError::Internal(format!("failed to verify password: {err}")))
}
