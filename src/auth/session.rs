use std::sync::Arc;

use tokio_stream::wrappers::WatchStream;
use tokio_stream::StreamExt;
use tracing::warn;

use super::AuthProvider;
use crate::backend::collections;
use crate::error::AppError;
use crate::models::account::{Account, UserRecord};
use crate::models::driver::DriverProfile;
use crate::services::reader::CollectionReader;

/// Resolves who is signed in, and their profile, before any domain data is
/// read.
#[derive(Clone)]
pub struct SessionResolver {
    auth: Arc<dyn AuthProvider>,
    reader: CollectionReader,
}

impl SessionResolver {
    pub fn new(auth: Arc<dyn AuthProvider>, reader: CollectionReader) -> Self {
        Self { auth, reader }
    }

    /// First emission of the auth-state stream. The subscription is dropped
    /// right after, so "nobody" resolves as promptly as a signed-in user.
    pub async fn current_identity(&self) -> Option<Account> {
        let mut states = WatchStream::new(self.auth.subscribe());
        states.next().await.flatten()
    }

    pub async fn require_identity(&self) -> Result<Account, AppError> {
        self.current_identity()
            .await
            .ok_or(AppError::Unauthenticated)
    }

    pub async fn driver_profile(&self) -> Result<DriverProfile, AppError> {
        let account = self.require_identity().await?;
        self.reader
            .get::<DriverProfile>(collections::DRIVERS, &account.uid)
            .await?
            .ok_or_else(|| {
                warn!(uid = %account.uid, "signed-in account has no driver profile");
                AppError::NotFound(format!("no driver profile for {}", account.email))
            })
    }

    pub async fn user_record(&self) -> Result<Option<UserRecord>, AppError> {
        let account = self.require_identity().await?;
        self.reader
            .get::<UserRecord>(collections::USERS, &account.uid)
            .await
    }

    /// Administrators and management pass; anyone else is turned away.
    pub async fn require_admin(&self) -> Result<UserRecord, AppError> {
        let record = self.user_record().await?.ok_or_else(|| {
            AppError::Forbidden("account has no user record".to_string())
        })?;

        if !record.role.can_administer() {
            warn!(uid = %record.id, role = ?record.role, "administrative access denied");
            return Err(AppError::Forbidden(format!(
                "{:?} accounts cannot administer dispatches",
                record.role
            )));
        }

        Ok(record)
    }
}
