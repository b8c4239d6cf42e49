use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::info;
use uuid::Uuid;

use super::reader::CollectionReader;
use crate::auth::{AuthProvider, SessionResolver};
use crate::backend::collections::{DRIVERS, USERS};
use crate::error::AppError;
use crate::models::account::{Account, Role, UserRecord};
use crate::models::driver::DriverProfile;

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterDriver {
    pub email: String,
    pub name: String,
    pub national_id: String,
    pub license: String,
    #[serde(default)]
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct RegisterAdmin {
    pub email: String,
    pub role: Role,
}

/// What the current client session is, as far as the profile collections
/// know.
#[derive(Debug, Clone, Serialize)]
pub struct SessionInfo {
    pub account: Account,
    pub user: Option<UserRecord>,
    pub driver: Option<DriverProfile>,
}

#[derive(Clone)]
pub struct AccountService {
    auth: Arc<dyn AuthProvider>,
    reader: CollectionReader,
    session: SessionResolver,
}

impl AccountService {
    pub fn new(auth: Arc<dyn AuthProvider>, reader: CollectionReader, session: SessionResolver) -> Self {
        Self {
            auth,
            reader,
            session,
        }
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError> {
        if email.trim().is_empty() || password.is_empty() {
            return Err(AppError::BadRequest(
                "email and password are required".to_string(),
            ));
        }
        self.auth.sign_in(email, password).await
    }

    pub async fn sign_out(&self) -> Result<(), AppError> {
        self.auth.sign_out().await
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), AppError> {
        if email.trim().is_empty() {
            return Err(AppError::BadRequest("email is required".to_string()));
        }
        self.auth.send_password_reset(email).await
    }

    pub async fn session_info(&self) -> Result<SessionInfo, AppError> {
        let account = self.session.require_identity().await?;
        let user = self.reader.get(USERS, &account.uid).await?;
        let driver = self.reader.get(DRIVERS, &account.uid).await?;
        Ok(SessionInfo {
            account,
            user,
            driver,
        })
    }

    /// Creates the account with a throwaway password, writes the user record
    /// and driver profile under the new uid, then mails a reset link so the
    /// driver picks their own password.
    pub async fn register_driver(&self, input: RegisterDriver) -> Result<DriverProfile, AppError> {
        for (field, value) in [
            ("email", &input.email),
            ("name", &input.name),
            ("national_id", &input.national_id),
            ("license", &input.license),
        ] {
            if value.trim().is_empty() {
                return Err(AppError::BadRequest(format!("{field} is required")));
            }
        }

        let account = self.create_account(&input.email, Role::Driver).await?;
        let profile = DriverProfile {
            id: account.uid.clone(),
            name: input.name.trim().to_string(),
            national_id: input.national_id.trim().to_string(),
            license: input.license.trim().to_string(),
            phone: input
                .phone
                .map(|phone| phone.trim().to_string())
                .filter(|phone| !phone.is_empty()),
        };
        self.reader.set(DRIVERS, &account.uid, &profile).await?;
        self.auth.send_password_reset(&account.email).await?;

        info!(uid = %account.uid, name = %profile.name, "driver registered");
        Ok(profile)
    }

    pub async fn register_admin(&self, input: RegisterAdmin) -> Result<UserRecord, AppError> {
        if input.email.trim().is_empty() {
            return Err(AppError::BadRequest("email is required".to_string()));
        }
        if !input.role.can_administer() {
            return Err(AppError::BadRequest(format!(
                "{:?} is not an administrative role",
                input.role
            )));
        }

        let account = self.create_account(&input.email, input.role).await?;
        self.auth.send_password_reset(&account.email).await?;

        info!(uid = %account.uid, role = ?input.role, "administrator registered");
        Ok(UserRecord {
            id: account.uid,
            email: account.email,
            role: input.role,
        })
    }

    async fn create_account(&self, email: &str, role: Role) -> Result<Account, AppError> {
        let temporary_password = Uuid::new_v4().simple().to_string();
        let account = self.auth.sign_up(email, &temporary_password).await?;

        let record = UserRecord {
            id: account.uid.clone(),
            email: account.email.clone(),
            role,
        };
        self.reader.set(USERS, &account.uid, &record).await?;
        Ok(account)
    }
}
