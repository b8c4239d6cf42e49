pub mod memory;
pub mod session;

use async_trait::async_trait;
use tokio::sync::watch;

use crate::error::AppError;
use crate::models::account::Account;

pub use session::SessionResolver;

/// Managed email/password authentication seam.
///
/// A provider holds one client session. `subscribe` hands out the auth-state
/// stream: the current identity first, then every change.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_in(&self, email: &str, password: &str) -> Result<Account, AppError>;

    /// Creates an account without touching the current session.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Account, AppError>;

    async fn sign_out(&self) -> Result<(), AppError>;

    async fn send_password_reset(&self, email: &str) -> Result<(), AppError>;

    fn subscribe(&self) -> watch::Receiver<Option<Account>>;
}
