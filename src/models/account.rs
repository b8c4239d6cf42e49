use serde::{Deserialize, Serialize};

/// Identity handed out by the auth provider.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Account {
    pub uid: String,
    pub email: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Role {
    Administrator,
    Management,
    Driver,
}

impl Role {
    pub fn can_administer(&self) -> bool {
        matches!(self, Role::Administrator | Role::Management)
    }
}

/// Account record stored under the account uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserRecord {
    pub id: String,
    pub email: String,
    pub role: Role,
}
