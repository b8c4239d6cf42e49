use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Store {
    pub id: String,
    pub chain: String,
    pub district: String,
    pub address: String,
    /// Map link shown in the route details.
    pub link: String,
    /// Display name, the value dispatch records refer to.
    pub name: String,
}
