use serde::{Deserialize, Serialize};

/// Driver profile. The document id is the driver's account uid.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DriverProfile {
    pub id: String,
    pub name: String,
    pub national_id: String,
    /// License classes, e.g. "A2 A4".
    pub license: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}
