use serde::{Deserialize, Serialize};

/// The durable pairing of an assigned identifier and the relative path of
/// the stored original.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRecord {
    pub id: i64,
    pub storage_path: String,
}
