use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// A stored photo as returned to gallery clients
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Photo {
    /// Object key
    pub key: String,
    /// Size in bytes
    pub size: i64,
    /// ISO-8601 UTC timestamp of the last modification, if the store reported one
    pub last_modified: Option<String>,
    /// User metadata attached at upload time (values as stored, still percent-encoded)
    pub metadata: BTreeMap<String, String>,
    /// Presigned GET URL
    pub url: String,
}

/// Result of a best-effort listing
#[derive(Debug, Clone, Default)]
pub struct PhotoListing {
    pub photos: Vec<Photo>,
    /// Objects that were listed but could not be described
    pub dropped: usize,
}
