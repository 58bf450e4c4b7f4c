use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Key prefix every photo is stored under
pub const PHOTO_PREFIX: &str = "photos/";

/// Builds the object key for an upload started at `uploaded_at_ms`.
///
/// The filename is used verbatim. Two uploads of the same filename within the
/// same millisecond get the same key and the later PUT wins.
#[must_use]
pub fn object_key(uploaded_at_ms: i64, filename: &str) -> String {
    format!("{PHOTO_PREFIX}{uploaded_at_ms}_{filename}")
}

/// Everything a client needs to perform the upload itself
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct UploadTicket {
    /// Presigned PUT URL, valid for a short time
    #[serde(rename = "uploadURL")]
    pub upload_url: String,
    /// Object key the photo will be stored under
    pub key: String,
    /// Headers that must accompany the PUT, exactly as given
    pub headers: BTreeMap<String, String>,
}
