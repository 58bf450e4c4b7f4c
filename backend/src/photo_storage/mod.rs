//! Object store abstraction used by the photo gateway
//!
//! The gateway never stores bytes itself. Every operation here is a thin call
//! into an S3-compatible service: presigning, prefix listing, metadata lookup
//! and the one-off bucket CORS update.
mod error;
mod r2;

#[cfg(any(test, feature = "test-utils"))]
pub mod mock;

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use chrono::{DateTime, Utc};

pub use error::{BucketError, BucketResult};
pub use r2::R2ObjectStore;

/// One entry returned by a prefix listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    /// Full object key, including the prefix
    pub key: String,
    /// Size in bytes
    pub size: i64,
    /// Last modification time as reported by the store
    pub last_modified: Option<DateTime<Utc>>,
}

/// Bucket CORS rule applied by the `init-cors` maintenance binary
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CorsPolicy {
    pub allowed_origins: Vec<String>,
    pub allowed_methods: Vec<String>,
    pub allowed_headers: Vec<String>,
    pub expose_headers: Vec<String>,
    pub max_age_secs: i32,
}

impl CorsPolicy {
    /// Policy that lets browsers PUT straight to presigned URLs and read the results.
    #[must_use]
    pub fn browser_uploads() -> Self {
        let owned = |values: &[&str]| values.iter().map(ToString::to_string).collect();

        Self {
            allowed_origins: owned(&["*"]),
            allowed_methods: owned(&["PUT", "POST", "GET", "HEAD", "DELETE"]),
            allowed_headers: owned(&["*"]),
            expose_headers: owned(&["ETag"]),
            // 50 minutes of preflight caching
            max_age_secs: 3000,
        }
    }
}

/// Operations the gateway needs from an S3-compatible store
#[async_trait::async_trait]
pub trait ObjectStore: Send + Sync {
    /// Presigns a PUT for `key`.
    ///
    /// `content_type` and every `metadata` entry become signed headers, so the
    /// uploader must send them verbatim (metadata as `x-amz-meta-<name>`).
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        metadata: &BTreeMap<String, String>,
        expires_in: Duration,
    ) -> BucketResult<String>;

    /// Presigns a GET for `key`.
    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String>;

    /// Lists every object whose key starts with `prefix`, across all pages.
    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>>;

    /// Fetches the user metadata of a single object (names without `x-amz-meta-`).
    async fn object_metadata(&self, key: &str) -> BucketResult<HashMap<String, String>>;

    /// Replaces the bucket CORS configuration.
    async fn put_cors_policy(&self, policy: &CorsPolicy) -> BucketResult<()>;
}
