use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::{BucketError, BucketResult, CorsPolicy, ObjectStore, StoredObject};

/// A presign call captured by [`MockObjectStore`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignCall {
    pub method: &'static str,
    pub key: String,
    pub content_type: Option<String>,
    pub metadata: BTreeMap<String, String>,
    pub expires_in: Duration,
}

#[derive(Debug, Clone)]
struct MockObject {
    size: i64,
    last_modified: Option<DateTime<Utc>>,
    metadata: HashMap<String, String>,
}

/// In-memory object store with failure injection
#[derive(Default)]
pub struct MockObjectStore {
    objects: Mutex<BTreeMap<String, MockObject>>,
    broken_metadata: Mutex<HashSet<String>>,
    fail_listing: bool,
    fail_presign: bool,
    presign_calls: Mutex<Vec<PresignCall>>,
    cors_policy: Mutex<Option<CorsPolicy>>,
}

impl MockObjectStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every listing call fails
    #[must_use]
    pub fn with_failing_listing(mut self) -> Self {
        self.fail_listing = true;
        self
    }

    /// Every presign call fails
    #[must_use]
    pub fn with_failing_presign(mut self) -> Self {
        self.fail_presign = true;
        self
    }

    /// Seeds an object
    #[must_use]
    pub fn with_object(
        self,
        key: &str,
        size: i64,
        last_modified: Option<DateTime<Utc>>,
        metadata: &[(&str, &str)],
    ) -> Self {
        self.lock_objects().insert(
            key.to_string(),
            MockObject {
                size,
                last_modified,
                metadata: metadata
                    .iter()
                    .map(|(name, value)| ((*name).to_string(), (*value).to_string()))
                    .collect(),
            },
        );
        self
    }

    /// Metadata lookups for `key` fail while the object stays listed
    #[must_use]
    pub fn with_broken_metadata(self, key: &str) -> Self {
        self.broken_metadata
            .lock()
            .expect("mock lock poisoned")
            .insert(key.to_string());
        self
    }

    /// All presign calls so far, in call order
    #[must_use]
    pub fn presign_calls(&self) -> Vec<PresignCall> {
        self.presign_calls
            .lock()
            .expect("mock lock poisoned")
            .clone()
    }

    /// The CORS policy last applied, if any
    #[must_use]
    pub fn cors_policy(&self) -> Option<CorsPolicy> {
        self.cors_policy.lock().expect("mock lock poisoned").clone()
    }

    fn lock_objects(&self) -> std::sync::MutexGuard<'_, BTreeMap<String, MockObject>> {
        self.objects.lock().expect("mock lock poisoned")
    }

    fn record(&self, call: PresignCall) -> BucketResult<String> {
        if self.fail_presign {
            return Err(BucketError::S3Error("mock presign failure".to_string()));
        }

        let url = format!(
            "https://mock-bucket.r2.test/{}?X-Amz-Method={}&X-Amz-Expires={}",
            call.key,
            call.method,
            call.expires_in.as_secs()
        );
        self.presign_calls
            .lock()
            .expect("mock lock poisoned")
            .push(call);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl ObjectStore for MockObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        metadata: &BTreeMap<String, String>,
        expires_in: Duration,
    ) -> BucketResult<String> {
        self.record(PresignCall {
            method: "PUT",
            key: key.to_string(),
            content_type: Some(content_type.to_string()),
            metadata: metadata.clone(),
            expires_in,
        })
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String> {
        self.record(PresignCall {
            method: "GET",
            key: key.to_string(),
            content_type: None,
            metadata: BTreeMap::new(),
            expires_in,
        })
    }

    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>> {
        if self.fail_listing {
            return Err(BucketError::UpstreamError("mock listing failure".to_string()));
        }

        Ok(self
            .lock_objects()
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, object)| StoredObject {
                key: key.clone(),
                size: object.size,
                last_modified: object.last_modified,
            })
            .collect())
    }

    async fn object_metadata(&self, key: &str) -> BucketResult<HashMap<String, String>> {
        if self
            .broken_metadata
            .lock()
            .expect("mock lock poisoned")
            .contains(key)
        {
            return Err(BucketError::S3Error(format!("mock metadata failure for {key}")));
        }

        self.lock_objects()
            .get(key)
            .map(|object| object.metadata.clone())
            .ok_or_else(|| BucketError::S3Error(format!("NotFound: {key}")))
    }

    async fn put_cors_policy(&self, policy: &CorsPolicy) -> BucketResult<()> {
        *self.cors_policy.lock().expect("mock lock poisoned") = Some(policy.clone());
        Ok(())
    }
}
