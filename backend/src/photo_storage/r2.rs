//! Cloudflare R2 (S3-compatible) implementation of [`ObjectStore`]

use std::collections::{BTreeMap, HashMap};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use aws_sdk_s3::{
    error::DisplayErrorContext,
    operation::list_objects_v2::ListObjectsV2Output,
    presigning::PresigningConfig,
    primitives::DateTime as SmithyDateTime,
    types::{CorsConfiguration, CorsRule},
    Client as S3Client,
};
use chrono::{DateTime, Utc};
use tracing::{debug, warn};

use super::{BucketError, BucketResult, CorsPolicy, ObjectStore, StoredObject};

/// Object store client for a single R2 bucket
pub struct R2ObjectStore {
    s3_client: Arc<S3Client>,
    bucket_name: String,
}

impl R2ObjectStore {
    /// Creates a new store client
    ///
    /// # Arguments
    ///
    /// * `s3_client` - Pre-configured S3 client pointing at the R2 endpoint
    /// * `bucket_name` - Bucket holding the photos
    #[must_use]
    pub const fn new(s3_client: Arc<S3Client>, bucket_name: String) -> Self {
        Self {
            s3_client,
            bucket_name,
        }
    }

    fn presigning_config(expires_in: Duration) -> BucketResult<PresigningConfig> {
        PresigningConfig::expires_in(expires_in).map_err(|e| {
            BucketError::ConfigError(format!("Failed to create presigning config: {e}"))
        })
    }
}

fn to_chrono(timestamp: &SmithyDateTime) -> Option<DateTime<Utc>> {
    DateTime::from_timestamp(timestamp.secs(), timestamp.subsec_nanos())
}

/// One page of a prefix listing
#[derive(Debug)]
struct ListingPage {
    objects: Vec<StoredObject>,
    /// Set only while the listing is truncated
    next_token: Option<String>,
}

fn listing_page(output: &ListObjectsV2Output, prefix: &str) -> ListingPage {
    let mut objects = Vec::with_capacity(output.contents().len());

    for entry in output.contents() {
        let Some(key) = entry.key() else {
            warn!(prefix, "Skipping listed object without a key");
            continue;
        };

        objects.push(StoredObject {
            key: key.to_string(),
            size: entry.size().unwrap_or_default(),
            last_modified: entry.last_modified().and_then(to_chrono),
        });
    }

    let next_token = output
        .next_continuation_token()
        .filter(|_| output.is_truncated().unwrap_or(false))
        .map(ToString::to_string);

    ListingPage {
        objects,
        next_token,
    }
}

/// Requests pages until one comes back without a continuation token.
async fn collect_pages<F, Fut>(mut fetch_page: F) -> BucketResult<Vec<StoredObject>>
where
    F: FnMut(Option<String>) -> Fut,
    Fut: Future<Output = BucketResult<ListingPage>>,
{
    let mut objects = Vec::new();
    let mut continuation_token = None;

    loop {
        let page = fetch_page(continuation_token.take()).await?;
        objects.extend(page.objects);

        match page.next_token {
            Some(token) => continuation_token = Some(token),
            None => break,
        }
    }

    Ok(objects)
}

#[async_trait::async_trait]
impl ObjectStore for R2ObjectStore {
    async fn presign_put(
        &self,
        key: &str,
        content_type: &str,
        metadata: &BTreeMap<String, String>,
        expires_in: Duration,
    ) -> BucketResult<String> {
        let presigned = self
            .s3_client
            .put_object()
            .bucket(&self.bucket_name)
            .key(key)
            .content_type(content_type)
            .set_metadata(Some(
                metadata
                    .iter()
                    .map(|(name, value)| (name.clone(), value.clone()))
                    .collect(),
            ))
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| {
                BucketError::S3Error(format!(
                    "Failed to generate presigned PUT URL: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(presigned.uri().to_string())
    }

    async fn presign_get(&self, key: &str, expires_in: Duration) -> BucketResult<String> {
        let presigned = self
            .s3_client
            .get_object()
            .bucket(&self.bucket_name)
            .key(key)
            .presigned(Self::presigning_config(expires_in)?)
            .await
            .map_err(|e| {
                BucketError::S3Error(format!(
                    "Failed to generate presigned GET URL: {}",
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(presigned.uri().to_string())
    }

    async fn list_objects(&self, prefix: &str) -> BucketResult<Vec<StoredObject>> {
        let objects = collect_pages(|continuation_token| {
            let request = self
                .s3_client
                .list_objects_v2()
                .bucket(&self.bucket_name)
                .prefix(prefix)
                .set_continuation_token(continuation_token);

            async move {
                let output = request.send().await?;
                Ok::<_, BucketError>(listing_page(&output, prefix))
            }
        })
        .await?;

        debug!(prefix, count = objects.len(), "Listed objects");
        Ok(objects)
    }

    async fn object_metadata(&self, key: &str) -> BucketResult<HashMap<String, String>> {
        let head = self
            .s3_client
            .head_object()
            .bucket(&self.bucket_name)
            .key(key)
            .send()
            .await?;

        Ok(head.metadata().cloned().unwrap_or_default())
    }

    async fn put_cors_policy(&self, policy: &CorsPolicy) -> BucketResult<()> {
        let rule = CorsRule::builder()
            .set_allowed_origins(Some(policy.allowed_origins.clone()))
            .set_allowed_methods(Some(policy.allowed_methods.clone()))
            .set_allowed_headers(Some(policy.allowed_headers.clone()))
            .set_expose_headers(Some(policy.expose_headers.clone()))
            .max_age_seconds(policy.max_age_secs)
            .build()
            .map_err(|e| BucketError::ConfigError(format!("Invalid CORS rule: {e}")))?;

        let configuration = CorsConfiguration::builder()
            .cors_rules(rule)
            .build()
            .map_err(|e| BucketError::ConfigError(format!("Invalid CORS configuration: {e}")))?;

        self.s3_client
            .put_bucket_cors()
            .bucket(&self.bucket_name)
            .cors_configuration(configuration)
            .send()
            .await?;

        Ok(())
    }
}
