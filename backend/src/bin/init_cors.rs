//! One-off maintenance command that installs the browser-upload CORS rule on
//! the configured bucket.
//!
//! Browsers PUT straight to R2 with the presigned URL, so the bucket itself
//! must answer the preflight. Run once per bucket.

use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use photo_gateway::{
    photo_storage::{CorsPolicy, ObjectStore, R2ObjectStore},
    types::R2Settings,
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let settings = R2Settings::from_env()?;
    let s3_client = Arc::new(S3Client::from_conf(settings.s3_client_config()));
    let store = R2ObjectStore::new(s3_client, settings.bucket_name.clone());
    let policy = CorsPolicy::browser_uploads();

    match store.put_cors_policy(&policy).await {
        Ok(()) => {
            tracing::info!(bucket = %settings.bucket_name, ?policy, "CORS policy applied");
            Ok(())
        }
        Err(e) => {
            tracing::error!(bucket = %settings.bucket_name, "Failed to apply CORS policy: {e}");
            Err(e.into())
        }
    }
}
