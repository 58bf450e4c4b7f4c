use std::sync::Arc;

use aws_sdk_s3::Client as S3Client;
use photo_gateway::{
    photo_storage::R2ObjectStore,
    photos::PhotoService,
    server,
    types::{Config, Environment},
};
use tracing_subscriber::{fmt, EnvFilter};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    let config = Config::from_env()?;
    init_logging(config.environment);

    let s3_client = Arc::new(S3Client::from_conf(config.r2.s3_client_config()));
    let store = Arc::new(R2ObjectStore::new(s3_client, config.r2.bucket_name.clone()));
    let photo_service = Arc::new(PhotoService::new(
        store,
        config.upload_url_expiry_secs,
        config.download_url_expiry_secs,
    ));

    tracing::info!(
        environment = ?config.environment,
        bucket = %config.r2.bucket_name,
        "Configuration loaded"
    );

    server::start(config, photo_service).await
}

/// JSON logs for staging/production, human-readable logs for development
fn init_logging(environment: Environment) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    if environment.json_logs() {
        fmt().json().with_env_filter(filter).init();
    } else {
        fmt().with_env_filter(filter).init();
    }
}
