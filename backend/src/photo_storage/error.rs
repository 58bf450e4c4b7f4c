//! Error types for object store operations

use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use thiserror::Error;

/// Result type for object store operations
pub type BucketResult<T> = Result<T, BucketError>;

/// Errors that can occur while talking to the object store
#[derive(Error, Debug)]
pub enum BucketError {
    /// S3 service error
    #[error("S3 service error: {0}")]
    S3Error(String),

    /// Upstream service error (5xx from the object store)
    #[error("Upstream service error: {0}")]
    UpstreamError(String),

    /// Presigning or request configuration error
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl<E, R> From<SdkError<E, R>> for BucketError
where
    E: std::error::Error + Send + Sync + 'static,
    R: std::fmt::Debug,
{
    fn from(error: SdkError<E, R>) -> Self {
        match &error {
            SdkError::ServiceError(_) | SdkError::ResponseError(_) => {
                Self::S3Error(DisplayErrorContext(&error).to_string())
            }
            _ => Self::UpstreamError(DisplayErrorContext(&error).to_string()),
        }
    }
}
