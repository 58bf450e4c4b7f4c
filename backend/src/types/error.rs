//! Universal error handling for the API

use aide::OperationOutput;
use axum::{
    http::{header::WWW_AUTHENTICATE, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use schemars::JsonSchema;
use serde::Serialize;

use crate::photo_storage::BucketError;

/// Challenge sent with every 401
const BASIC_CHALLENGE: &str = r#"Basic realm="photo-gateway", charset="UTF-8""#;

/// API error response body
#[derive(Debug, Serialize, JsonSchema)]
pub struct ApiErrorResponse {
    /// Human-readable error message
    pub error: &'static str,
}

/// Application error type that wraps the API error response
#[derive(Debug)]
pub struct AppError {
    status: StatusCode,
    inner: ApiErrorResponse,
    challenge: Option<&'static str>,
    /// Internal cause, logged but never sent to the client
    cause: Option<String>,
}

impl AppError {
    /// Create a new application error
    #[must_use]
    pub const fn new(status: StatusCode, msg: &'static str) -> Self {
        Self {
            status,
            inner: ApiErrorResponse { error: msg },
            challenge: None,
            cause: None,
        }
    }

    /// 401 carrying a `WWW-Authenticate: Basic` challenge
    #[must_use]
    pub const fn unauthorized() -> Self {
        Self {
            status: StatusCode::UNAUTHORIZED,
            inner: ApiErrorResponse {
                error: "Authentication required",
            },
            challenge: Some(BASIC_CHALLENGE),
            cause: None,
        }
    }

    /// 500 with a fixed message for a failed object store call.
    ///
    /// The store error is logged with the response, never returned to the client.
    #[must_use]
    pub fn storage(err: &BucketError, msg: &'static str) -> Self {
        Self {
            cause: Some(err.to_string()),
            ..Self::new(StatusCode::INTERNAL_SERVER_ERROR, msg)
        }
    }

    /// HTTP status of this error
    #[must_use]
    pub const fn status(&self) -> StatusCode {
        self.status
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        // Log the error based on status code
        match self.status.as_u16() {
            400..=499 => tracing::warn!("Client error: {} - {}", self.status, self.inner.error),
            500..=599 => match &self.cause {
                Some(cause) => tracing::error!(
                    error = %cause,
                    "Server error: {} - {}",
                    self.status,
                    self.inner.error
                ),
                None => tracing::error!("Server error: {} - {}", self.status, self.inner.error),
            },
            _ => {}
        }

        let mut response = (self.status, Json(self.inner)).into_response();
        if let Some(challenge) = self.challenge {
            response
                .headers_mut()
                .insert(WWW_AUTHENTICATE, HeaderValue::from_static(challenge));
        }
        response
    }
}

impl OperationOutput for AppError {
    type Inner = ApiErrorResponse;

    fn operation_response(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Option<aide::openapi::Response> {
        Json::<ApiErrorResponse>::operation_response(ctx, operation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use std::io;
    use std::sync::{Arc, Mutex};

    #[test]
    fn test_unauthorized_carries_challenge() {
        let response = AppError::unauthorized().into_response();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        let challenge = response.headers()[WWW_AUTHENTICATE].to_str().unwrap();
        assert!(challenge.starts_with("Basic "));
    }

    #[test]
    fn test_storage_error_hides_details() {
        let err = BucketError::S3Error("AccessDenied: signature mismatch".to_string());
        let app_error = AppError::storage(&err, "Failed to list photos");

        assert_eq!(app_error.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(app_error.inner.error, "Failed to list photos");
        assert!(app_error.challenge.is_none());
        assert_eq!(
            app_error.cause.as_deref(),
            Some("S3 service error: AccessDenied: signature mismatch")
        );
    }

    #[derive(Clone, Default)]
    struct CapturedLogs(Arc<Mutex<Vec<u8>>>);

    impl io::Write for CapturedLogs {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_storage_error_is_logged_once_with_cause() {
        let logs = CapturedLogs::default();
        let writer = logs.clone();
        let subscriber = tracing_subscriber::fmt()
            .with_ansi(false)
            .with_writer(move || writer.clone())
            .finish();

        let response = tracing::subscriber::with_default(subscriber, || {
            let err = BucketError::UpstreamError("connection reset".to_string());
            AppError::storage(&err, "Failed to list photos").into_response()
        });

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = response.into_body().collect().await.unwrap().to_bytes();
        assert!(!String::from_utf8_lossy(&body).contains("connection reset"));

        let output = String::from_utf8(logs.0.lock().unwrap().clone()).unwrap();
        let error_lines: Vec<&str> = output.lines().filter(|l| l.contains("ERROR")).collect();
        assert_eq!(error_lines.len(), 1, "{output}");
        assert!(error_lines[0].contains("connection reset"));
        assert!(error_lines[0].contains("Failed to list photos"));
    }
}
