//! Custom extractors for request bodies

use aide::operation::OperationInput;
use aide::OperationOutput;
use axum::{
    extract::{rejection::JsonRejection, FromRequest, Request},
    http::StatusCode,
    Json,
};
use schemars::JsonSchema;

use crate::types::error::AppError;

/// JSON extractor whose rejections use the API error body
pub struct JsonBody<T>(pub T);

impl<T, S> FromRequest<S> for JsonBody<T>
where
    T: serde::de::DeserializeOwned + JsonSchema,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(payload) = Json::<T>::from_request(req, state)
            .await
            .map_err(|err| {
                tracing::debug!("Rejected request body: {err}");
                match err {
                    JsonRejection::MissingJsonContentType(_) => AppError::new(
                        StatusCode::BAD_REQUEST,
                        "Missing Content-Type: application/json header",
                    ),
                    JsonRejection::JsonDataError(_) => AppError::new(
                        StatusCode::BAD_REQUEST,
                        "Request body is missing required fields",
                    ),
                    _ => AppError::new(StatusCode::BAD_REQUEST, "Invalid JSON payload"),
                }
            })?;

        Ok(Self(payload))
    }
}

impl<T> OperationInput for JsonBody<T>
where
    T: JsonSchema,
{
    fn operation_input(ctx: &mut aide::generate::GenContext, operation: &mut aide::openapi::Operation) {
        // Delegate to Json<T>'s implementation since JsonBody has the same structure
        Json::<T>::operation_input(ctx, operation);
    }

    fn inferred_early_responses(
        ctx: &mut aide::generate::GenContext,
        operation: &mut aide::openapi::Operation,
    ) -> Vec<(Option<u16>, aide::openapi::Response)> {
        AppError::inferred_responses(ctx, operation)
    }
}
