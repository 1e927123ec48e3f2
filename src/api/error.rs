//! HTTP mapping of [`ShopError`]

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::domain::OrderStatus;
use crate::ShopError;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ErrorBody {
    success: bool,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    available: Option<i32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    valid_statuses: Option<&'static [OrderStatus]>,
}

impl ShopError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::InvalidStatus(_) | Self::InsufficientStock { .. } | Self::EditionInUse => StatusCode::BAD_REQUEST,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ShopError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let mut body = ErrorBody { success: false, message: self.to_string(), error: None, available: None, valid_statuses: None };
        match &self {
            Self::Storage(err) => {
                tracing::error!(error = %err, "request failed");
                body.message = "Internal server error".into();
                body.error = Some(err.to_string());
            }
            Self::InsufficientStock { available } => body.available = Some(*available),
            Self::InvalidStatus(_) => body.valid_statuses = Some(ShopError::valid_statuses()),
            _ => {}
        }
        (status, Json(body)).into_response()
    }
}

impl From<JsonRejection> for ShopError {
    fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<PathRejection> for ShopError {
    fn from(rejection: PathRejection) -> Self { Self::Validation(rejection.body_text()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::RepositoryError;

    #[test]
    fn test_status_codes() {
        let code = |e: ShopError| e.into_response().status();
        assert_eq!(code(ShopError::Validation("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(code(ShopError::InvalidStatus("x".into())), StatusCode::BAD_REQUEST);
        assert_eq!(code(ShopError::InsufficientStock { available: 1 }), StatusCode::BAD_REQUEST);
        assert_eq!(code(ShopError::EditionInUse), StatusCode::BAD_REQUEST);
        assert_eq!(code(ShopError::NotFound("Order")), StatusCode::NOT_FOUND);
        assert_eq!(code(ShopError::Forbidden("no")), StatusCode::FORBIDDEN);
        assert_eq!(code(ShopError::Unauthorized("no")), StatusCode::UNAUTHORIZED);
        let storage = ShopError::Storage(RepositoryError::DataCorruption("bad row".into()));
        assert_eq!(code(storage), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[tokio::test]
    async fn test_stock_error_body() {
        let response = ShopError::InsufficientStock { available: 2 }.into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["available"], 2);
        assert!(body.get("validStatuses").is_none());
    }

    #[tokio::test]
    async fn test_invalid_status_lists_choices() {
        let response = ShopError::InvalidStatus("LOST".into()).into_response();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["validStatuses"], serde_json::json!(["PENDING", "SHIPPING", "SUCCESS", "BACK_PENDING", "BACK"]));
    }
}
