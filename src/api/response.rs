//! JSON envelope shared by every endpoint and the error-to-status mapping.
//!
//! Successful responses are `{"success": true, "data": ...}`; failures are
//! `{"success": false, "message": ...}` with the status code chosen here.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::extract::{FromRequest, FromRequestParts, Query};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use serde_json::json;
use tracing::error;

use crate::domain::aggregates::CartError;
use crate::StorefrontError;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, StorefrontError>;

pub fn ok<T: Serialize>(data: T) -> Json<ApiResponse<T>> {
    Json(ApiResponse { success: true, data })
}

pub fn created<T: Serialize>(data: T) -> (StatusCode, Json<ApiResponse<T>>) {
    (StatusCode::CREATED, ok(data))
}

/// `Json` whose rejection is reported through the envelope.
#[derive(FromRequest)]
#[from_request(via(Json), rejection(StorefrontError))]
pub struct ApiJson<T>(pub T);

/// `Query` whose rejection is reported through the envelope.
#[derive(FromRequestParts)]
#[from_request(via(Query), rejection(StorefrontError))]
pub struct ApiQuery<T>(pub T);

impl From<JsonRejection> for StorefrontError {
    fn from(rejection: JsonRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl From<QueryRejection> for StorefrontError {
    fn from(rejection: QueryRejection) -> Self { Self::Validation(rejection.body_text()) }
}

impl StorefrontError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Validation(_) | Self::EmptyCart | Self::ItemsUnavailable(_) | Self::Order(_) => StatusCode::BAD_REQUEST,
            Self::Cart(CartError::ItemNotFound) => StatusCode::NOT_FOUND,
            Self::Cart(_) => StatusCode::BAD_REQUEST,
            Self::CartNotFound | Self::ProductNotFound | Self::OrderNotFound => StatusCode::NOT_FOUND,
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::Forbidden => StatusCode::FORBIDDEN,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for StorefrontError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = match &self {
            Self::ItemsUnavailable(items) => json!({
                "success": false,
                "message": "Some items in your cart are no longer available",
                "unavailableItems": items,
            }),
            Self::Database(_) => {
                error!(error = %self, "Request failed on storage");
                json!({ "success": false, "message": "Internal server error" })
            }
            _ => json!({ "success": false, "message": self.to_string() }),
        };
        (status, Json(body)).into_response()
    }
}
