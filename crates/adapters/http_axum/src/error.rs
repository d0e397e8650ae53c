//! HTTP error response mapping.

use axum::Json;
use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde::Serialize;

use ledbridge_domain::error::{BridgeError, DeviceError, NotFoundError, ValidationError};

/// JSON error body returned by API endpoints.
#[derive(Serialize)]
struct ErrorBody {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
}

/// Maps [`BridgeError`] (and malformed requests) to an HTTP response with
/// the appropriate status code.
#[derive(Debug)]
pub enum ApiError {
    Bridge(BridgeError),
    /// The body could not be read as the expected JSON.
    BadRequest(String),
}

impl From<BridgeError> for ApiError {
    fn from(err: BridgeError) -> Self {
        Self::Bridge(err)
    }
}

impl From<ValidationError> for ApiError {
    fn from(err: ValidationError) -> Self {
        Self::Bridge(err.into())
    }
}

impl From<NotFoundError> for ApiError {
    fn from(err: NotFoundError) -> Self {
        Self::Bridge(err.into())
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        Self::BadRequest(rejection.body_text())
    }
}

/// Status code for a device failure kind.
#[must_use]
pub fn device_status(err: &DeviceError) -> StatusCode {
    match err {
        DeviceError::Unavailable => StatusCode::SERVICE_UNAVAILABLE,
        DeviceError::Rejected { .. } | DeviceError::Malformed { .. } => StatusCode::BAD_GATEWAY,
        DeviceError::Timeout => StatusCode::GATEWAY_TIMEOUT,
    }
}

/// Short machine-readable name for any error, used in per-line reports.
#[must_use]
pub fn error_kind(err: &BridgeError) -> &'static str {
    match err {
        BridgeError::Validation(_) => "invalid",
        BridgeError::NotFound(_) => "not_found",
        BridgeError::Device(err) => err.kind(),
        BridgeError::Storage(_) => "storage",
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message, kind) = match &self {
            Self::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone(), None),
            Self::Bridge(BridgeError::Validation(err)) => {
                (StatusCode::BAD_REQUEST, err.to_string(), None)
            }
            Self::Bridge(BridgeError::NotFound(err)) => {
                (StatusCode::NOT_FOUND, err.to_string(), None)
            }
            Self::Bridge(BridgeError::Device(err)) => {
                (device_status(err), err.to_string(), Some(err.kind()))
            }
            Self::Bridge(BridgeError::Storage(err)) => {
                tracing::error!(error = %err, "storage error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                    None,
                )
            }
        };

        (
            status,
            Json(ErrorBody {
                error: message,
                kind,
            }),
        )
            .into_response()
    }
}
