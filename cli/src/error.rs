//! Maps `CoreError` onto an HTTP response (§7): the `StatusHint` on every
//! error picks the status class, `error_code()` is the stable machine-
//! readable body field, `Display` is the human message.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use osf_sim_core::{CoreError, StatusHint};
use serde_json::json;

pub struct ApiError(pub CoreError);

impl From<CoreError> for ApiError {
    fn from(err: CoreError) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.0.status_hint() {
            StatusHint::Validation => StatusCode::BAD_REQUEST,
            StatusHint::NotFound => StatusCode::NOT_FOUND,
            StatusHint::PreconditionFailed => StatusCode::UNPROCESSABLE_ENTITY,
            StatusHint::Conflict => StatusCode::CONFLICT,
            StatusHint::Transient => StatusCode::SERVICE_UNAVAILABLE,
            StatusHint::Fatal => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = Json(json!({
            "error_code": self.0.error_code(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;
