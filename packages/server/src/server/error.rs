//! Translation of service errors into HTTP responses.
//!
//! The service returns typed failures; this is the one place that decides
//! status codes and the JSON error body the consoles render.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::domains::tickets::TicketError;

#[derive(Debug)]
pub struct ApiError(pub TicketError);

#[derive(Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
    /// Whether retrying the same request can succeed without other changes.
    retryable: bool,
}

impl From<TicketError> for ApiError {
    fn from(e: TicketError) -> Self {
        Self(e)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = match &self.0 {
            TicketError::Validation(_) => (StatusCode::UNPROCESSABLE_ENTITY, "validation", false),
            TicketError::EmptyQueue => (StatusCode::NOT_FOUND, "empty_queue", false),
            TicketError::UnknownTicket(_) => (StatusCode::NOT_FOUND, "unknown_ticket", false),
            TicketError::Conflict => (StatusCode::CONFLICT, "conflict", true),
            TicketError::StoreUnavailable(_) => {
                (StatusCode::SERVICE_UNAVAILABLE, "store_unavailable", true)
            }
        };

        if let TicketError::StoreUnavailable(source) = &self.0 {
            tracing::error!(error = %source, "store unavailable");
        }

        let body = ErrorBody {
            error: code,
            message: self.0.to_string(),
            retryable,
        };
        (status, Json(body)).into_response()
    }
}
