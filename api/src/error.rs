use axum::http::header::{CONTENT_TYPE, HeaderValue};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use iqs_core::AgentError;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Failure to answer a query.
///
/// Rendered as `text/plain` so that an error body can never be decoded as a
/// boolean or an `InterceptInfo`; callers tell "false" from "unknown" by the
/// status code.
#[derive(Debug)]
pub enum AppError {
    /// Intercept state unreachable (503)
    Unavailable(String),
    /// Internal error (500)
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<AgentError> for AppError {
    fn from(err: AgentError) -> Self {
        match err {
            AgentError::Unavailable(msg) => AppError::Unavailable(msg),
            AgentError::Internal(msg) => AppError::Internal(msg),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let request_id = uuid::Uuid::now_v7().to_string();
        let status = self.status();

        let message = match self {
            AppError::Unavailable(msg) => {
                tracing::warn!(%request_id, "Intercept state unavailable: {}", msg);
                format!("intercept state unavailable (request {request_id})\n")
            }
            AppError::Internal(msg) => {
                tracing::error!(%request_id, "Internal error: {}", msg);
                format!("could not determine intercept status (request {request_id})\n")
            }
        };

        let mut response = (status, message).into_response();
        let headers = response.headers_mut();
        headers.insert(
            CONTENT_TYPE,
            HeaderValue::from_static("text/plain; charset=utf-8"),
        );
        if let Ok(value) = HeaderValue::from_str(&request_id) {
            headers.insert(REQUEST_ID_HEADER, value);
        }
        response
    }
}
