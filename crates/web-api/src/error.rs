use application::StoreError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use domain::ChatError;
use serde::Serialize;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
}

#[derive(Debug)]
pub struct ApiError {
    status: StatusCode,
    body: ErrorBody,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                code,
                message: message.into(),
            },
        }
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        Self::new(StatusCode::UNAUTHORIZED, "UNAUTHORIZED", message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "BAD_REQUEST", message)
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR", message)
    }
}

impl From<ChatError> for ApiError {
    fn from(error: ChatError) -> Self {
        match error {
            ChatError::IdentityInvalid => {
                ApiError::new(StatusCode::UNAUTHORIZED, "IDENTITY_INVALID", error.to_string())
            }
            ChatError::EmptyInput { .. } => {
                ApiError::new(StatusCode::BAD_REQUEST, "EMPTY_INPUT", error.to_string())
            }
            ChatError::NotBound => {
                ApiError::new(StatusCode::UNAUTHORIZED, "NOT_BOUND", error.to_string())
            }
            ChatError::NotInRoom => {
                ApiError::new(StatusCode::BAD_REQUEST, "NOT_IN_ROOM", error.to_string())
            }
            ChatError::SessionClosed => {
                ApiError::new(StatusCode::BAD_REQUEST, "SESSION_CLOSED", error.to_string())
            }
            ChatError::StoreUnavailable { .. } => ApiError::new(
                StatusCode::INTERNAL_SERVER_ERROR,
                "STORE_UNAVAILABLE",
                error.to_string(),
            ),
        }
    }
}

impl From<StoreError> for ApiError {
    fn from(error: StoreError) -> Self {
        ApiError::new(
            StatusCode::INTERNAL_SERVER_ERROR,
            "STORE_UNAVAILABLE",
            error.to_string(),
        )
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}
