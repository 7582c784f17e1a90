use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::{Deserialize, Serialize};

use crate::types::ApiErrorResponse;

/// Application error codes following the pattern E{area}{sequence}
///
/// Ranges:
/// - E0xxx: Shared/infrastructure errors
/// - E1xxx: User/profile errors
/// - E2xxx: Swipe/like errors
/// - E3xxx: Chat/messaging errors
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ErrorCode {
    // Shared (E0xxx)
    InternalError,
    ValidationError,
    NotFound,
    Forbidden,
    BadRequest,
    PayloadTooLarge,

    // User (E1xxx)
    UserNotFound,
    UserAlreadyExists,
    PhotoUploadFailed,
    TooManyPhotos,

    // Swipe (E2xxx)
    InvalidSwipeAction,
    TargetNotFound,

    // Chat (E3xxx)
    ChatNotFound,
    NotChatParticipant,
    SelfChat,
    EmptyMessage,
}

impl ErrorCode {
    pub fn code(&self) -> &'static str {
        match self {
            // Shared
            Self::InternalError => "E0001",
            Self::ValidationError => "E0002",
            Self::NotFound => "E0003",
            Self::Forbidden => "E0004",
            Self::BadRequest => "E0005",
            Self::PayloadTooLarge => "E0006",

            // User
            Self::UserNotFound => "E1001",
            Self::UserAlreadyExists => "E1002",
            Self::PhotoUploadFailed => "E1003",
            Self::TooManyPhotos => "E1004",

            // Swipe
            Self::InvalidSwipeAction => "E2001",
            Self::TargetNotFound => "E2002",

            // Chat
            Self::ChatNotFound => "E3001",
            Self::NotChatParticipant => "E3002",
            Self::SelfChat => "E3003",
            Self::EmptyMessage => "E3004",
        }
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
            Self::ValidationError | Self::BadRequest | Self::InvalidSwipeAction
            | Self::SelfChat | Self::EmptyMessage | Self::TooManyPhotos
            | Self::PhotoUploadFailed => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::NotFound | Self::UserNotFound | Self::TargetNotFound
            | Self::ChatNotFound => StatusCode::NOT_FOUND,
            Self::Forbidden | Self::NotChatParticipant => StatusCode::FORBIDDEN,
            Self::UserAlreadyExists => StatusCode::CONFLICT,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("{message}")]
    Known {
        code: ErrorCode,
        message: String,
        details: Option<serde_json::Value>,
    },

    #[error("internal server error")]
    Internal(#[from] anyhow::Error),

    #[error("database error: {0}")]
    Database(#[from] diesel::result::Error),

    #[error("validation error: {0}")]
    Validation(String),
}

impl AppError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(code: ErrorCode, message: impl Into<String>, details: serde_json::Value) -> Self {
        Self::Known {
            code,
            message: message.into(),
            details: Some(details),
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::NotFound, message)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::BadRequest, message)
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::Forbidden, message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InternalError, message)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_response) = match &self {
            AppError::Known { code, message, details } => {
                let status = code.status_code();
                let mut resp = ApiErrorResponse::new(code.code(), message);
                if let Some(d) = details {
                    resp = resp.with_details(d.clone());
                }
                (status, resp)
            }
            AppError::Internal(err) => {
                tracing::error!(error = %err, "internal server error");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    ApiErrorResponse::new("E0001", "internal server error"),
                )
            }
            AppError::Database(err) => {
                tracing::error!(error = %err, "database error");
                match err {
                    diesel::result::Error::NotFound => (
                        StatusCode::NOT_FOUND,
                        ApiErrorResponse::new("E0003", "resource not found"),
                    ),
                    _ => (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ApiErrorResponse::new("E0001", "database error"),
                    ),
                }
            }
            AppError::Validation(msg) => (
                StatusCode::BAD_REQUEST,
                ApiErrorResponse::new("E0002", msg),
            ),
        };

        (status, Json(error_response)).into_response()
    }
}

pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_codes_map_to_404() {
        for code in [
            ErrorCode::NotFound,
            ErrorCode::UserNotFound,
            ErrorCode::TargetNotFound,
            ErrorCode::ChatNotFound,
        ] {
            assert_eq!(code.status_code(), StatusCode::NOT_FOUND);
        }
    }

    #[test]
    fn duplicate_registration_is_conflict() {
        assert_eq!(ErrorCode::UserAlreadyExists.status_code(), StatusCode::CONFLICT);
        assert_eq!(ErrorCode::UserAlreadyExists.code(), "E1002");
    }

    #[test]
    fn non_participant_is_forbidden() {
        assert_eq!(ErrorCode::NotChatParticipant.status_code(), StatusCode::FORBIDDEN);
    }
}
