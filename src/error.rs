use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

/// Every failure a request can end in. Each variant is one externally
/// visible kind; see [`AppError::kind`].
#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    /// Unknown email and wrong password both land here.
    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("{0}")]
    DuplicateIdentity(String),

    /// Missing, malformed, expired or foreign token, or a token whose user
    /// no longer exists.
    #[error("invalid or expired token")]
    InvalidToken,

    #[error("store unavailable: {0}")]
    StoreUnavailable(#[source] sqlx::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

pub type AppResult<T> = Result<T, AppError>;

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: &'static str,
    pub message: String,
}

impl AppError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::Validation(_) => "VALIDATION_ERROR",
            Self::InvalidCredentials => "INVALID_CREDENTIALS",
            Self::DuplicateIdentity(_) => "DUPLICATE_IDENTITY",
            Self::InvalidToken => "INVALID_TOKEN",
            Self::StoreUnavailable(_) => "STORE_UNAVAILABLE",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::InvalidCredentials | Self::InvalidToken => StatusCode::UNAUTHORIZED,
            Self::DuplicateIdentity(_) => StatusCode::CONFLICT,
            Self::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Client-facing text. Infrastructure causes stay in the logs.
    fn public_message(&self) -> String {
        match self {
            Self::StoreUnavailable(_) => "Storage temporarily unavailable, try again".into(),
            Self::Internal(_) => "An internal error occurred".into(),
            Self::InvalidCredentials => "Invalid credentials".into(),
            Self::InvalidToken => "Invalid or expired token".into(),
            Self::Validation(msg) | Self::DuplicateIdentity(msg) => msg.clone(),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::DuplicateEmail => Self::DuplicateIdentity("Email already registered".into()),
            StoreError::DuplicateUsername => Self::DuplicateIdentity("Username already taken".into()),
            StoreError::UnknownUser => Self::InvalidToken,
            StoreError::Unavailable(e) => Self::StoreUnavailable(e),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!(error = %self, kind = self.kind(), "request failed");
        }
        let body = ErrorBody {
            error: self.kind(),
            message: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_map_to_statuses() {
        let cases = [
            (AppError::validation("x"), StatusCode::BAD_REQUEST, "VALIDATION_ERROR"),
            (AppError::InvalidCredentials, StatusCode::UNAUTHORIZED, "INVALID_CREDENTIALS"),
            (AppError::DuplicateIdentity("x".into()), StatusCode::CONFLICT, "DUPLICATE_IDENTITY"),
            (AppError::InvalidToken, StatusCode::UNAUTHORIZED, "INVALID_TOKEN"),
            (
                AppError::StoreUnavailable(sqlx::Error::PoolTimedOut),
                StatusCode::SERVICE_UNAVAILABLE,
                "STORE_UNAVAILABLE",
            ),
            (AppError::Internal("x".into()), StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        ];
        for (err, status, kind) in cases {
            assert_eq!(err.status(), status);
            assert_eq!(err.kind(), kind);
        }
    }

    #[test]
    fn store_errors_convert() {
        assert!(matches!(
            AppError::from(StoreError::DuplicateEmail),
            AppError::DuplicateIdentity(_)
        ));
        assert!(matches!(
            AppError::from(StoreError::UnknownUser),
            AppError::InvalidToken
        ));
        assert!(matches!(
            AppError::from(StoreError::Unavailable(sqlx::Error::PoolTimedOut)),
            AppError::StoreUnavailable(_)
        ));
    }

    #[test]
    fn internal_details_are_not_exposed() {
        let err = AppError::Internal("argon2: bad params at /src/x.rs".into());
        assert_eq!(err.public_message(), "An internal error occurred");
        let err = AppError::StoreUnavailable(sqlx::Error::PoolTimedOut);
        assert!(!err.public_message().contains("pool"));
    }

    #[test]
    fn error_body_serialization() {
        let body = ErrorBody {
            error: "VALIDATION_ERROR",
            message: "Invalid email".into(),
        };
        let json = serde_json::to_value(&body).unwrap();
        assert_eq!(json["error"], "VALIDATION_ERROR");
        assert_eq!(json["message"], "Invalid email");
    }
}
