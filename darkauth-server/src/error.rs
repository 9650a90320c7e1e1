use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

pub type ApiResult<T> = std::result::Result<T, ApiError>;

/// The taxonomy from which every handler error is drawn. `error_code`
/// determines the stable wire string; the `Display` message is for logs
/// and the `error_description` field, never the only signal a caller can
/// branch on.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("malformed request: {0}")]
    InvalidRequest(String),

    #[error("invalid client: {0}")]
    InvalidClient(String),

    #[error("unauthorized client: {0}")]
    UnauthorizedClient(String),

    #[error("invalid grant: {0}")]
    InvalidGrant(String),

    #[error("forbidden: {0}")]
    Forbidden(String),

    #[error("not found")]
    NotFound,

    #[error("validation failed: {0}")]
    Validation(String),

    #[error("rate limited, retry after {retry_after_seconds}s")]
    RateLimited { retry_after_seconds: u64 },

    /// OPAQUE protocol failure. Deliberately carries no detail: registration
    /// upload mismatches, tampered envelopes, and unknown login sessions are
    /// indistinguishable to the caller by design.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Session cookie or bearer token missing, malformed, or expired. Not
    /// part of the OAuth2 grant taxonomy, but distinct from an OPAQUE
    /// protocol failure: this is "you're not logged in", not "the password
    /// proof failed".
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("server already initialized")]
    AlreadyInstalled,

    #[error("server not yet initialized")]
    NotInstalled,

    #[error("cryptographic error: {0}")]
    CryptoError(String),

    #[error("database connection error: {0}")]
    DbConnectionError(String),

    #[error("unique constraint violation")]
    UniqueViolation,

    #[error("database error: {0}")]
    DatabaseError(String),

    #[error("unknown error: {0}")]
    Unknown(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// The stable string surfaced on the wire as `error`. Transport-layer
    /// concerns (forbidden, not_found, rate_limited, validation) share the
    /// taxonomy with the OAuth2 grant errors so every handler maps through
    /// one function.
    pub fn code(&self) -> &'static str {
        match self {
            ApiError::InvalidRequest(_) => "invalid_request",
            ApiError::InvalidClient(_) => "invalid_client",
            ApiError::UnauthorizedClient(_) => "unauthorized_client",
            ApiError::InvalidGrant(_) => "invalid_grant",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::NotFound => "not_found",
            ApiError::Validation(_) => "validation",
            ApiError::RateLimited { .. } => "rate_limited",
            ApiError::AuthenticationFailed => "authentication_failed",
            ApiError::Unauthenticated(_) => "unauthenticated",
            ApiError::AlreadyInstalled => "already_initialized",
            ApiError::NotInstalled => "not_initialized",
            ApiError::CryptoError(_)
            | ApiError::DbConnectionError(_)
            | ApiError::UniqueViolation
            | ApiError::DatabaseError(_)
            | ApiError::Unknown(_)
            | ApiError::Internal(_) => "internal_error",
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(e: sqlx::Error) -> Self {
        match e {
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed => {
                ApiError::DbConnectionError(e.to_string())
            }

            sqlx::Error::Database(db_err) => match db_err.code().as_deref() {
                Some("23505") => ApiError::UniqueViolation,
                _ => ApiError::DatabaseError(db_err.message().to_string()),
            },

            sqlx::Error::RowNotFound => ApiError::NotFound,

            _ => ApiError::Unknown(e.to_string()),
        }
    }
}

impl From<jsonwebtoken::errors::Error> for ApiError {
    fn from(e: jsonwebtoken::errors::Error) -> Self {
        ApiError::CryptoError(format!("jwt error: {e}"))
    }
}

#[derive(Serialize)]
struct ErrorResponse {
    error: &'static str,
    error_description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    retry_after: Option<u64>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self {
            ApiError::DbConnectionError(_)
            | ApiError::DatabaseError(_)
            | ApiError::Internal(_)
            | ApiError::CryptoError(_)
            | ApiError::Unknown(_) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::UniqueViolation | ApiError::AlreadyInstalled => StatusCode::CONFLICT,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::Unauthenticated(_)
            | ApiError::InvalidClient(_)
            | ApiError::AuthenticationFailed => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::InvalidRequest(_)
            | ApiError::InvalidGrant(_)
            | ApiError::UnauthorizedClient(_)
            | ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::NotInstalled => StatusCode::SERVICE_UNAVAILABLE,
        };
        let retry_after = match &self {
            ApiError::RateLimited { retry_after_seconds } => Some(*retry_after_seconds),
            _ => None,
        };
        let body = Json(ErrorResponse {
            error: self.code(),
            error_description: self.to_string(),
            retry_after,
        });
        (status, body).into_response()
    }
}
