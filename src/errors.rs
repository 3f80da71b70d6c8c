use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;
use tracing::{error, warn};

/// Message returned to callers for every authentication failure.
///
/// Kept fixed so that wrong passwords, corrupt archives, TLS failures and
/// missing login cookies are indistinguishable from the outside.
pub const AUTHENTICATION_MESSAGE: &str =
    "Autenticação não realizada. Favor inserir os dados corretamente de acesso";

/// Message returned to callers for unexpected failures.
pub const INTERNAL_MESSAGE: &str = "Erro interno ao processar a requisição";

#[derive(Debug, Error)]
pub enum AppError {
    /// Certificate could not be decoded/decrypted, TLS failed or the portal did not log us in
    #[error("{}", AUTHENTICATION_MESSAGE)]
    Authentication,
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(String),
    /// Invalid URL format
    #[error("Invalid URL: {0}")]
    UrlError(String),
    /// Certificate material could not be converted
    #[error("TLS error: {0}")]
    TlsError(String),
    /// Invalid input format
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// IO operation failed
    #[error("IO error: {0}")]
    IoError(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    ///
    /// - Authentication: 401 Unauthorized
    /// - InvalidInput: 422 Unprocessable Entity
    /// - Everything else: 500 Internal Server Error
    pub fn status_code(&self) -> StatusCode {
        match self {
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::InvalidInput(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Self::NetworkError(_)
            | Self::UrlError(_)
            | Self::TlsError(_)
            | Self::IoError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message safe to send back to the caller.
    pub fn public_message(&self) -> String {
        match self {
            Self::Authentication => AUTHENTICATION_MESSAGE.to_string(),
            Self::InvalidInput(msg) => msg.clone(),
            _ => INTERNAL_MESSAGE.to_string(),
        }
    }
}

/// JSON error body: `{"detail": "..."}`.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub detail: String,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!(error = %self, "Request failed");
        } else {
            warn!(status = status.as_u16(), error = %self, "Request rejected");
        }

        let body = ErrorBody {
            detail: self.public_message(),
        };
        (status, Json(body)).into_response()
    }
}

// Conversion implementations for common errors
impl From<reqwest::Error> for AppError {
    fn from(err: reqwest::Error) -> Self {
        AppError::NetworkError(err.to_string())
    }
}

impl From<url::ParseError> for AppError {
    fn from(err: url::ParseError) -> Self {
        AppError::UrlError(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::IoError(err.to_string())
    }
}

impl From<openssl::error::ErrorStack> for AppError {
    fn from(err: openssl::error::ErrorStack) -> Self {
        AppError::TlsError(err.to_string())
    }
}

// Custom type alias for Results in this application
pub type AppResult<T> = Result<T, AppError>;
