//! Error types for DemoYork

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

use crate::api::ApiResponse;
use crate::auth::AuthError;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Auth(#[from] AuthError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] tokio_postgres::Error),

    #[error("Password hashing error: {0}")]
    Hash(#[from] bcrypt::BcryptError),

    #[error("Session token error: {0}")]
    Token(#[from] jsonwebtoken::errors::Error),

    #[error("Category '{0}' not found")]
    CategoryNotFound(String),

    #[error("Category '{0}' already exists")]
    CategoryAlreadyExists(String),

    #[error("Invalid request: {0}")]
    Validation(String),

    #[error("Config file not found. Run 'demoyork init' first.")]
    ConfigNotFound,

    #[error("{0}")]
    Other(String),
}

impl Error {
    /// HTTP status this error maps to at the API boundary
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Auth(err) => err.status_code(),
            Error::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            Error::CategoryAlreadyExists(_) => StatusCode::CONFLICT,
            Error::Validation(_) | Error::Json(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<anyhow::Error> for Error {
    fn from(err: anyhow::Error) -> Self {
        Error::Other(err.to_string())
    }
}

/// Malformed or incomplete request bodies are client errors
impl From<JsonRejection> for Error {
    fn from(rejection: JsonRejection) -> Self {
        Error::Validation(rejection.body_text())
    }
}

impl From<tokio::task::JoinError> for Error {
    fn from(err: tokio::task::JoinError) -> Self {
        Error::Other(format!("Background task failed: {}", err))
    }
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();

        match &self {
            Error::Auth(AuthError::DataIntegrity { user, role_id }) => {
                tracing::error!(
                    user = %user,
                    role_id = %role_id,
                    "Data integrity violation: user references a role that does not exist"
                );
            }
            _ if status.is_server_error() => {
                tracing::error!(error = %self, "Request failed");
            }
            _ => {
                tracing::debug!(status = %status, error = %self, "Request rejected");
            }
        }

        // Internal details stay in the logs
        let message = if status.is_server_error() {
            "Internal server error".to_string()
        } else {
            self.to_string()
        };

        (status, Json(ApiResponse::err(message))).into_response()
    }
}

pub type Result<T> = std::result::Result<T, Error>;
