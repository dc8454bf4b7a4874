//! Authentication and authorization failures

use axum::http::StatusCode;
use thiserror::Error;

use super::duplicates::DuplicateField;
use super::gate::DenyReason;

/// Every way the authorization pipeline can abort a request.
///
/// All variants are request-terminal; nothing here is retried.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("No session provided")]
    MissingSession,

    #[error("Invalid session")]
    InvalidSession,

    #[error("Session expired")]
    ExpiredSession,

    /// The session verified but names a user that no longer exists
    #[error("Session user no longer exists")]
    UnknownUser,

    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A user references a role that is not in the store
    #[error("User '{user}' references missing role '{role_id}'")]
    DataIntegrity { user: String, role_id: String },

    /// The reason is logged, not returned to the caller
    #[error("Insufficient privileges")]
    Forbidden(DenyReason),

    #[error("The {0} is already in use")]
    Conflict(DuplicateField),

    #[error("Role '{0}' does not exist")]
    UnknownRole(String),

    #[error("Role '{0}' cannot be selected at signup")]
    RoleNotSelfService(String),
}

impl AuthError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingSession
            | AuthError::InvalidSession
            | AuthError::ExpiredSession
            | AuthError::UnknownUser
            | AuthError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AuthError::Forbidden(_) | AuthError::RoleNotSelfService(_) => StatusCode::FORBIDDEN,
            AuthError::Conflict(_) => StatusCode::CONFLICT,
            AuthError::UnknownRole(_) => StatusCode::BAD_REQUEST,
            AuthError::DataIntegrity { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_failures_are_unauthorized() {
        for err in [
            AuthError::MissingSession,
            AuthError::InvalidSession,
            AuthError::ExpiredSession,
            AuthError::UnknownUser,
        ] {
            assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED, "{:?}", err);
        }
    }

    #[test]
    fn test_forbidden_hides_reason() {
        let err = AuthError::Forbidden(DenyReason::InsufficientLevel {
            required: 5,
            actual: 3,
        });
        assert_eq!(err.to_string(), "Insufficient privileges");
    }

    #[test]
    fn test_conflict_names_field() {
        let err = AuthError::Conflict(DuplicateField::Email);
        assert_eq!(err.to_string(), "The email is already in use");
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_data_integrity_is_server_error() {
        let err = AuthError::DataIntegrity {
            user: "u1".to_string(),
            role_id: "r404".to_string(),
        };
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
