//! Declarative role requirements and their evaluation
//!
//! Routes attach [`AuthorizationRequirement`] values; [`require`] is the one
//! place role comparisons happen. Evaluation is pure.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::models::{ROLE_ADMIN, USER_LEVEL};
use super::{AuthError, Role};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationRequirement {
    /// The role name must match exactly
    NamedRole(String),
    /// The role level must be at least this value
    MinLevel(i32),
}

impl AuthorizationRequirement {
    pub fn named(name: impl Into<String>) -> Self {
        AuthorizationRequirement::NamedRole(name.into())
    }

    pub fn min_level(level: i32) -> Self {
        AuthorizationRequirement::MinLevel(level)
    }

    /// Only administrators
    pub fn admin() -> Self {
        Self::named(ROLE_ADMIN)
    }

    /// Regular users and anything above
    pub fn user_or_above() -> Self {
        Self::min_level(USER_LEVEL)
    }
}

impl fmt::Display for AuthorizationRequirement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AuthorizationRequirement::NamedRole(name) => write!(f, "role = {}", name),
            AuthorizationRequirement::MinLevel(level) => write!(f, "level >= {}", level),
        }
    }
}

/// Why a requirement denied a role
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The role is below the required level
    InsufficientLevel { required: i32, actual: i32 },
    /// The role is not the one required
    WrongRole { required: String, actual: String },
}

impl fmt::Display for DenyReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DenyReason::InsufficientLevel { required, actual } => write!(
                f,
                "insufficient privilege: level {} required, role has {}",
                required, actual
            ),
            DenyReason::WrongRole { required, actual } => {
                write!(f, "wrong role: '{}' required, got '{}'", required, actual)
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allow)
    }
}

/// Evaluate a single requirement against a role
pub fn require(requirement: &AuthorizationRequirement, role: &Role) -> Decision {
    match requirement {
        AuthorizationRequirement::NamedRole(name) if role.name == *name => Decision::Allow,
        AuthorizationRequirement::NamedRole(name) => Decision::Deny(DenyReason::WrongRole {
            required: name.clone(),
            actual: role.name.clone(),
        }),
        AuthorizationRequirement::MinLevel(level) if role.level >= *level => Decision::Allow,
        AuthorizationRequirement::MinLevel(level) => {
            Decision::Deny(DenyReason::InsufficientLevel {
                required: *level,
                actual: role.level,
            })
        }
    }
}

/// All requirements must allow; the first denial wins
pub fn require_all(requirements: &[AuthorizationRequirement], role: &Role) -> Result<(), AuthError> {
    for requirement in requirements {
        if let Decision::Deny(reason) = require(requirement, role) {
            return Err(AuthError::Forbidden(reason));
        }
    }
    Ok(())
}
