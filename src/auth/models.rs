//! Authentication models

use serde::{Deserialize, Serialize};
use std::fmt;

/// Name of the lowest seeded role
pub const ROLE_CUSTOMER: &str = "customer";
/// Name of the regular user role
pub const ROLE_USER: &str = "user";
/// Name of the administrator role
pub const ROLE_ADMIN: &str = "admin";

pub const CUSTOMER_LEVEL: i32 = 1;
pub const USER_LEVEL: i32 = 3;
pub const ADMIN_LEVEL: i32 = 5;

/// A role record. Roles are reference data: seeded once and never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    /// Unique role identifier
    pub id: String,
    /// Unique role name
    pub name: String,
    /// Privilege strength; higher is more privileged
    pub level: i32,
    pub description: String,
}

impl Role {
    /// Create a new role with a fresh identifier
    pub fn new(name: impl Into<String>, level: i32, description: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            name: name.into(),
            level,
            description: description.into(),
        }
    }

    /// The roles inserted into an empty role collection at startup
    pub fn seed() -> Vec<Role> {
        vec![
            Role::new(ROLE_CUSTOMER, CUSTOMER_LEVEL, "Business client"),
            Role::new(ROLE_USER, USER_LEVEL, "Normal user"),
            Role::new(ROLE_ADMIN, ADMIN_LEVEL, "Administrator"),
        ]
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}({})", self.name, self.level)
    }
}

/// A stored user account
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    /// Unique user identifier, carried in the session token
    pub id: String,
    /// Username for login
    pub username: String,
    pub email: String,
    /// bcrypt hash of the user's password
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Reference to exactly one role
    pub role_id: String,
    /// When the account was created
    pub created_at: chrono::DateTime<chrono::Utc>,
}

impl User {
    /// Create a new user
    pub fn new(
        username: impl Into<String>,
        email: impl Into<String>,
        password_hash: impl Into<String>,
        role_id: impl Into<String>,
    ) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            username: username.into(),
            email: email.into(),
            password_hash: password_hash.into(),
            role_id: role_id.into(),
            created_at: chrono::Utc::now(),
        }
    }
}

/// Signup request body
#[derive(Debug, Clone, Deserialize)]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    /// Requested role name; the configured default applies when absent
    #[serde(default)]
    pub role: Option<String>,
}

/// A validated signup, as it flows through the signup pipeline
#[derive(Debug, Clone)]
pub struct SignupCandidate {
    pub username: String,
    pub email: String,
    pub password: String,
    pub role: String,
}

impl SignupCandidate {
    /// Normalize and validate a signup request
    pub fn from_request(req: SignupRequest, default_role: &str) -> crate::error::Result<Self> {
        let username = req.username.trim().to_string();
        let email = req.email.trim().to_lowercase();

        if username.is_empty() {
            return Err(crate::error::Error::Validation("username is required".to_string()));
        }
        if !email.contains('@') {
            return Err(crate::error::Error::Validation(format!(
                "invalid email address: {}",
                email
            )));
        }
        if req.password.is_empty() {
            return Err(crate::error::Error::Validation("password is required".to_string()));
        }

        let role = req
            .role
            .map(|r| r.trim().to_lowercase())
            .filter(|r| !r.is_empty())
            .unwrap_or_else(|| default_role.to_string());

        Ok(Self {
            username,
            email,
            password: req.password,
            role,
        })
    }
}

/// Login credentials
#[derive(Debug, Deserialize)]
pub struct SigninRequest {
    pub username: String,
    pub password: String,
}

/// User information in responses
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct UserInfo {
    pub id: String,
    pub username: String,
    pub email: String,
    pub role: String,
    pub level: i32,
}

impl UserInfo {
    pub fn new(user: &User, role: &Role) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            email: user.email.clone(),
            role: role.name.clone(),
            level: role.level,
        }
    }
}
