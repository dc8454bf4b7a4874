//! Configuration schema definitions

use serde::{Deserialize, Serialize};

use crate::auth::models::{ROLE_CUSTOMER, ROLE_USER};
use crate::error::{Error, Result};

/// Placeholder secret used when none is configured
pub const DEFAULT_SESSION_SECRET: &str = "change-this-session-secret";

/// Longest accepted session lifetime (one leap year)
pub const MAX_SESSION_TTL_SECS: u64 = 366 * 24 * 60 * 60;

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub session: SessionConfig,

    #[serde(default)]
    pub database: DatabaseConfig,

    #[serde(default)]
    pub security: SecurityConfig,

    #[serde(default)]
    pub signup: SignupConfig,
}

/// Server configuration for the HTTP API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Origin allowed to call the API from a browser
    #[serde(default = "default_cors_origin")]
    pub cors_origin: String,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}

fn default_port() -> u16 {
    5010
}

fn default_cors_origin() -> String {
    "http://localhost:5010".to_string()
}

fn default_request_timeout_secs() -> u64 {
    5
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            cors_origin: default_cors_origin(),
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

/// Session cookie and signing configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,

    /// HMAC secret used to sign session tokens
    #[serde(default = "default_secret")]
    pub secret: String,

    /// Session lifetime (1 hour by default)
    #[serde(default = "default_ttl_secs")]
    pub ttl_secs: u64,
}

fn default_cookie_name() -> String {
    "demoyork-session".to_string()
}

fn default_secret() -> String {
    DEFAULT_SESSION_SECRET.to_string()
}

fn default_ttl_secs() -> u64 {
    60 * 60
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: default_cookie_name(),
            secret: default_secret(),
            ttl_secs: default_ttl_secs(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, Default, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    #[default]
    Memory,
    Postgres,
}

/// Database connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    #[serde(default)]
    pub backend: DatabaseBackend,

    #[serde(default = "default_db_host")]
    pub host: String,

    #[serde(default = "default_db_port")]
    pub port: u16,

    #[serde(default = "default_db_user")]
    pub user: String,

    #[serde(default = "default_db_password")]
    pub password: String,

    #[serde(default = "default_db_name")]
    pub dbname: String,
}

fn default_db_host() -> String {
    "localhost".to_string()
}

fn default_db_port() -> u16 {
    5432
}

fn default_db_user() -> String {
    "postgres".to_string()
}

fn default_db_password() -> String {
    "postgres".to_string()
}

fn default_db_name() -> String {
    "demoyork".to_string()
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            backend: DatabaseBackend::default(),
            host: default_db_host(),
            port: default_db_port(),
            user: default_db_user(),
            password: default_db_password(),
            dbname: default_db_name(),
        }
    }
}

impl DatabaseConfig {
    pub fn connection_string(&self) -> String {
        format!(
            "host={} port={} user={} password={} dbname={}",
            self.host, self.port, self.user, self.password, self.dbname
        )
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SecurityConfig {
    /// bcrypt work factor (4..=31)
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,
}

fn default_bcrypt_cost() -> u32 {
    10
}

impl Default for SecurityConfig {
    fn default() -> Self {
        Self {
            bcrypt_cost: default_bcrypt_cost(),
        }
    }
}

/// Self-service signup rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignupConfig {
    /// Role assigned when the signup request names none
    #[serde(default = "default_signup_role")]
    pub default_role: String,

    /// Roles a new account may choose for itself
    #[serde(default = "default_self_service_roles")]
    pub self_service_roles: Vec<String>,
}

fn default_signup_role() -> String {
    ROLE_CUSTOMER.to_string()
}

fn default_self_service_roles() -> Vec<String> {
    vec![ROLE_CUSTOMER.to_string(), ROLE_USER.to_string()]
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            default_role: default_signup_role(),
            self_service_roles: default_self_service_roles(),
        }
    }
}

impl Config {
    /// Reject settings the server cannot start with
    pub fn validate(&self) -> Result<()> {
        if self.server.request_timeout_secs == 0 {
            return Err(Error::Config(
                "server.request_timeout_secs must be positive".to_string(),
            ));
        }
        // Credentialed CORS cannot use a wildcard origin
        if self.server.cors_origin.trim() == "*" {
            return Err(Error::Config(
                "server.cors_origin must name an origin; '*' cannot be combined with cookies"
                    .to_string(),
            ));
        }
        if self.session.secret.is_empty() {
            return Err(Error::Config("session.secret must not be empty".to_string()));
        }
        if self.session.ttl_secs == 0 {
            return Err(Error::Config("session.ttl_secs must be positive".to_string()));
        }
        if self.session.ttl_secs > MAX_SESSION_TTL_SECS {
            return Err(Error::Config(format!(
                "session.ttl_secs must be at most {}, got {}",
                MAX_SESSION_TTL_SECS, self.session.ttl_secs
            )));
        }
        if self.session.cookie_name.is_empty() {
            return Err(Error::Config("session.cookie_name must not be empty".to_string()));
        }
        if !(4..=31).contains(&self.security.bcrypt_cost) {
            return Err(Error::Config(format!(
                "security.bcrypt_cost must be between 4 and 31, got {}",
                self.security.bcrypt_cost
            )));
        }
        if !self
            .signup
            .self_service_roles
            .contains(&self.signup.default_role)
        {
            return Err(Error::Config(format!(
                "signup.default_role '{}' is not in signup.self_service_roles",
                self.signup.default_role
            )));
        }
        Ok(())
    }

    pub fn uses_default_secret(&self) -> bool {
        self.session.secret == DEFAULT_SESSION_SECRET
    }
}
