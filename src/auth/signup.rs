//! Which roles a new account may pick for itself

use super::{AuthError, Role};
use crate::config::SignupConfig;
use crate::error::Result;
use crate::store::CredentialStore;

/// Explicit allow-list of roles selectable at self-service signup.
///
/// Anything outside the list (by default `admin`) can only be assigned
/// through the `create-user` command.
#[derive(Debug, Clone)]
pub struct SignupPolicy {
    default_role: String,
    self_service_roles: Vec<String>,
}

impl SignupPolicy {
    pub fn new(default_role: impl Into<String>, self_service_roles: Vec<String>) -> Self {
        Self {
            default_role: default_role.into(),
            self_service_roles,
        }
    }

    pub fn from_config(config: &SignupConfig) -> Self {
        Self::new(
            config.default_role.clone(),
            config.self_service_roles.clone(),
        )
    }

    pub fn default_role(&self) -> &str {
        &self.default_role
    }

    pub fn permits(&self, role_name: &str) -> bool {
        self.self_service_roles.iter().any(|r| r == role_name)
    }

    /// Resolve the requested role, rejecting unknown or privileged ones
    pub async fn validate(&self, store: &dyn CredentialStore, role_name: &str) -> Result<Role> {
        let role = store
            .find_role_by_name(role_name)
            .await?
            .ok_or_else(|| AuthError::UnknownRole(role_name.to_string()))?;

        if !self.permits(&role.name) {
            return Err(AuthError::RoleNotSelfService(role.name).into());
        }

        Ok(role)
    }
}

impl Default for SignupPolicy {
    fn default() -> Self {
        Self::from_config(&SignupConfig::default())
    }
}
