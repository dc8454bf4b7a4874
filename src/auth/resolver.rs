//! Session → (user, role) resolution

use std::sync::Arc;

use super::{AuthError, Role, SessionCodec, User};
use crate::error::Result;
use crate::store::CredentialStore;

/// Resolves a session token to the user it names and that user's role.
///
/// Read-only and idempotent; runs once per request.
#[derive(Clone)]
pub struct IdentityResolver {
    codec: Arc<SessionCodec>,
    store: Arc<dyn CredentialStore>,
}

impl IdentityResolver {
    pub fn new(codec: Arc<SessionCodec>, store: Arc<dyn CredentialStore>) -> Self {
        Self { codec, store }
    }

    pub async fn resolve(&self, token: &str) -> Result<(User, Role)> {
        let user_id = self.codec.parse(token)?;

        let user = self
            .store
            .find_user_by_id(&user_id)
            .await?
            .ok_or(AuthError::UnknownUser)?;

        let role = role_of(self.store.as_ref(), &user).await?;
        Ok((user, role))
    }
}

/// Load the role a user references, treating a dangling reference as corruption
pub async fn role_of(store: &dyn CredentialStore, user: &User) -> Result<Role> {
    store
        .find_role_by_id(&user.role_id)
        .await?
        .ok_or_else(|| {
            AuthError::DataIntegrity {
                user: user.username.clone(),
                role_id: user.role_id.clone(),
            }
            .into()
        })
}
