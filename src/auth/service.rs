//! Sign-in, account creation, and the shared handles pipelines run against

use chrono::Duration;
use std::sync::Arc;

use super::password::{hash_password, verify_password};
use super::pipeline::{Pipeline, RequestContext};
use super::resolver::role_of;
use super::{AuthError, IdentityResolver, Role, SessionCodec, SignupCandidate, SignupPolicy, User};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::CredentialStore;

/// A successful sign-in
#[derive(Debug, Clone)]
pub struct SignedIn {
    pub token: String,
    pub user: User,
    pub role: Role,
}

/// Everything the authorization pipelines need, built once at startup.
///
/// Cheap to clone; all state is shared and read-only.
#[derive(Clone)]
pub struct AuthService {
    codec: Arc<SessionCodec>,
    resolver: IdentityResolver,
    store: Arc<dyn CredentialStore>,
    policy: SignupPolicy,
    bcrypt_cost: u32,
}

impl AuthService {
    pub fn new(
        codec: SessionCodec,
        store: Arc<dyn CredentialStore>,
        policy: SignupPolicy,
        bcrypt_cost: u32,
    ) -> Self {
        let codec = Arc::new(codec);
        let resolver = IdentityResolver::new(codec.clone(), store.clone());
        Self {
            codec,
            resolver,
            store,
            policy,
            bcrypt_cost,
        }
    }

    pub fn from_config(config: &Config, store: Arc<dyn CredentialStore>) -> Result<Self> {
        Ok(Self::new(
            SessionCodec::from_config(&config.session)?,
            store,
            SignupPolicy::from_config(&config.signup),
            config.security.bcrypt_cost,
        ))
    }

    pub fn codec(&self) -> &SessionCodec {
        &self.codec
    }

    pub fn resolver(&self) -> &IdentityResolver {
        &self.resolver
    }

    pub fn store(&self) -> &dyn CredentialStore {
        self.store.as_ref()
    }

    pub fn policy(&self) -> &SignupPolicy {
        &self.policy
    }

    pub fn session_ttl(&self) -> Duration {
        self.codec.ttl()
    }

    /// Check credentials and issue a session
    pub async fn sign_in(&self, username: &str, password: &str) -> Result<SignedIn> {
        let user = self
            .store
            .find_user_by_username(username.trim())
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        if !verify_password(password, &user.password_hash).await? {
            tracing::info!(username = %user.username, "Sign-in rejected: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let role = role_of(self.store.as_ref(), &user).await?;
        let token = self.codec.issue(&user.id)?;

        tracing::info!(username = %user.username, role = %role, "User signed in");
        Ok(SignedIn { token, user, role })
    }

    /// Run the signup pipeline, then create the account
    pub async fn sign_up(&self, candidate: SignupCandidate) -> Result<(User, Role)> {
        let ctx = Pipeline::signup()
            .run(self, RequestContext::for_signup(candidate))
            .await?;

        let (candidate, role) = match (ctx.candidate, ctx.role) {
            (Some(candidate), Some(role)) => (candidate, role),
            _ => {
                return Err(Error::Other(
                    "signup pipeline finished without a resolved role".to_string(),
                ))
            }
        };

        let user = self.create_account(&candidate, &role).await?;
        Ok((user, role))
    }

    /// Hash the password and store the user. No policy checks happen here.
    pub async fn create_account(&self, candidate: &SignupCandidate, role: &Role) -> Result<User> {
        let password_hash = hash_password(&candidate.password, self.bcrypt_cost).await?;
        let user = User::new(
            candidate.username.clone(),
            candidate.email.clone(),
            password_hash,
            role.id.clone(),
        );

        self.store.insert_user(&user).await?;

        tracing::info!(username = %user.username, role = %role, "Created account");
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::DuplicateField;
    use crate::store::{seed_roles, MemoryStore};

    async fn service() -> (AuthService, Arc<MemoryStore>) {
        let store = Arc::new(MemoryStore::new());
        seed_roles(store.as_ref()).await.unwrap();
        let auth = AuthService::new(
            SessionCodec::new(b"service-secret", Duration::hours(1)),
            store.clone(),
            SignupPolicy::default(),
            4,
        );
        (auth, store)
    }

    fn candidate(username: &str, email: &str, role: &str) -> SignupCandidate {
        SignupCandidate {
            username: username.to_string(),
            email: email.to_string(),
            password: "correct horse".to_string(),
            role: role.to_string(),
        }
    }

    #[tokio::test]
    async fn test_sign_up_then_sign_in() {
        let (auth, _store) = service().await;
        let (user, role) = auth
            .sign_up(candidate("alice", "alice@example.com", "user"))
            .await
            .unwrap();
        assert_eq!(role.name, "user");
        assert_eq!(user.role_id, role.id);

        let signed_in = auth.sign_in("alice", "correct horse").await.unwrap();
        assert_eq!(signed_in.user.id, user.id);
        assert_eq!(signed_in.role.level, 3);
        assert_eq!(auth.codec().parse(&signed_in.token), Ok(user.id));
    }

    #[tokio::test]
    async fn test_sign_in_rejects_bad_credentials() {
        let (auth, _store) = service().await;
        auth.sign_up(candidate("alice", "alice@example.com", "user"))
            .await
            .unwrap();

        for (username, password) in [("alice", "wrong"), ("nobody", "correct horse")] {
            let err = auth.sign_in(username, password).await.unwrap_err();
            assert!(matches!(err, Error::Auth(AuthError::InvalidCredentials)));
        }
    }

    #[tokio::test]
    async fn test_sign_up_duplicate_email_creates_nothing() {
        let (auth, store) = service().await;
        auth.sign_up(candidate("alice", "alice@example.com", "user"))
            .await
            .unwrap();

        let err = auth
            .sign_up(candidate("alice2", "alice@example.com", "customer"))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            Error::Auth(AuthError::Conflict(DuplicateField::Email))
        ));
        assert_eq!(store.user_count().await, 1);
    }

    #[tokio::test]
    async fn test_create_account_bypasses_policy() {
        let (auth, store) = service().await;
        let admin = store.find_role_by_name("admin").await.unwrap().unwrap();

        let user = auth
            .create_account(&candidate("admin1", "admin@example.com", "admin"), &admin)
            .await
            .unwrap();
        assert_eq!(user.role_id, admin.id);
    }
}
