//! Persistence for users, roles and categories
//!
//! The authorization pipeline only talks to [`CredentialStore`]; the category
//! handlers only talk to [`CategoryStore`]. Both backends implement both.
//!
//! Uniqueness (usernames, emails, role names, category names) is enforced by
//! the backend at write time. A violated user constraint surfaces as
//! [`AuthError::Conflict`](crate::auth::AuthError::Conflict).

mod memory;
mod postgres;
mod seed;

pub use memory::MemoryStore;
pub use postgres::PostgresStore;
pub use seed::seed_roles;

use async_trait::async_trait;
use std::sync::Arc;

use crate::auth::{Role, User};
use crate::category::Category;
use crate::config::{DatabaseBackend, DatabaseConfig};
use crate::error::Result;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>>;

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>>;

    /// First user whose username or email matches
    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>>;

    async fn insert_user(&self, user: &User) -> Result<()>;

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    async fn list_roles(&self) -> Result<Vec<Role>>;

    async fn count_roles(&self) -> Result<u64>;

    /// Insert roles, skipping any whose name already exists. Returns the number inserted.
    async fn insert_roles(&self, roles: &[Role]) -> Result<u64>;
}

#[async_trait]
pub trait CategoryStore: Send + Sync {
    async fn list_categories(&self) -> Result<Vec<Category>>;

    async fn insert_category(&self, category: &Category) -> Result<()>;

    /// Returns the updated category, or `None` if the id is unknown
    async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<Category>>;

    /// Returns whether a category was removed
    async fn delete_category(&self, id: &str) -> Result<bool>;
}

/// Handles to the configured backend, one per concern
#[derive(Clone)]
pub struct Stores {
    pub credentials: Arc<dyn CredentialStore>,
    pub categories: Arc<dyn CategoryStore>,
}

impl Stores {
    /// Both concerns served by one backend
    pub fn from_backend<S>(backend: Arc<S>) -> Self
    where
        S: CredentialStore + CategoryStore + 'static,
    {
        Self {
            credentials: backend.clone(),
            categories: backend,
        }
    }

    /// Open the backend named in the configuration
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        match config.backend {
            DatabaseBackend::Memory => {
                tracing::warn!("Using the in-memory store; data is lost on restart");
                Ok(Self::from_backend(Arc::new(MemoryStore::new())))
            }
            DatabaseBackend::Postgres => {
                let store = PostgresStore::connect(config).await?;
                store.migrate().await?;
                Ok(Self::from_backend(Arc::new(store)))
            }
        }
    }
}
