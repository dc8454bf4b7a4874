//! In-memory store for tests and local development

use async_trait::async_trait;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{CategoryStore, CredentialStore};
use crate::auth::{AuthError, DuplicateField, Role, User};
use crate::category::Category;
use crate::error::{Error, Result};

#[derive(Default)]
struct Collections {
    users: HashMap<String, User>,
    roles: HashMap<String, Role>,
    categories: HashMap<String, Category>,
}

/// Keeps every collection behind one lock so unique checks and inserts are atomic.
///
/// Role references are not checked on insert; the identity resolver reports
/// dangling references as data-integrity failures.
#[derive(Default)]
pub struct MemoryStore {
    inner: RwLock<Collections>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn user_count(&self) -> usize {
        self.inner.read().await.users.len()
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        Ok(self.inner.read().await.users.get(id).cloned())
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner.users.values().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let inner = self.inner.read().await;
        Ok(inner
            .users
            .values()
            .find(|u| u.username == username || u.email == email)
            .cloned())
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let mut inner = self.inner.write().await;

        for existing in inner.users.values() {
            if existing.username == user.username {
                return Err(AuthError::Conflict(DuplicateField::Username).into());
            }
            if existing.email == user.email {
                return Err(AuthError::Conflict(DuplicateField::Email).into());
            }
        }

        inner.users.insert(user.id.clone(), user.clone());
        Ok(())
    }

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>> {
        Ok(self.inner.read().await.roles.get(id).cloned())
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let inner = self.inner.read().await;
        Ok(inner.roles.values().find(|r| r.name == name).cloned())
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let inner = self.inner.read().await;
        let mut roles: Vec<Role> = inner.roles.values().cloned().collect();
        roles.sort_by_key(|r| r.level);
        Ok(roles)
    }

    async fn count_roles(&self) -> Result<u64> {
        Ok(self.inner.read().await.roles.len() as u64)
    }

    async fn insert_roles(&self, roles: &[Role]) -> Result<u64> {
        let mut inner = self.inner.write().await;
        let mut inserted = 0;

        for role in roles {
            if inner.roles.values().any(|r| r.name == role.name) {
                continue;
            }
            inner.roles.insert(role.id.clone(), role.clone());
            inserted += 1;
        }

        Ok(inserted)
    }
}

#[async_trait]
impl CategoryStore for MemoryStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let inner = self.inner.read().await;
        let mut categories: Vec<Category> = inner.categories.values().cloned().collect();
        categories.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(categories)
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        let mut inner = self.inner.write().await;
        if inner.categories.values().any(|c| c.name == category.name) {
            return Err(Error::CategoryAlreadyExists(category.name.clone()));
        }
        inner
            .categories
            .insert(category.id.clone(), category.clone());
        Ok(())
    }

    async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<Category>> {
        let mut inner = self.inner.write().await;

        if inner
            .categories
            .values()
            .any(|c| c.name == name && c.id != id)
        {
            return Err(Error::CategoryAlreadyExists(name.to_string()));
        }

        Ok(inner.categories.get_mut(id).map(|category| {
            category.name = name.to_string();
            category.description = description.to_string();
            category.clone()
        }))
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        Ok(self.inner.write().await.categories.remove(id).is_some())
    }
}
