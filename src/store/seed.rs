//! Startup seeding of the role collection

use super::CredentialStore;
use crate::auth::Role;
use crate::error::Result;

/// Insert the default roles when the role collection is empty.
///
/// Returns how many roles were inserted; zero when roles already exist.
/// Two instances starting against the same empty database may both see a
/// zero count; role names are unique, so the loser inserts nothing.
pub async fn seed_roles(store: &dyn CredentialStore) -> Result<u64> {
    let count = store.count_roles().await?;
    if count > 0 {
        tracing::debug!(count, "Roles already present, skipping seed");
        return Ok(0);
    }

    let inserted = store.insert_roles(&Role::seed()).await?;
    tracing::info!(inserted, "Added 'customer', 'user' and 'admin' to roles collection");
    Ok(inserted)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_seed_empty_collection() {
        let store = MemoryStore::new();
        assert_eq!(seed_roles(&store).await.unwrap(), 3);

        let customer = store.find_role_by_name("customer").await.unwrap().unwrap();
        assert_eq!(customer.level, 1);
        let admin = store.find_role_by_name("admin").await.unwrap().unwrap();
        assert_eq!(admin.level, 5);
    }

    #[tokio::test]
    async fn test_seed_is_skipped_when_roles_exist() {
        let store = MemoryStore::new();
        store
            .insert_roles(&[Role::new("auditor", 2, "Read-only auditor")])
            .await
            .unwrap();

        assert_eq!(seed_roles(&store).await.unwrap(), 0);
        assert_eq!(store.count_roles().await.unwrap(), 1);
    }
}
