//! PostgreSQL store tests
//!
//! These need a running PostgreSQL server and are ignored by default.
//! Run with: DEMOYORK_TEST_DATABASE=postgres cargo test --test postgres_tests -- --ignored
//!
//! Connection settings come from the `PG*`-style variables below, falling back
//! to the defaults of the `[database]` config section.

use demoyork::auth::{AuthError, DuplicateField, Role, User};
use demoyork::category::Category;
use demoyork::config::{DatabaseBackend, DatabaseConfig};
use demoyork::store::{seed_roles, CategoryStore, CredentialStore, PostgresStore};
use demoyork::Error;
use std::env;

async fn connect() -> PostgresStore {
    let mut config = DatabaseConfig {
        backend: DatabaseBackend::Postgres,
        ..DatabaseConfig::default()
    };
    if let Ok(host) = env::var("PGHOST") {
        config.host = host;
    }
    if let Ok(user) = env::var("PGUSER") {
        config.user = user;
    }
    if let Ok(password) = env::var("PGPASSWORD") {
        config.password = password;
    }
    if let Ok(dbname) = env::var("DEMOYORK_TEST_DATABASE") {
        config.dbname = dbname;
    }

    let store = PostgresStore::connect(&config)
        .await
        .expect("PostgreSQL must be reachable for these tests");
    store.migrate().await.unwrap();
    store
}

fn unique(prefix: &str) -> String {
    format!("{}-{}", prefix, uuid::Uuid::new_v4().simple())
}

#[tokio::test]
#[ignore]
async fn test_pg_seed_and_lookup_roles() {
    let store = connect().await;
    seed_roles(&store).await.unwrap();

    let admin = store.find_role_by_name("admin").await.unwrap().unwrap();
    assert_eq!(admin.level, 5);
    assert_eq!(
        store.find_role_by_id(&admin.id).await.unwrap().unwrap().name,
        "admin"
    );

    // A second seed never duplicates names
    assert_eq!(store.insert_roles(&Role::seed()).await.unwrap(), 0);
}

#[tokio::test]
#[ignore]
async fn test_pg_unique_user_constraints() {
    let store = connect().await;
    seed_roles(&store).await.unwrap();
    let role = store.find_role_by_name("user").await.unwrap().unwrap();

    let username = unique("pg-user");
    let email = format!("{}@example.com", username);
    let user = User::new(username.clone(), email.clone(), "hash", role.id.clone());
    store.insert_user(&user).await.unwrap();

    let found = store.find_user_by_id(&user.id).await.unwrap().unwrap();
    assert_eq!(found.username, username);

    let same_name = User::new(username.clone(), unique("other"), "hash", role.id.clone());
    assert!(matches!(
        store.insert_user(&same_name).await.unwrap_err(),
        Error::Auth(AuthError::Conflict(DuplicateField::Username))
    ));

    let same_email = User::new(unique("other"), email.clone(), "hash", role.id.clone());
    assert!(matches!(
        store.insert_user(&same_email).await.unwrap_err(),
        Error::Auth(AuthError::Conflict(DuplicateField::Email))
    ));

    let by_email = store
        .find_user_by_username_or_email("nobody", &email)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(by_email.id, user.id);
}

#[tokio::test]
#[ignore]
async fn test_pg_category_lifecycle() {
    let store = connect().await;
    let category = Category::new(unique("category"), "desc");
    store.insert_category(&category).await.unwrap();

    assert!(matches!(
        store.insert_category(&category).await.unwrap_err(),
        Error::CategoryAlreadyExists(_)
    ));

    let renamed = unique("renamed");
    let updated = store
        .update_category(&category.id, &renamed, "new")
        .await
        .unwrap()
        .unwrap();
    assert_eq!(updated.name, renamed);

    assert!(store.delete_category(&category.id).await.unwrap());
    assert!(!store.delete_category(&category.id).await.unwrap());
}
