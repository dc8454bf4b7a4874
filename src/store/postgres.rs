//! PostgreSQL-backed store

use async_trait::async_trait;
use tokio_postgres::error::SqlState;
use tokio_postgres::{Client, NoTls, Row};

use super::{CategoryStore, CredentialStore};
use crate::auth::{AuthError, DuplicateField, Role, User};
use crate::category::Category;
use crate::config::DatabaseConfig;
use crate::error::{Error, Result};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS roles (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    level       INTEGER NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    CONSTRAINT roles_name_key UNIQUE (name)
);

CREATE TABLE IF NOT EXISTS users (
    id            TEXT PRIMARY KEY,
    username      TEXT NOT NULL,
    email         TEXT NOT NULL,
    password_hash TEXT NOT NULL,
    role_id       TEXT NOT NULL REFERENCES roles (id),
    created_at    TIMESTAMPTZ NOT NULL,
    CONSTRAINT users_username_key UNIQUE (username),
    CONSTRAINT users_email_key UNIQUE (email)
);

CREATE TABLE IF NOT EXISTS categories (
    id          TEXT PRIMARY KEY,
    name        TEXT NOT NULL,
    description TEXT NOT NULL DEFAULT '',
    created_at  TIMESTAMPTZ NOT NULL,
    CONSTRAINT categories_name_key UNIQUE (name)
);
"#;

const USER_COLUMNS: &str = "id, username, email, password_hash, role_id, created_at";
const ROLE_COLUMNS: &str = "id, name, level, description";
const CATEGORY_COLUMNS: &str = "id, name, description, created_at";

pub struct PostgresStore {
    client: Client,
}

impl PostgresStore {
    /// Connect using the `[database]` configuration section
    pub async fn connect(config: &DatabaseConfig) -> Result<Self> {
        let (client, connection) =
            tokio_postgres::connect(&config.connection_string(), NoTls).await?;

        // Spawn the connection handler
        tokio::spawn(async move {
            if let Err(e) = connection.await {
                tracing::error!("PostgreSQL connection error: {}", e);
            }
        });

        tracing::info!(
            host = %config.host,
            dbname = %config.dbname,
            "Connected to PostgreSQL"
        );

        Ok(Self { client })
    }

    /// Create the tables if they do not exist yet
    pub async fn migrate(&self) -> Result<()> {
        self.client.batch_execute(SCHEMA).await?;
        tracing::debug!("Database schema is up to date");
        Ok(())
    }
}

fn user_from_row(row: &Row) -> User {
    User {
        id: row.get("id"),
        username: row.get("username"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        role_id: row.get("role_id"),
        created_at: row.get("created_at"),
    }
}

fn role_from_row(row: &Row) -> Role {
    Role {
        id: row.get("id"),
        name: row.get("name"),
        level: row.get("level"),
        description: row.get("description"),
    }
}

fn category_from_row(row: &Row) -> Category {
    Category {
        id: row.get("id"),
        name: row.get("name"),
        description: row.get("description"),
        created_at: row.get("created_at"),
    }
}

/// Name of the unique constraint a write violated, if that is why it failed
fn unique_violation(err: &tokio_postgres::Error) -> Option<&str> {
    err.as_db_error()
        .filter(|db| *db.code() == SqlState::UNIQUE_VIOLATION)
        .map(|db| db.constraint().unwrap_or_default())
}

#[async_trait]
impl CredentialStore for PostgresStore {
    async fn find_user_by_id(&self, id: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE id = $1", USER_COLUMNS);
        let row = self.client.query_opt(&query, &[&id]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let query = format!("SELECT {} FROM users WHERE username = $1", USER_COLUMNS);
        let row = self.client.query_opt(&query, &[&username]).await?;
        Ok(row.as_ref().map(user_from_row))
    }

    async fn find_user_by_username_or_email(
        &self,
        username: &str,
        email: &str,
    ) -> Result<Option<User>> {
        let query = format!(
            "SELECT {} FROM users WHERE username = $1 OR email = $2 LIMIT 1",
            USER_COLUMNS
        );
        let rows = self.client.query(&query, &[&username, &email]).await?;
        Ok(rows.first().map(user_from_row))
    }

    async fn insert_user(&self, user: &User) -> Result<()> {
        let result = self
            .client
            .execute(
                "INSERT INTO users (id, username, email, password_hash, role_id, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6)",
                &[
                    &user.id,
                    &user.username,
                    &user.email,
                    &user.password_hash,
                    &user.role_id,
                    &user.created_at,
                ],
            )
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(e) => match unique_violation(&e) {
                Some(constraint) if constraint.contains("email") => {
                    Err(AuthError::Conflict(DuplicateField::Email).into())
                }
                Some(_) => Err(AuthError::Conflict(DuplicateField::Username).into()),
                None => Err(Error::Database(e)),
            },
        }
    }

    async fn find_role_by_id(&self, id: &str) -> Result<Option<Role>> {
        let query = format!("SELECT {} FROM roles WHERE id = $1", ROLE_COLUMNS);
        let row = self.client.query_opt(&query, &[&id]).await?;
        Ok(row.as_ref().map(role_from_row))
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        let query = format!("SELECT {} FROM roles WHERE name = $1", ROLE_COLUMNS);
        let row = self.client.query_opt(&query, &[&name]).await?;
        Ok(row.as_ref().map(role_from_row))
    }

    async fn list_roles(&self) -> Result<Vec<Role>> {
        let query = format!("SELECT {} FROM roles ORDER BY level", ROLE_COLUMNS);
        let rows = self.client.query(&query, &[]).await?;
        Ok(rows.iter().map(role_from_row).collect())
    }

    async fn count_roles(&self) -> Result<u64> {
        let row = self
            .client
            .query_one("SELECT COUNT(*) FROM roles", &[])
            .await?;
        let count: i64 = row.get(0);
        Ok(count as u64)
    }

    async fn insert_roles(&self, roles: &[Role]) -> Result<u64> {
        let mut inserted = 0;
        for role in roles {
            // Another instance may have seeded concurrently
            inserted += self
                .client
                .execute(
                    "INSERT INTO roles (id, name, level, description) VALUES ($1, $2, $3, $4) \
                     ON CONFLICT (name) DO NOTHING",
                    &[&role.id, &role.name, &role.level, &role.description],
                )
                .await?;
        }
        Ok(inserted)
    }
}

#[async_trait]
impl CategoryStore for PostgresStore {
    async fn list_categories(&self) -> Result<Vec<Category>> {
        let query = format!("SELECT {} FROM categories ORDER BY name", CATEGORY_COLUMNS);
        let rows = self.client.query(&query, &[]).await?;
        Ok(rows.iter().map(category_from_row).collect())
    }

    async fn insert_category(&self, category: &Category) -> Result<()> {
        self.client
            .execute(
                "INSERT INTO categories (id, name, description, created_at) VALUES ($1, $2, $3, $4)",
                &[
                    &category.id,
                    &category.name,
                    &category.description,
                    &category.created_at,
                ],
            )
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => Error::CategoryAlreadyExists(category.name.clone()),
                None => Error::Database(e),
            })?;
        Ok(())
    }

    async fn update_category(
        &self,
        id: &str,
        name: &str,
        description: &str,
    ) -> Result<Option<Category>> {
        let query = format!(
            "UPDATE categories SET name = $2, description = $3 WHERE id = $1 RETURNING {}",
            CATEGORY_COLUMNS
        );
        let row = self
            .client
            .query_opt(&query, &[&id, &name, &description])
            .await
            .map_err(|e| match unique_violation(&e) {
                Some(_) => Error::CategoryAlreadyExists(name.to_string()),
                None => Error::Database(e),
            })?;
        Ok(row.as_ref().map(category_from_row))
    }

    async fn delete_category(&self, id: &str) -> Result<bool> {
        let deleted = self
            .client
            .execute("DELETE FROM categories WHERE id = $1", &[&id])
            .await?;
        Ok(deleted > 0)
    }
}
