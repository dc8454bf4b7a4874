//! CLI command implementations

use anyhow::{Context, Result};
use std::fs;
use std::sync::Arc;

use crate::auth::{
    check_no_duplicate, AuthError, AuthService, DuplicateCheck, SignupCandidate, SignupRequest,
};
use crate::cli::{error, info, print_created_user, print_role_table, success, warn};
use crate::config::{self, loader::CONFIG_FILENAME, Config, DatabaseBackend};
use crate::store::{self, Stores};

/// Initialize a new demoyork.toml configuration file
pub async fn init() -> Result<()> {
    let config_path = std::path::Path::new(CONFIG_FILENAME);

    if config_path.exists() {
        warn(&format!("{} already exists", CONFIG_FILENAME));
        return Ok(());
    }

    let secret = format!(
        "{}{}",
        uuid::Uuid::new_v4().simple(),
        uuid::Uuid::new_v4().simple()
    );
    fs::write(config_path, config::loader::default_config_content(&secret))?;

    success(&format!("Created {}", CONFIG_FILENAME));
    info("Edit the database settings, then run 'demoyork serve'");

    Ok(())
}

/// Start the HTTP API server
pub async fn serve(host: Option<String>, port: Option<u16>) -> Result<()> {
    let config = load_config()?;
    let host = host.unwrap_or_else(|| config.server.host.clone());
    let port = port.unwrap_or(config.server.port);

    info(&format!("Starting server at http://{}:{}", host, port));

    crate::api::run_server(config, &host, port).await?;
    Ok(())
}

/// Seed the role collection
pub async fn seed_roles() -> Result<()> {
    let config = load_config()?;
    let stores = connect(&config).await?;

    let inserted = store::seed_roles(stores.credentials.as_ref()).await?;
    if inserted == 0 {
        info("Roles already present, nothing inserted");
    } else {
        success(&format!("Inserted {} roles", inserted));
    }
    Ok(())
}

/// List roles
pub async fn roles() -> Result<()> {
    let config = load_config()?;
    let stores = connect(&config).await?;

    let roles = stores.credentials.list_roles().await?;
    print_role_table(&roles);
    Ok(())
}

/// Create an account with an arbitrary role
pub async fn create_user(username: &str, email: &str, password: &str, role: &str) -> Result<()> {
    let config = load_config()?;
    let stores = connect(&config).await?;
    store::seed_roles(stores.credentials.as_ref()).await?;

    let auth = AuthService::from_config(&config, Arc::clone(&stores.credentials))?;
    let candidate = SignupCandidate::from_request(
        SignupRequest {
            username: username.to_string(),
            email: email.to_string(),
            password: password.to_string(),
            role: Some(role.to_string()),
        },
        role,
    )?;

    let role = auth
        .store()
        .find_role_by_name(&candidate.role)
        .await?
        .ok_or_else(|| AuthError::UnknownRole(candidate.role.clone()))?;

    if let DuplicateCheck::Conflict(field) = check_no_duplicate(auth.store(), &candidate).await? {
        error(&format!("The {} is already in use", field));
        return Err(AuthError::Conflict(field).into());
    }

    let user = auth.create_account(&candidate, &role).await?;
    print_created_user(&user, &role);
    Ok(())
}

fn load_config() -> Result<Config> {
    config::load_config().context("Failed to load configuration")
}

async fn connect(config: &Config) -> Result<Stores> {
    if config.database.backend == DatabaseBackend::Memory {
        warn("database.backend is 'memory'; changes will not persist");
    }
    Stores::connect(&config.database)
        .await
        .context("Failed to open the store")
}
