//! Locating, interpolating and validating `demoyork.toml`

use regex::{Captures, Regex};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use super::Config;
use crate::error::{Error, Result};

pub const CONFIG_FILENAME: &str = "demoyork.toml";

/// Overrides the upward search with an explicit file
pub const CONFIG_PATH_ENV: &str = "DEMOYORK_CONFIG";

/// Load the configuration used by the CLI and server
pub fn load_config() -> Result<Config> {
    let path = locate_config()?;
    tracing::debug!(path = %path.display(), "Loading configuration");
    load_config_from_path(&path)
}

/// Read, interpolate, parse and validate one configuration file
pub fn load_config_from_path(path: &Path) -> Result<Config> {
    let raw = fs::read_to_string(path).map_err(|_| Error::ConfigNotFound)?;
    let config: Config = toml::from_str(&interpolate_env_vars(&raw))?;
    config.validate()?;
    Ok(config)
}

/// `$DEMOYORK_CONFIG` if set, otherwise the nearest `demoyork.toml` in the
/// current directory or one of its ancestors
fn locate_config() -> Result<PathBuf> {
    if let Some(explicit) = env::var_os(CONFIG_PATH_ENV) {
        return Ok(PathBuf::from(explicit));
    }

    let cwd = env::current_dir()?;
    cwd.ancestors()
        .map(|dir| dir.join(CONFIG_FILENAME))
        .find(|candidate| candidate.is_file())
        .ok_or(Error::ConfigNotFound)
}

fn placeholder() -> &'static Regex {
    static PLACEHOLDER: OnceLock<Regex> = OnceLock::new();
    PLACEHOLDER.get_or_init(|| {
        Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)(?::-([^}]*))?\}")
            .expect("placeholder pattern is a valid regex")
    })
}

/// Substitute `${VAR}` and `${VAR:-fallback}`; unset variables without a
/// fallback become empty strings
fn interpolate_env_vars(content: &str) -> String {
    placeholder()
        .replace_all(content, |caps: &Captures| {
            env::var(&caps[1]).unwrap_or_else(|_| {
                caps.get(2)
                    .map(|fallback| fallback.as_str().to_string())
                    .unwrap_or_default()
            })
        })
        .into_owned()
}

/// Generate a default configuration file with the given fallback session secret
pub fn default_config_content(session_secret: &str) -> String {
    format!(
        r#"# DemoYork Configuration

[server]
host = "0.0.0.0"
port = 5010
cors_origin = "http://localhost:5010"
request_timeout_secs = 5

[session]
cookie_name = "demoyork-session"
# Prefer setting DEMOYORK_SESSION_SECRET in the environment
secret = "${{DEMOYORK_SESSION_SECRET:-{secret}}}"
ttl_secs = 3600

[database]
backend = "postgres"  # or "memory"
host = "${{DEMOYORK_DB_HOST:-localhost}}"
port = 5432
user = "${{DEMOYORK_DB_USER:-postgres}}"
password = "${{DEMOYORK_DB_PASSWORD:-postgres}}"
dbname = "demoyork"

[security]
bcrypt_cost = 10

# Roles a new account may pick at signup. Admins are created with
# 'demoyork create-user --role admin'.
[signup]
default_role = "customer"
self_service_roles = ["customer", "user"]
"#,
        secret = session_secret
    )
}
