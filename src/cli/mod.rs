//! CLI interface for DemoYork

pub mod commands;
mod output;

pub use output::*;

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "demoyork")]
#[command(version)]
#[command(about = "Users and categories API with session authentication and RBAC", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new demoyork.toml configuration file
    Init,

    /// Start the HTTP API server
    Serve {
        /// Host to bind to (defaults to server.host)
        #[arg(long)]
        host: Option<String>,

        /// Port to listen on (defaults to server.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Insert the default roles if the role collection is empty
    SeedRoles,

    /// List the roles in the store
    Roles,

    /// Create an account with any role, bypassing the signup allow-list
    CreateUser {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        /// Account password
        #[arg(short, long, env = "DEMOYORK_USER_PASSWORD", hide_env_values = true)]
        password: String,

        /// Role name to assign
        #[arg(short, long, default_value = "admin")]
        role: String,
    },
}
