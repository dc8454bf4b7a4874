//! DemoYork - users and categories API with session-cookie authentication
//! and role-based access control
//!
//! The interesting part lives in [`auth`]: requests pass through ordered
//! pipelines that resolve the session, gate the caller's role, or vet a
//! signup before any handler runs.

pub mod api;
pub mod auth;
pub mod category;
pub mod cli;
pub mod config;
pub mod error;
pub mod store;

pub use config::Config;
pub use error::Error;
