//! HTTP API server

pub mod categories;
pub mod routes;
pub mod server;
pub mod users;

pub use routes::{ApiJson, ApiResponse};
pub use server::*;
