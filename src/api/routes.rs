//! Shared response envelope and unauthenticated routes

use axum::{
    extract::{FromRequest, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::{Deserialize, Serialize};

use super::server::SharedState;
use crate::error::{Error, Result};

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: Option<T>,
    pub error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }
}

impl ApiResponse<()> {
    pub fn err(message: impl Into<String>) -> Self {
        ApiResponse {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// JSON request body. Rejections (bad syntax, missing fields, wrong content
/// type) become [`Error::Validation`] and use the envelope above.
#[derive(Debug, FromRequest)]
#[from_request(via(Json), rejection(Error))]
pub struct ApiJson<T>(pub T);

/// Greeting payload served at `/`
#[derive(Debug, Serialize)]
pub struct Welcome {
    pub status_code: u16,
    pub status_message: &'static str,
    pub body_message: &'static str,
}

pub async fn root() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(Welcome {
            status_code: 200,
            status_message: "OK",
            body_message: "Welcome to DemoYork application.",
        }),
    )
}

/// Liveness payload; `roles` doubles as a store round-trip check
#[derive(Debug, Serialize)]
pub struct Health {
    pub status: &'static str,
    pub roles: u64,
}

pub async fn health(State(state): State<SharedState>) -> Result<impl IntoResponse> {
    let roles = state.auth.store().count_roles().await?;
    Ok(Json(ApiResponse::ok(Health {
        status: "healthy",
        roles,
    })))
}
