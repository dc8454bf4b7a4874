//! `/users` handlers: signup, signin, signout

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};

use super::routes::{ApiJson, ApiResponse};
use super::server::SharedState;
use crate::auth::{SigninRequest, SignupCandidate, SignupRequest, UserInfo};
use crate::error::Result;

/// Create an account after the signup pipeline accepts it
pub async fn signup(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<SignupRequest>,
) -> Result<impl IntoResponse> {
    let candidate = SignupCandidate::from_request(req, state.auth.policy().default_role())?;
    let (user, role) = state.auth.sign_up(candidate).await?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::ok(UserInfo::new(&user, &role))),
    ))
}

/// Verify credentials and hand out the session cookie
pub async fn signin(
    State(state): State<SharedState>,
    ApiJson(req): ApiJson<SigninRequest>,
) -> Result<impl IntoResponse> {
    let signed_in = state.auth.sign_in(&req.username, &req.password).await?;

    Ok((
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookie.set(&signed_in.token))],
        Json(ApiResponse::ok(UserInfo::new(
            &signed_in.user,
            &signed_in.role,
        ))),
    ))
}

/// Sessions are not stored server-side, so signing out only drops the cookie
pub async fn signout(State(state): State<SharedState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::SET_COOKIE, state.cookie.clear())],
        Json(ApiResponse::ok("You've been signed out!")),
    )
}
