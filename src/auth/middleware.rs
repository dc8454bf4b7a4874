//! Session cookie handling and the axum middleware that runs pipelines

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;

use super::pipeline::{Pipeline, RequestContext};
use super::AuthService;
use crate::config::SessionConfig;
use crate::error::Error;

/// Builds and reads the session cookie
#[derive(Debug, Clone)]
pub struct SessionCookie {
    name: String,
    max_age_secs: u64,
}

impl SessionCookie {
    pub fn new(name: impl Into<String>, max_age_secs: u64) -> Self {
        Self {
            name: name.into(),
            max_age_secs,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(config.cookie_name.clone(), config.ttl_secs)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// `Set-Cookie` value carrying a fresh session
    pub fn set(&self, token: &str) -> String {
        format!(
            "{}={}; HttpOnly; Path=/; Max-Age={}; SameSite=Lax",
            self.name, token, self.max_age_secs
        )
    }

    /// `Set-Cookie` value that removes the session
    pub fn clear(&self) -> String {
        format!("{}=; HttpOnly; Path=/; Max-Age=0; SameSite=Lax", self.name)
    }

    /// Extract the session token from request headers
    pub fn token_from_headers(&self, headers: &HeaderMap) -> Option<String> {
        // Try to get token from Authorization header
        if let Some(auth_header) = headers.get(header::AUTHORIZATION) {
            if let Ok(auth_str) = auth_header.to_str() {
                if let Some(token) = auth_str.strip_prefix("Bearer ") {
                    return Some(token.trim().to_string());
                }
            }
        }

        // Try to get token from cookie
        let prefix = format!("{}=", self.name);
        for cookie_header in headers.get_all(header::COOKIE) {
            if let Ok(cookie_str) = cookie_header.to_str() {
                for cookie in cookie_str.split(';') {
                    if let Some(token) = cookie.trim().strip_prefix(&prefix) {
                        if !token.is_empty() {
                            return Some(token.to_string());
                        }
                    }
                }
            }
        }

        None
    }
}

/// State for one protected route: the pipeline to run and what it runs against
#[derive(Clone)]
pub struct RouteGuard {
    auth: AuthService,
    cookie: SessionCookie,
    pipeline: Arc<Pipeline>,
}

impl RouteGuard {
    pub fn new(auth: AuthService, cookie: SessionCookie, pipeline: Pipeline) -> Self {
        Self {
            auth,
            cookie,
            pipeline: Arc::new(pipeline),
        }
    }
}

/// Middleware running the guard's pipeline before the wrapped handler.
///
/// On success the resolved [`RequestContext`] is available to the handler as
/// an `Extension`. If the client goes away the request future is dropped and
/// the remaining steps never run.
pub async fn enforce(
    State(guard): State<RouteGuard>,
    mut req: Request,
    next: Next,
) -> Result<Response, Error> {
    let token = guard.cookie.token_from_headers(req.headers());
    let ctx = guard
        .pipeline
        .run(&guard.auth, RequestContext::with_session(token))
        .await?;

    tracing::debug!(
        pipeline = guard.pipeline.name(),
        user = %ctx.username(),
        "Request authorized"
    );

    req.extensions_mut().insert(ctx);
    Ok(next.run(req).await)
}
