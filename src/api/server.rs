//! HTTP API server

use axum::{
    http::{header, HeaderValue, Method},
    middleware::from_fn_with_state,
    routing::{delete, get, post, put},
    Router,
};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::CorsLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use crate::auth::{enforce, AuthService, AuthorizationRequirement, Pipeline, RouteGuard, SessionCookie};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::store::{seed_roles, CategoryStore, Stores};

use super::{categories, routes, users};

/// Application state shared across handlers, immutable after startup
pub struct AppState {
    pub config: Config,
    pub auth: AuthService,
    pub cookie: SessionCookie,
    pub categories: Arc<dyn CategoryStore>,
}

pub type SharedState = Arc<AppState>;

impl AppState {
    /// Wire the auth pipeline and handlers to already-opened stores
    pub fn new(config: Config, stores: Stores) -> Result<SharedState> {
        config.validate()?;
        let auth = AuthService::from_config(&config, stores.credentials)?;
        let cookie = SessionCookie::from_config(&config.session);

        Ok(Arc::new(Self {
            config,
            auth,
            cookie,
            categories: stores.categories,
        }))
    }

    /// Open the configured store, seed roles, and build the state
    pub async fn initialize(config: Config) -> Result<SharedState> {
        if config.uses_default_secret() {
            tracing::warn!("Using the built-in session secret; set session.secret in production");
        }

        let stores = Stores::connect(&config.database).await?;
        seed_roles(stores.credentials.as_ref()).await?;
        Self::new(config, stores)
    }
}

/// Run the HTTP API server
pub async fn run_server(config: Config, host: &str, port: u16) -> Result<()> {
    let state = AppState::initialize(config).await?;
    let app = create_router(state)?;

    let addr = format!("{}:{}", host, port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

fn guard(state: &SharedState, requirement: AuthorizationRequirement) -> RouteGuard {
    RouteGuard::new(
        state.auth.clone(),
        state.cookie.clone(),
        Pipeline::write(requirement),
    )
}

/// The single origin allowed to send credentialed requests
fn cors_origin(configured: &str) -> Result<HeaderValue> {
    let configured = configured.trim();
    // tower-http rejects a wildcard origin together with credentials
    if configured == "*" {
        return Err(Error::Config(
            "server.cors_origin cannot be '*' when cookies are allowed".to_string(),
        ));
    }
    configured
        .parse::<HeaderValue>()
        .map_err(|e| Error::Config(format!("Invalid server.cors_origin: {}", e)))
}

/// Create the router with all routes
pub fn create_router(state: SharedState) -> Result<Router> {
    let user_write = guard(&state, AuthorizationRequirement::user_or_above());
    let admin_write = guard(&state, AuthorizationRequirement::admin());

    let category_routes = get(categories::list_categories)
        .merge(
            post(categories::add_category)
                .route_layer(from_fn_with_state(user_write, enforce)),
        )
        .merge(
            put(categories::update_category)
                .route_layer(from_fn_with_state(admin_write.clone(), enforce)),
        )
        .merge(
            delete(categories::delete_category)
                .route_layer(from_fn_with_state(admin_write, enforce)),
        );

    let origin = cors_origin(&state.config.server.cors_origin)?;

    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
        .allow_credentials(true);

    let timeout = Duration::from_secs(state.config.server.request_timeout_secs);

    Ok(Router::new()
        .route("/", get(routes::root))
        .route("/health", get(routes::health))
        // User routes
        .route("/users/signup", post(users::signup))
        .route("/users/signin", post(users::signin))
        .route("/users/signout", post(users::signout))
        // Category routes
        .route("/categories", category_routes)
        // Middleware
        .layer(TimeoutLayer::new(timeout))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cors_origin_rejects_wildcard() {
        assert!(matches!(cors_origin("*"), Err(Error::Config(_))));
        assert!(matches!(cors_origin(" * "), Err(Error::Config(_))));
        assert!(matches!(cors_origin("bad\norigin"), Err(Error::Config(_))));
        assert_eq!(
            cors_origin("http://localhost:5010").unwrap(),
            HeaderValue::from_static("http://localhost:5010")
        );
    }
}
