//! Awis Storefront library.
//!
//! Server-rendered guest checkout for Awis tenant storefronts. The crate is
//! a library so the router can be driven by integration tests against a
//! fake backend; `main.rs` only wires configuration, tracing and Sentry.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod backend;
pub mod config;
pub mod error;
pub mod filters;
pub mod labels;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;
pub mod state;

use axum::{Router, middleware::from_fn};
use tower::ServiceBuilder;
use tower_http::{services::ServeDir, trace::TraceLayer};

use config::ConfigError;
use state::AppState;

/// Directory served under `/static`, relative to the workspace root.
pub const STATIC_DIR: &str = "crates/storefront/static";

/// Build the full application router.
///
/// Layer order is documented in [`middleware`].
///
/// # Errors
///
/// Returns an error if the session signing key cannot be derived.
pub fn app(state: AppState) -> Result<Router, ConfigError> {
    let stack = ServiceBuilder::new()
        .layer(TraceLayer::new_for_http())
        .layer(from_fn(middleware::request_id_middleware))
        .layer(from_fn(middleware::security_headers_middleware))
        .layer(from_fn(middleware::csp_nonce_middleware))
        .layer(middleware::create_session_layer(state.config())?);

    Ok(Router::new()
        .merge(routes::routes())
        .nest_service("/static", ServeDir::new(STATIC_DIR))
        .layer(stack)
        .with_state(state)
        // Sentry layers (outermost for full request coverage)
        .layer(sentry_tower::NewSentryLayer::new_from_top())
        .layer(sentry_tower::SentryHttpLayer::new().enable_transaction()))
}
