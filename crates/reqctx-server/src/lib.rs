//! Reqctx server library logic.

pub mod api;
pub mod config;

use axum::{routing::get, Extension, Router};
use reqctx_context::ContextFactory;
use tower_http::trace::TraceLayer;

/// Builds the application router.
///
/// The factory is installed once as an extension; every handler that takes a
/// [`reqctx_context::Context`] receives one built from it.
pub fn app(factory: ContextFactory) -> Router {
    Router::new()
        .route("/health", get(api::health))
        .route("/health/db", get(api::db_health))
        .layer(Extension(factory))
        .layer(TraceLayer::new_for_http())
}
