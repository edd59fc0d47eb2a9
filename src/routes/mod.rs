//! Router assembly.

mod common;
mod resource;
pub use common::common_routes;
pub use resource::resource_routes;

use crate::handlers::not_found;
use crate::state::AppState;
use axum::Router;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::trace::TraceLayer;

/// Reads carry no body; anything larger than this is refused.
pub const BODY_LIMIT: usize = 64 * 1024;

/// Full application router: common routes, versioned resource routes, JSON 404 fallback.
pub fn app(state: AppState) -> Router {
    Router::new()
        .merge(common_routes(state.clone()))
        .merge(resource_routes(state))
        .fallback(not_found)
        .layer(RequestBodyLimitLayer::new(BODY_LIMIT))
        .layer(TraceLayer::new_for_http())
}
