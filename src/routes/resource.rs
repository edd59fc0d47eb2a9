//! Versioned read routes for declared resources. Handlers resolve the resource by plural form.

use crate::handlers::resource::{list, read, related, relationship, root};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn resource_routes(state: AppState) -> Router {
    let base = format!("/v{}", state.version);
    Router::new()
        .route(&base, get(root))
        .route(&format!("{}/:plural", base), get(list))
        .route(&format!("{}/:plural/:id", base), get(read))
        .route(&format!("{}/:plural/:id/relationships/:name", base), get(relationship))
        .route(&format!("{}/:plural/:id/:name", base), get(related))
        .with_state(state)
}
