//! Shared application state for all routes. The catalog is immutable after startup.

use crate::config::Catalog;
use crate::service::SqlExecutor;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    pub executor: Arc<dyn SqlExecutor>,
    pub catalog: Arc<Catalog>,
    pub version: u32,
}

impl AppState {
    pub fn new(executor: Arc<dyn SqlExecutor>, catalog: Catalog, version: u32) -> Self {
        AppState {
            executor,
            catalog: Arc::new(catalog),
            version,
        }
    }
}
