//! Resource API SDK: declarative resources compiled to PostgreSQL migrations and
//! relationship-aware read queries, served as hypermedia documents.

pub mod classify;
pub mod config;
pub mod error;
pub mod graph;
pub mod handlers;
pub mod migration;
pub mod relationships;
pub mod response;
pub mod routes;
pub mod service;
pub mod settings;
pub mod sql;
pub mod state;

pub use classify::{classify, Arity, Classification, Storage};
pub use config::{load_catalog, load_from_dir, Catalog, Cardinality, Pluralize, ResourceConfig};
pub use error::{AppError, ConfigError};
pub use graph::dependency_order;
pub use migration::{apply_migrations, build_migrations, MigrationPlan};
pub use relationships::{build_relationships, RelationshipObject};
pub use routes::app;
pub use service::{ResourceReader, SqlExecutor};
pub use settings::Settings;
pub use state::AppState;
