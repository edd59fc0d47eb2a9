//! Execution boundary: applying migration batches and running composed read queries.

mod executor;
mod reader;
pub use executor::{row_to_json, SqlExecutor};
pub use reader::ResourceReader;
