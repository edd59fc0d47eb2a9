//! HTTP handlers for resource reads.

pub mod resource;
pub use resource::*;
