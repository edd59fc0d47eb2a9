//! Safe SQL building: identifiers from the catalog only, always escaped; values quoted or bound.

mod builder;
pub mod fragment;
pub mod naming;
pub mod params;
pub mod query;

pub use builder::*;
pub use fragment::{compile_fragment, Fragment};
pub use params::*;
pub use query::{compose_read, ReadQuery};
