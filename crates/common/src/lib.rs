pub mod error;
pub mod specs;

pub use error::{Error, Result};
pub use specs::{parse_repository_specs, RepositorySpec, DEFAULT_REVISION};
