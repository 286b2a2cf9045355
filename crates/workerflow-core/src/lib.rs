//! workerflow core
//!
//! Model types shared by the build, registry and orchestration crates:
//! flavors and their descriptors, workers, commit references and the
//! tag scheme.

pub mod discovery;
pub mod error;
pub mod model;

pub use discovery::{FlavorSource, Flavors, list_workers, load_flavor, named_workers};
pub use error::{CoreError, Result};
pub use model::*;
