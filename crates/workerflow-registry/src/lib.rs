//! workerflow registry clients
//!
//! A [`RegistryClient`] is one configured publish target. It answers
//! "which commit was the published image built from", builds and pushes
//! through the shared image engine, and verifies pushes by digest.
//!
//! Two variants share the contract:
//!
//! - [`DockerHubRegistry`]: registry API v2, schema 1 manifest history, unqualified tags
//! - [`HarborRegistry`]: Harbor REST API, tags qualified with the registry hostname

mod base;
pub mod client;
pub mod dockerhub;
pub mod error;
pub mod harbor;
pub mod manifest;

pub use client::{BuildRequest, RegistryClient};
pub use dockerhub::DockerHubRegistry;
pub use error::{RegistryError, Result};
pub use harbor::HarborRegistry;

use std::fmt;
use std::sync::Arc;
use workerflow_build::{ImageEngine, RegistryCredentials};

/// Registry variant, chosen at configuration time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistryKind {
    DockerHub,
    Harbor,
}

impl RegistryKind {
    /// Construct a client of this kind.
    pub fn connect(
        self,
        credentials: RegistryCredentials,
        engine: Arc<dyn ImageEngine>,
    ) -> Box<dyn RegistryClient> {
        match self {
            RegistryKind::DockerHub => Box::new(DockerHubRegistry::new(credentials, engine)),
            RegistryKind::Harbor => Box::new(HarborRegistry::new(credentials, engine)),
        }
    }
}

impl fmt::Display for RegistryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RegistryKind::DockerHub => write!(f, "dockerhub"),
            RegistryKind::Harbor => write!(f, "harbor"),
        }
    }
}
