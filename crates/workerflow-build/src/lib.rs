//! workerflow image build functionality
//!
//! This crate turns a worker directory into a container image and
//! publishes it: Dockerfile resolution, build context creation, the
//! label-schema metadata set, tagging, pushing and local digest lookup.
//! The Docker daemon is reached through the [`ImageEngine`] trait.

pub mod auth;
pub mod builder;
pub mod context;
pub mod engine;
pub mod error;
pub mod labels;
pub mod progress;
pub mod pusher;
pub mod resolver;

pub use auth::RegistryCredentials;
pub use builder::ImageBuilder;
pub use context::ContextBuilder;
pub use engine::{DockerEngine, ImageEngine};
pub use error::{BuildError, BuildResult};
pub use progress::BuildProgress;
pub use pusher::{ImagePusher, repo_digest, validate_tag};
pub use resolver::{BuildResolver, BuildSpec};

pub use bollard::auth::DockerCredentials;
