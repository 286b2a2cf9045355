//! Error types for change detection, configuration and publishing

use std::error::Error as StdError;
use thiserror::Error;
use workerflow_build::BuildError;
use workerflow_core::CoreError;
use workerflow_registry::RegistryError;

/// Source-control query errors
#[derive(Error, Debug)]
pub enum VcsError {
    #[error("failed to run git: {0}")]
    Spawn(#[from] std::io::Error),

    #[error("git {command} failed: {stderr}")]
    CommandFailed { command: String, stderr: String },

    #[error("invalid commit reference: {0:?}")]
    InvalidRef(String),

    #[error("unexpected git output: {0}")]
    UnexpectedOutput(String),
}

/// Startup configuration errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("namespace must not be empty")]
    EmptyNamespace,

    #[error("invalid {kind} registry: {source}")]
    Registry {
        kind: String,
        #[source]
        source: BuildError,
    },

    #[error("failed to resolve workers: {0}")]
    Workers(#[from] CoreError),
}

/// Failure of one (flavor, registry) publish
#[derive(Error, Debug)]
pub enum PublishError {
    #[error("invalid flavor descriptor")]
    Descriptor(#[source] CoreError),

    #[error("image build failed")]
    Build(#[source] RegistryError),

    #[error("image build of worker {worker} already failed in this run: {cause}")]
    PriorBuildFailed { worker: String, cause: String },

    #[error("push of tag {tag} failed")]
    Push {
        tag: String,
        #[source]
        source: RegistryError,
    },
}

/// Render an error and its sources on one line.
///
/// A source whose message is already part of the line is not repeated.
pub fn cause_chain(err: &(dyn StdError + 'static)) -> String {
    let mut line = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let message = cause.to_string();
        if !line.contains(&message) {
            line.push_str(": ");
            line.push_str(&message);
        }
        source = cause.source();
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cause_chain_joins_sources() {
        let err = PublishError::Push {
            tag: "devel".to_string(),
            source: RegistryError::Build(BuildError::PushFailed {
                message: "denied".to_string(),
            }),
        };

        let line = cause_chain(&err);
        assert!(line.starts_with("push of tag devel failed: "));
        assert!(line.contains("denied"));
    }

    #[test]
    fn test_cause_chain_skips_repeated_messages() {
        let err = VcsError::Spawn(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "git not found",
        ));

        assert_eq!(cause_chain(&err), "failed to run git: git not found");
    }
}
