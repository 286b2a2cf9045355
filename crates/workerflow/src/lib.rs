//! workerflow
//!
//! Rebuilds and publishes the container images of a monorepo's workers when
//! their sources change. A worker is a directory holding one or more flavor
//! descriptors; every flavor is published to every configured registry.
//!
//! - [`change`]: git-based staleness check
//! - [`orchestrator`]: the worker × registry × flavor build loop
//! - [`summary`]: the end-of-run report and exit status
//! - [`config`]: command line and `PLUGIN_*` environment settings

pub mod change;
pub mod config;
pub mod docker;
pub mod error;
pub mod orchestrator;
pub mod summary;

pub use change::{ChangeDetector, ChangedPath, GitCli, SourceControl, Staleness};
pub use config::{Cli, RegistrySetting, RunOptions, Settings};
pub use error::{ConfigError, PublishError, VcsError};
pub use orchestrator::BuildOrchestrator;
pub use summary::{Outcome, Summary};
