//! Command line and environment configuration
//!
//! Every option falls back to the `PLUGIN_*` variable a CI plugin step sets.
//! Credentials and workers are resolved before any registry or engine work.

use crate::error::ConfigError;
use clap::builder::FalseyValueParser;
use clap::{ArgAction, Parser};
use std::path::PathBuf;
use workerflow_build::RegistryCredentials;
use workerflow_core::{ReleaseChannel, Worker, list_workers, named_workers};
use workerflow_registry::RegistryKind;

#[derive(Parser, Debug)]
#[command(name = "workerflow", version)]
#[command(about = "Rebuild and publish worker images whose sources changed", long_about = None)]
pub struct Cli {
    /// Namespace of the images
    #[arg(short = 'n', long, env = "PLUGIN_NAMESPACE")]
    pub namespace: String,

    /// DockerHub-like registry as user:password@hostname
    #[arg(
        long = "registry-dockerhub",
        env = "PLUGIN_REGISTRY_DOCKERHUB",
        value_delimiter = ',',
        value_name = "CREDENTIALS",
        hide_env_values = true
    )]
    pub registry_dockerhub: Vec<String>,

    /// Harbor-like registry as user:password@hostname
    #[arg(
        long = "registry-harbor",
        env = "PLUGIN_REGISTRY_HARBOR",
        value_delimiter = ',',
        value_name = "CREDENTIALS",
        hide_env_values = true
    )]
    pub registry_harbor: Vec<String>,

    /// Push version tags instead of devel
    #[arg(
        short,
        long,
        env = "PLUGIN_STABLE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub stable: bool,

    /// Build every flavor even without changes
    #[arg(
        short,
        long,
        env = "PLUGIN_FORCE",
        action = ArgAction::SetTrue,
        value_parser = FalseyValueParser::new()
    )]
    pub force: bool,

    /// Worker to build (repeatable, default: every worker)
    #[arg(short = 'w', long = "worker", value_name = "NAME")]
    pub workers: Vec<String>,

    /// Directory holding the workers, relative to the base path
    #[arg(long = "path", env = "PLUGIN_WORKER_PATH", default_value = "analyzers")]
    pub worker_path: PathBuf,

    /// Root of the git repository
    #[arg(long, default_value = ".")]
    pub base_path: PathBuf,
}

/// A configured publish target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RegistrySetting {
    pub kind: RegistryKind,
    pub credentials: RegistryCredentials,
}

/// Options the build loop runs with.
#[derive(Debug, Clone)]
pub struct RunOptions {
    pub namespace: String,
    pub base_path: PathBuf,
    pub workers: Vec<Worker>,
    pub channel: ReleaseChannel,
    pub force: bool,
}

/// Validated configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub run: RunOptions,
    pub registries: Vec<RegistrySetting>,
}

impl Cli {
    pub fn into_settings(self) -> Result<Settings, ConfigError> {
        let namespace = self.namespace.trim().to_string();
        if namespace.is_empty() {
            return Err(ConfigError::EmptyNamespace);
        }

        let mut registries = parse_registries(RegistryKind::DockerHub, &self.registry_dockerhub)?;
        registries.extend(parse_registries(RegistryKind::Harbor, &self.registry_harbor)?);

        let workers = if self.workers.is_empty() {
            list_workers(&self.base_path, &self.worker_path)?
        } else {
            named_workers(&self.worker_path, self.workers.as_slice())?
        };

        Ok(Settings {
            run: RunOptions {
                namespace,
                base_path: self.base_path,
                workers,
                channel: ReleaseChannel::from_stable_flag(self.stable),
                force: self.force,
            },
            registries,
        })
    }
}

fn parse_registries(
    kind: RegistryKind,
    inputs: &[String],
) -> Result<Vec<RegistrySetting>, ConfigError> {
    inputs
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(|s| {
            RegistryCredentials::parse(s)
                .map(|credentials| RegistrySetting { kind, credentials })
                .map_err(|source| ConfigError::Registry {
                    kind: kind.to_string(),
                    source,
                })
        })
        .collect()
}
