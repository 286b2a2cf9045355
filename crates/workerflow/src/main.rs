use clap::Parser;
use std::process::ExitCode;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use workerflow::{BuildOrchestrator, Cli, GitCli, docker};
use workerflow_build::{DockerEngine, ImageEngine};
use workerflow_registry::RegistryClient;

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<ExitCode> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries progress and the summary
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let settings = cli.into_settings()?;
    if settings.registries.is_empty() {
        warn!("No registry configured, nothing will be published");
    }
    info!(
        namespace = %settings.run.namespace,
        workers = settings.run.workers.len(),
        registries = settings.registries.len(),
        channel = ?settings.run.channel,
        force = settings.run.force,
        "Starting"
    );

    let docker = docker::init_docker_with_error_handling().await?;
    let engine: Arc<dyn ImageEngine> = Arc::new(DockerEngine::new(docker));

    let clients: Vec<Box<dyn RegistryClient>> = settings
        .registries
        .iter()
        .map(|r| r.kind.connect(r.credentials.clone(), Arc::clone(&engine)))
        .collect();
    let registries: Vec<&dyn RegistryClient> = clients.iter().map(|c| c.as_ref()).collect();

    let git = GitCli::new(&settings.run.base_path);
    let summary = BuildOrchestrator::new(&settings.run, &registries, &git)
        .run()
        .await?;

    summary.print()?;
    Ok(summary.exit_code())
}
