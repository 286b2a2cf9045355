use colored::Colorize;

fn print_connection_help(cause: &bollard::errors::Error) {
    eprintln!();
    eprintln!("{}", "✗ Docker connection error".red().bold());
    eprintln!();
    eprintln!("{}", "Cause:".yellow());
    eprintln!("  {}", cause);
    eprintln!();
    eprintln!("{}", "How to fix:".yellow());
    eprintln!("  • Check that the Docker daemon is running");
    eprintln!("  • Check that DOCKER_HOST points at a reachable daemon");
    eprintln!("  • Check that `docker ps` works for the CI user");
}

/// Connect to the local Docker daemon and make sure it answers.
pub async fn init_docker_with_error_handling() -> anyhow::Result<bollard::Docker> {
    let docker = match bollard::Docker::connect_with_local_defaults() {
        Ok(docker) => docker,
        Err(e) => {
            print_connection_help(&e);
            return Err(anyhow::anyhow!("failed to connect to Docker"));
        }
    };

    match docker.ping().await {
        Ok(_) => Ok(docker),
        Err(e) => {
            print_connection_help(&e);
            Err(anyhow::anyhow!("failed to connect to Docker"))
        }
    }
}
