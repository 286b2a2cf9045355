use crate::error::{BuildError, Result};
use crate::labels;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use workerflow_core::{CommitRef, Flavor, Worker};

const DOCKERFILE: &str = "Dockerfile";

/// Everything the engine needs to build one worker image.
///
/// Only the labels depend on a flavor; the build itself is shared by every
/// flavor of the worker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuildSpec {
    /// Local image reference, e.g. `cortexneurons/dns-lookup:0123456`.
    pub image: String,
    pub context_dir: PathBuf,
    /// Dockerfile name relative to `context_dir`.
    pub dockerfile: String,
    pub labels: BTreeMap<String, String>,
}

pub struct BuildResolver {
    base_path: PathBuf,
}

impl BuildResolver {
    pub fn new(base_path: PathBuf) -> Self {
        Self { base_path }
    }

    /// Resolve the Dockerfile of a worker: always `{worker}/Dockerfile`.
    ///
    /// `Dockerfile.*` variants are never built; each one found is reported
    /// with a warning.
    pub fn resolve_dockerfile(&self, worker: &Worker) -> Result<String> {
        let context = self.base_path.join(worker.path());
        if !context.join(DOCKERFILE).is_file() {
            return Err(BuildError::DockerfileNotFound(context));
        }

        for ignored in dockerfile_variants(&context)? {
            tracing::warn!(
                worker = worker.name(),
                dockerfile = %ignored,
                "Ignoring Dockerfile variant; all flavors build from {}",
                DOCKERFILE
            );
        }

        Ok(DOCKERFILE.to_string())
    }

    /// The worker directory is the build context.
    pub fn resolve_context(&self, worker: &Worker) -> Result<PathBuf> {
        let context = self.base_path.join(worker.path());

        if !context.exists() {
            return Err(BuildError::ContextNotFound(context));
        }

        if !context.is_dir() {
            return Err(BuildError::InvalidConfig(format!(
                "Build context is not a directory: {}",
                context.display()
            )));
        }

        Ok(context)
    }

    /// Local tag of a worker image: `{namespace}/{worker}:{short commit}`.
    ///
    /// One image per worker per run; pushes retag it per flavor.
    pub fn local_image(&self, namespace: &str, worker: &Worker, commit: &CommitRef) -> String {
        format!(
            "{}/{}:{}",
            namespace,
            worker.name().to_lowercase(),
            commit.short()
        )
    }

    /// Resolve a complete [`BuildSpec`].
    pub fn plan(
        &self,
        namespace: &str,
        worker: &Worker,
        flavor: &Flavor,
        commit: &CommitRef,
        build_date: DateTime<Utc>,
    ) -> Result<BuildSpec> {
        let context_dir = self.resolve_context(worker)?;
        let dockerfile = self.resolve_dockerfile(worker)?;

        Ok(BuildSpec {
            image: self.local_image(namespace, worker, commit),
            context_dir,
            dockerfile,
            labels: labels::image_labels(worker.name(), flavor, commit, build_date),
        })
    }
}

/// `Dockerfile.*` names in `context`, sorted.
fn dockerfile_variants(context: &Path) -> Result<Vec<String>> {
    let mut variants = Vec::new();
    for entry in fs::read_dir(context)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().into_owned();
        if name.starts_with("Dockerfile.") && entry.path().is_file() {
            variants.push(name);
        }
    }
    variants.sort();
    Ok(variants)
}
