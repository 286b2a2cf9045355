//! Build orchestration
//!
//! For each worker and each registry: read the worker's flavors, decide
//! which are stale, build the worker image at most once per run, push the
//! channel tags and verify the push. Every (flavor, registry) pair ends in
//! exactly one summary bucket; a failure in one pair never stops the others.

use crate::change::{ChangeDetector, SourceControl, Staleness};
use crate::config::RunOptions;
use crate::error::{PublishError, VcsError, cause_chain};
use crate::summary::{Outcome, Summary};
use colored::Colorize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, error, info, warn};
use workerflow_core::{CommitRef, Flavor, FlavorSource, Worker};
use workerflow_registry::{BuildRequest, RegistryClient};

/// Per-run build memo, keyed by worker name.
#[derive(Debug, Clone, PartialEq, Eq)]
enum BuildState {
    /// Local image reference
    Built(String),
    /// Rendered cause
    Failed(String),
}

pub struct BuildOrchestrator<'a> {
    options: &'a RunOptions,
    registries: &'a [&'a dyn RegistryClient],
    detector: ChangeDetector<'a>,
    builds: HashMap<String, BuildState>,
    summary: Summary,
}

impl<'a> BuildOrchestrator<'a> {
    pub fn new(
        options: &'a RunOptions,
        registries: &'a [&'a dyn RegistryClient],
        source: &'a dyn SourceControl,
    ) -> Self {
        Self {
            options,
            registries,
            detector: ChangeDetector::new(source),
            builds: HashMap::new(),
            summary: Summary::new(),
        }
    }

    /// Process every worker against every registry.
    ///
    /// Only a failure to read HEAD aborts the run; everything else is
    /// recorded in the returned summary.
    pub async fn run(mut self) -> Result<Summary, VcsError> {
        let head = self.detector.head_commit().await?;
        info!(commit = %head, "Building from HEAD");

        let options = self.options;
        let registries = self.registries;

        for worker in &options.workers {
            for &registry in registries {
                self.process(worker, registry, &head).await;
            }
        }

        Ok(self.summary)
    }

    async fn process(
        &mut self,
        worker: &Worker,
        registry: &dyn RegistryClient,
        head: &CommitRef,
    ) {
        let source = FlavorSource::new(self.options.base_path.join(worker.path()));
        let flavors = match source.flavors() {
            Ok(flavors) => flavors,
            Err(e) => {
                error!(
                    worker = %worker.name(),
                    registry = %registry.name(),
                    error = %e,
                    "Failed to list flavors"
                );
                self.summary.record(
                    label(worker.name(), registry),
                    Outcome::Failed(cause_chain(&e)),
                );
                return;
            }
        };

        let mut to_build = Vec::new();
        for (path, parsed) in flavors {
            let flavor = match parsed {
                Ok(flavor) => flavor,
                Err(e) => {
                    let err = PublishError::Descriptor(e);
                    error!(
                        descriptor = %path.display(),
                        registry = %registry.name(),
                        error = %cause_chain(&err),
                        "Invalid flavor descriptor"
                    );
                    self.summary.record(
                        label(&descriptor_name(&path), registry),
                        Outcome::Failed(cause_chain(&err)),
                    );
                    continue;
                }
            };

            if self.is_stale(worker, registry, &flavor, head).await {
                to_build.push(flavor);
            } else {
                self.summary
                    .record(label(&flavor.name, registry), Outcome::Skipped);
            }
        }

        for flavor in to_build {
            println!(
                "{} {} ({})",
                "→".blue(),
                flavor.name.cyan(),
                registry.name()
            );

            let outcome = match self.publish(worker, registry, &flavor, head).await {
                Ok(()) => Outcome::Succeeded,
                Err(e) => {
                    let cause = cause_chain(&e);
                    error!(
                        flavor = %flavor.name,
                        registry = %registry.name(),
                        error = %cause,
                        "Publish failed"
                    );
                    Outcome::Failed(cause)
                }
            };
            self.summary.record(label(&flavor.name, registry), outcome);
        }
    }

    async fn is_stale(
        &self,
        worker: &Worker,
        registry: &dyn RegistryClient,
        flavor: &Flavor,
        head: &CommitRef,
    ) -> bool {
        let repo = flavor.repo();
        if self.options.force {
            debug!(repo = %repo, registry = %registry.name(), "Forced rebuild");
            return true;
        }

        let tag = self.options.channel.primary_tag(flavor);
        let last = registry
            .last_build_commit(&self.options.namespace, &repo, &tag)
            .await;
        let staleness = self.detector.staleness(worker, last.as_ref(), head).await;

        match &staleness {
            Staleness::NoPriorBuild => {
                info!(
                    repo = %repo,
                    registry = %registry.name(),
                    "No previous image found, building"
                );
            }
            Staleness::Changed(path) => {
                info!(
                    repo = %repo,
                    registry = %registry.name(),
                    last = ?last,
                    changed = %path.display(),
                    "Change detected, rebuilding"
                );
            }
            Staleness::Unchanged => {
                info!(
                    repo = %repo,
                    registry = %registry.name(),
                    last = ?last,
                    "No change detected"
                );
            }
            Staleness::DiffFailed(reason) => {
                warn!(
                    repo = %repo,
                    registry = %registry.name(),
                    last = ?last,
                    error = %reason,
                    "Change check failed, rebuilding"
                );
            }
        }

        staleness.is_stale()
    }

    async fn publish(
        &mut self,
        worker: &Worker,
        registry: &dyn RegistryClient,
        flavor: &Flavor,
        head: &CommitRef,
    ) -> Result<(), PublishError> {
        let image = self.ensure_built(worker, registry, flavor, head).await?;
        let namespace = &self.options.namespace;
        let repo = flavor.repo();

        for tag in self.options.channel.publish_tags(flavor) {
            registry
                .push_image(&image, namespace, &repo, &tag)
                .await
                .map_err(|source| PublishError::Push { tag, source })?;
        }

        let tag = self.options.channel.primary_tag(flavor);
        if !registry.correctly_pushed(namespace, &repo, &tag).await {
            warn!(
                image = %format!("{}/{}:{}", namespace, repo, tag),
                registry = %registry.name(),
                "Digest check failed; the push itself succeeded and registry data may lag"
            );
        }

        Ok(())
    }

    /// Build the worker image unless this run already built it or failed to.
    async fn ensure_built(
        &mut self,
        worker: &Worker,
        registry: &dyn RegistryClient,
        flavor: &Flavor,
        head: &CommitRef,
    ) -> Result<String, PublishError> {
        match self.builds.get(worker.name()) {
            Some(BuildState::Built(image)) => {
                debug!(
                    worker = %worker.name(),
                    image = %image,
                    "Reusing image built earlier in this run"
                );
                return Ok(image.clone());
            }
            Some(BuildState::Failed(cause)) => {
                return Err(PublishError::PriorBuildFailed {
                    worker: worker.name().to_string(),
                    cause: cause.clone(),
                });
            }
            None => {}
        }

        let request = BuildRequest {
            namespace: &self.options.namespace,
            base_path: &self.options.base_path,
            worker,
            flavor,
            commit: head,
        };

        match registry.build_image(&request).await {
            Ok(image) => {
                self.builds
                    .insert(worker.name().to_string(), BuildState::Built(image.clone()));
                Ok(image)
            }
            Err(e) => {
                let err = PublishError::Build(e);
                self.builds
                    .insert(worker.name().to_string(), BuildState::Failed(cause_chain(&err)));
                Err(err)
            }
        }
    }
}

fn label(name: &str, registry: &dyn RegistryClient) -> String {
    format!("{} ({})", name, registry.name())
}

fn descriptor_name(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}
