//! Behaviour shared by every registry variant
//!
//! Builds, pushes and the local half of digest verification go through the
//! [`ImageEngine`]; only the registry queries differ between variants.

use crate::client::BuildRequest;
use crate::error::Result;
use chrono::Utc;
use workerflow_core::CommitRef;
use std::sync::Arc;
use tracing::{debug, info, warn};
use workerflow_build::{BuildResolver, ImageEngine, RegistryCredentials, validate_tag};

pub(crate) const USER_AGENT: &str = concat!("workerflow/", env!("CARGO_PKG_VERSION"));

pub(crate) struct RegistryBase {
    pub(crate) name: String,
    pub(crate) credentials: RegistryCredentials,
    pub(crate) engine: Arc<dyn ImageEngine>,
    pub(crate) http: reqwest::Client,
    pub(crate) base_url: String,
    pub(crate) default_registry: bool,
}

impl RegistryBase {
    pub(crate) fn new(
        kind: &str,
        credentials: RegistryCredentials,
        engine: Arc<dyn ImageEngine>,
        default_registry: bool,
    ) -> Self {
        Self {
            name: format!("{}@{}", kind, credentials.registry),
            base_url: format!("https://{}", credentials.registry),
            credentials,
            engine,
            http: reqwest::Client::new(),
            default_registry,
        }
    }

    pub(crate) fn set_base_url(&mut self, base_url: impl Into<String>) {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
    }

    /// Repository reference the engine tags and pushes.
    pub(crate) fn qualified_repo(&self, namespace: &str, repo: &str) -> String {
        if self.default_registry {
            format!("{}/{}", namespace, repo)
        } else {
            format!("{}/{}/{}", self.credentials.registry, namespace, repo)
        }
    }

    pub(crate) async fn build(&self, request: &BuildRequest<'_>) -> Result<String> {
        let resolver = BuildResolver::new(request.base_path.to_path_buf());
        let spec = resolver.plan(
            request.namespace,
            request.worker,
            request.flavor,
            request.commit,
            Utc::now(),
        )?;

        info!(
            registry = %self.name,
            worker = %request.worker.name(),
            image = %spec.image,
            "Building image"
        );
        self.engine.build(&spec).await?;
        Ok(spec.image)
    }

    pub(crate) async fn push(
        &self,
        image: &str,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<String> {
        validate_tag(tag)?;
        let target = self.qualified_repo(namespace, repo);

        self.engine.tag(image, &target, tag).await?;
        self.engine
            .push(&target, tag, Some(self.credentials.docker_credentials()))
            .await?;

        let pushed = format!("{}:{}", target, tag);
        info!(registry = %self.name, image = %pushed, "Pushed");
        Ok(pushed)
    }

    /// Collapse a failed last-build lookup into "no prior build".
    pub(crate) fn last_commit_or_none(
        &self,
        repo: &str,
        tag: &str,
        lookup: Result<Option<CommitRef>>,
    ) -> Option<CommitRef> {
        match lookup {
            Ok(commit) => {
                debug!(
                    registry = %self.name,
                    repo = %repo,
                    tag = %tag,
                    commit = ?commit,
                    "Last build commit"
                );
                commit
            }
            Err(e) => {
                warn!(
                    registry = %self.name,
                    repo = %repo,
                    tag = %tag,
                    error = %e,
                    "Last build lookup failed"
                );
                None
            }
        }
    }

    /// Compare the local digest with what the registry reported.
    ///
    /// A failed remote lookup counts as "no remote digest".
    pub(crate) async fn verify(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
        remote: Result<Option<String>>,
    ) -> bool {
        let target = self.qualified_repo(namespace, repo);
        let image = format!("{}:{}", target, tag);

        let remote = match remote {
            Ok(Some(remote)) => remote,
            Ok(None) => {
                debug!(
                    registry = %self.name,
                    image = %image,
                    "No remote digest; assuming push landed"
                );
                return true;
            }
            Err(e) => {
                warn!(
                    registry = %self.name,
                    image = %image,
                    error = %e,
                    "Remote digest lookup failed; assuming push landed"
                );
                return true;
            }
        };

        let local = match self.engine.local_digest(&target, tag).await {
            Ok(Some(digest)) => digest,
            Ok(None) => {
                warn!(
                    registry = %self.name,
                    image = %image,
                    "No local digest recorded for pushed image"
                );
                return false;
            }
            Err(e) => {
                warn!(
                    registry = %self.name,
                    image = %image,
                    error = %e,
                    "Failed to inspect pushed image"
                );
                return false;
            }
        };

        if local == remote {
            debug!(registry = %self.name, digest = %local, "Push verified");
            true
        } else {
            warn!(
                registry = %self.name,
                image = %image,
                local = %local,
                remote = %remote,
                "Pushed image digest differs from registry"
            );
            false
        }
    }

    pub(crate) fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}
