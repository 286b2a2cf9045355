//! Container engine abstraction
//!
//! Registries drive builds and pushes through [`ImageEngine`] so that the
//! publish logic can run against a fake engine in tests.

use crate::builder::ImageBuilder;
use crate::error::BuildResult;
use crate::pusher::ImagePusher;
use crate::resolver::BuildSpec;
use async_trait::async_trait;
use bollard::Docker;
use bollard::auth::DockerCredentials;

/// Build, tag, push and inspect images.
#[async_trait]
pub trait ImageEngine: Send + Sync {
    /// Build `spec.image` from its context.
    async fn build(&self, spec: &BuildSpec) -> BuildResult<()>;

    /// Tag the local image `source` as `repo:tag`.
    async fn tag(&self, source: &str, repo: &str, tag: &str) -> BuildResult<()>;

    /// Upload `repo:tag`.
    async fn push(
        &self,
        repo: &str,
        tag: &str,
        credentials: Option<DockerCredentials>,
    ) -> BuildResult<()>;

    /// Digest recorded locally for the pushed `repo:tag`.
    async fn local_digest(&self, repo: &str, tag: &str) -> BuildResult<Option<String>>;
}

/// [`ImageEngine`] backed by the Docker daemon.
pub struct DockerEngine {
    builder: ImageBuilder,
    pusher: ImagePusher,
}

impl DockerEngine {
    pub fn new(docker: Docker) -> Self {
        Self {
            builder: ImageBuilder::new(docker.clone()),
            pusher: ImagePusher::new(docker),
        }
    }
}

#[async_trait]
impl ImageEngine for DockerEngine {
    async fn build(&self, spec: &BuildSpec) -> BuildResult<()> {
        self.builder.build_image(spec).await
    }

    async fn tag(&self, source: &str, repo: &str, tag: &str) -> BuildResult<()> {
        self.pusher.tag(source, repo, tag).await
    }

    async fn push(
        &self,
        repo: &str,
        tag: &str,
        credentials: Option<DockerCredentials>,
    ) -> BuildResult<()> {
        self.pusher.push(repo, tag, credentials).await.map(|_| ())
    }

    async fn local_digest(&self, repo: &str, tag: &str) -> BuildResult<Option<String>> {
        self.pusher.local_digest(repo, tag).await
    }
}
