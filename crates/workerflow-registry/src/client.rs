//! Registry client trait definition

use crate::error::Result;
use async_trait::async_trait;
use std::path::Path;
use workerflow_core::{CommitRef, Flavor, Worker};

/// Everything needed to build one worker image.
#[derive(Debug, Clone, Copy)]
pub struct BuildRequest<'a> {
    pub namespace: &'a str,
    pub base_path: &'a Path,
    pub worker: &'a Worker,
    pub flavor: &'a Flavor,
    pub commit: &'a CommitRef,
}

/// Registry abstraction trait
///
/// Every publish target (DockerHub-like, Harbor-like) implements this trait
/// so the orchestrator never depends on a concrete registry.
#[async_trait]
pub trait RegistryClient: Send + Sync {
    /// Display name used in logs and the run summary (e.g. "harbor@registry.example.com")
    fn name(&self) -> &str;

    /// Hostname of the registry
    fn host(&self) -> &str;

    /// Whether image references for this registry omit the hostname
    fn is_default_registry(&self) -> bool;

    /// Commit stamped on the published `namespace/repo:tag`.
    ///
    /// Every lookup failure collapses to `None`, which the caller treats
    /// the same as "never built".
    async fn last_build_commit(&self, namespace: &str, repo: &str, tag: &str)
    -> Option<CommitRef>;

    /// Build the worker image and return its local reference.
    async fn build_image(&self, request: &BuildRequest<'_>) -> Result<String>;

    /// Tag `image` as `namespace/repo:tag` (host-qualified where required)
    /// and upload it. Returns the pushed reference.
    async fn push_image(&self, image: &str, namespace: &str, repo: &str, tag: &str)
    -> Result<String>;

    /// Compare the local digest of a pushed tag against the registry's.
    ///
    /// A registry that reports no digest is assumed correct. A mismatch is
    /// logged and reported as `false`; it never fails the push.
    async fn correctly_pushed(&self, namespace: &str, repo: &str, tag: &str) -> bool;
}
