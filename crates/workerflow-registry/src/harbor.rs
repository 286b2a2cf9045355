//! Harbor-like registry
//!
//! Reads the last build commit and the tag digest from Harbor's REST API
//! using basic auth. Pushed references are qualified with the registry
//! hostname.

use crate::base::{RegistryBase, USER_AGENT};
use crate::client::{BuildRequest, RegistryClient};
use crate::error::{RegistryError, Result};
use crate::manifest;
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT as USER_AGENT_HEADER};
use std::sync::Arc;
use workerflow_build::{ImageEngine, RegistryCredentials};
use workerflow_core::CommitRef;

pub struct HarborRegistry {
    base: RegistryBase,
}

impl HarborRegistry {
    pub fn new(credentials: RegistryCredentials, engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            base: RegistryBase::new("harbor", credentials, engine, false),
        }
    }

    /// Query a different API endpoint than `https://{host}`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base.set_base_url(base_url);
        self
    }

    fn tag_url(&self, namespace: &str, repo: &str, tag: &str) -> String {
        self.base
            .url(&format!("/api/repositories/{}/{}/tags/{}", namespace, repo, tag))
    }

    async fn get_json(&self, url: &str) -> Result<Option<String>> {
        let response = self
            .base
            .http
            .get(url)
            .header(ACCEPT, "application/json")
            .header(USER_AGENT_HEADER, USER_AGENT)
            .basic_auth(
                &self.base.credentials.username,
                Some(&self.base.credentials.password),
            )
            .send()
            .await?;

        match response.status() {
            status if status.is_success() => Ok(Some(response.text().await?)),
            StatusCode::NOT_FOUND => Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => Err(RegistryError::AuthFailed {
                registry: self.base.name.clone(),
                message: format!("{} returned {}", url, response.status()),
            }),
            status => Err(RegistryError::Status {
                url: url.to_string(),
                status: status.as_u16(),
            }),
        }
    }

    async fn fetch_last_commit(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<CommitRef>> {
        let url = format!("{}/manifest", self.tag_url(namespace, repo, tag));
        match self.get_json(&url).await? {
            Some(body) => manifest::commit_from_harbor_manifest(&body),
            None => Ok(None),
        }
    }

    async fn remote_digest(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<String>> {
        let url = self.tag_url(namespace, repo, tag);
        match self.get_json(&url).await? {
            Some(body) => manifest::digest_from_harbor_tag(&body),
            None => Ok(None),
        }
    }
}

#[async_trait]
impl RegistryClient for HarborRegistry {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn host(&self) -> &str {
        &self.base.credentials.registry
    }

    fn is_default_registry(&self) -> bool {
        false
    }

    async fn last_build_commit(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Option<CommitRef> {
        let lookup = self.fetch_last_commit(namespace, repo, tag).await;
        self.base.last_commit_or_none(repo, tag, lookup)
    }

    async fn build_image(&self, request: &BuildRequest<'_>) -> Result<String> {
        self.base.build(request).await
    }

    async fn push_image(
        &self,
        image: &str,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<String> {
        self.base.push(image, namespace, repo, tag).await
    }

    async fn correctly_pushed(&self, namespace: &str, repo: &str, tag: &str) -> bool {
        let remote = self.remote_digest(namespace, repo, tag).await;
        self.base.verify(namespace, repo, tag, remote).await
    }
}
