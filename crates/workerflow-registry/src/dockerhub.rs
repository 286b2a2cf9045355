//! DockerHub-like registry
//!
//! Talks the Docker Registry HTTP API v2. The last build commit is read from
//! the schema 1 manifest history and the remote digest from the
//! `Docker-Content-Digest` header. Token auth follows the `WWW-Authenticate`
//! bearer challenge, retrying the request once with the issued token.

use crate::base::{RegistryBase, USER_AGENT};
use crate::client::{BuildRequest, RegistryClient};
use crate::error::{RegistryError, Result};
use crate::manifest::{self, BearerChallenge};
use async_trait::async_trait;
use reqwest::StatusCode;
use reqwest::header::{ACCEPT, USER_AGENT as USER_AGENT_HEADER, WWW_AUTHENTICATE};
use std::sync::Arc;
use tracing::debug;
use workerflow_build::{ImageEngine, RegistryCredentials};
use workerflow_core::CommitRef;

const MANIFEST_V1: &str = "application/vnd.docker.distribution.manifest.v1+json";
const MANIFEST_V2: &str = "application/vnd.docker.distribution.manifest.v2+json, \
     application/vnd.docker.distribution.manifest.list.v2+json, \
     application/vnd.oci.image.manifest.v1+json, \
     application/vnd.oci.image.index.v1+json";
const DIGEST_HEADER: &str = "Docker-Content-Digest";

pub struct DockerHubRegistry {
    base: RegistryBase,
}

impl DockerHubRegistry {
    pub fn new(credentials: RegistryCredentials, engine: Arc<dyn ImageEngine>) -> Self {
        Self {
            base: RegistryBase::new("dockerhub", credentials, engine, true),
        }
    }

    /// Query a different API endpoint than `https://{host}`.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base.set_base_url(base_url);
        self
    }

    fn manifest_url(&self, namespace: &str, repo: &str, tag: &str) -> String {
        self.base
            .url(&format!("/v2/{}/{}/manifests/{}", namespace, repo, tag))
    }

    /// GET `url`, answering one auth challenge if the registry issues one.
    async fn get(&self, url: &str, accept: &str) -> Result<Option<reqwest::Response>> {
        let request = || {
            self.base
                .http
                .get(url)
                .header(ACCEPT, accept)
                .header(USER_AGENT_HEADER, USER_AGENT)
        };

        let response = request().send().await?;
        let response = if response.status() == StatusCode::UNAUTHORIZED {
            let challenge = response
                .headers()
                .get(WWW_AUTHENTICATE)
                .and_then(|v| v.to_str().ok())
                .and_then(BearerChallenge::parse);

            match challenge {
                Some(challenge) => {
                    let token = self.fetch_token(&challenge).await?;
                    request().bearer_auth(token).send().await?
                }
                None => {
                    request()
                        .basic_auth(
                            &self.base.credentials.username,
                            Some(&self.base.credentials.password),
                        )
                        .send()
                        .await?
                }
            }
        } else {
            response
        };

        match response.status() {
            status if status.is_success() => Ok(Some(response)),
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

    async fn fetch_token(&self, challenge: &BearerChallenge) -> Result<String> {
        debug!(realm = %challenge.realm, "Requesting registry token");

        let mut query = Vec::new();
        if let Some(service) = &challenge.service {
            query.push(("service", service.as_str()));
        }
        if let Some(scope) = &challenge.scope {
            query.push(("scope", scope.as_str()));
        }

        let response = self
            .base
            .http
            .get(&challenge.realm)
            .query(&query)
            .header(USER_AGENT_HEADER, USER_AGENT)
            .basic_auth(
                &self.base.credentials.username,
                Some(&self.base.credentials.password),
            )
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(RegistryError::AuthFailed {
                registry: self.base.name.clone(),
                message: format!("token service returned {}", response.status()),
            });
        }

        manifest::token_from_response(&response.text().await?)
    }

    async fn fetch_last_commit(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<CommitRef>> {
        let url = self.manifest_url(namespace, repo, tag);
        let Some(response) = self.get(&url, MANIFEST_V1).await? else {
            return Ok(None);
        };
        manifest::commit_from_v1_manifest(&response.text().await?)
    }

    async fn remote_digest(
        &self,
        namespace: &str,
        repo: &str,
        tag: &str,
    ) -> Result<Option<String>> {
        let url = self.manifest_url(namespace, repo, tag);
        let Some(response) = self.get(&url, MANIFEST_V2).await? else {
            return Ok(None);
        };
        Ok(response
            .headers()
            .get(DIGEST_HEADER)
            .and_then(|v| v.to_str().ok())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty()))
    }
}

#[async_trait]
impl RegistryClient for DockerHubRegistry {
    fn name(&self) -> &str {
        &self.base.name
    }

    fn host(&self) -> &str {
        &self.base.credentials.registry
    }

    fn is_default_registry(&self) -> bool {
        true
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
