//! Registry response parsing
//!
//! Both variants end up at the same place: an image config JSON whose
//! `config.Labels` carries the commit stamped at build time. They only differ
//! in how that config is wrapped.

use crate::error::{RegistryError, Result};
use serde::Deserialize;
use std::collections::HashMap;
use workerflow_build::labels::VCS_REF_LABEL;
use workerflow_core::CommitRef;

#[derive(Deserialize)]
struct ImageConfig {
    #[serde(default)]
    config: Option<ContainerConfig>,
}

#[derive(Deserialize)]
struct ContainerConfig {
    #[serde(rename = "Labels", default)]
    labels: Option<HashMap<String, String>>,
}

#[derive(Deserialize)]
struct SchemaV1Manifest {
    #[serde(default)]
    history: Vec<V1History>,
}

#[derive(Deserialize)]
struct V1History {
    #[serde(rename = "v1Compatibility")]
    v1_compatibility: String,
}

#[derive(Deserialize)]
struct HarborManifest {
    config: Option<String>,
}

#[derive(Deserialize)]
struct HarborTag {
    digest: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    token: Option<String>,
    access_token: Option<String>,
}

/// Commit label from an image config document.
pub fn commit_from_image_config(config: &str) -> Result<Option<CommitRef>> {
    let image: ImageConfig = serde_json::from_str(config)?;
    Ok(image
        .config
        .and_then(|c| c.labels)
        .and_then(|mut labels| labels.remove(VCS_REF_LABEL))
        .map(CommitRef::new)
        .filter(|commit| !commit.as_str().is_empty()))
}

/// Commit label from a schema 1 manifest (`history[0].v1Compatibility`).
pub fn commit_from_v1_manifest(body: &str) -> Result<Option<CommitRef>> {
    let manifest: SchemaV1Manifest = serde_json::from_str(body)?;
    let first = manifest
        .history
        .first()
        .ok_or_else(|| RegistryError::Malformed("manifest has no history".to_string()))?;
    commit_from_image_config(&first.v1_compatibility)
}

/// Commit label from a Harbor tag manifest response, whose `config` field is
/// the image config serialized as a string.
pub fn commit_from_harbor_manifest(body: &str) -> Result<Option<CommitRef>> {
    let manifest: HarborManifest = serde_json::from_str(body)?;
    let config = manifest
        .config
        .ok_or_else(|| RegistryError::Malformed("manifest has no config".to_string()))?;
    commit_from_image_config(&config)
}

/// Digest from a Harbor tag detail response.
pub fn digest_from_harbor_tag(body: &str) -> Result<Option<String>> {
    let tag: HarborTag = serde_json::from_str(body)?;
    Ok(tag.digest.filter(|d| !d.is_empty()))
}

/// Bearer token from a token service response.
pub fn token_from_response(body: &str) -> Result<String> {
    let response: TokenResponse = serde_json::from_str(body)?;
    response
        .token
        .or(response.access_token)
        .filter(|t| !t.is_empty())
        .ok_or_else(|| RegistryError::Malformed("token response has no token".to_string()))
}

/// A `WWW-Authenticate: Bearer ...` challenge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BearerChallenge {
    pub realm: String,
    pub service: Option<String>,
    pub scope: Option<String>,
}

impl BearerChallenge {
    /// Parse a challenge header. Returns `None` for non-bearer schemes or a
    /// challenge without a realm.
    pub fn parse(header: &str) -> Option<Self> {
        let (scheme, params) = header.trim().split_once(' ')?;
        if !scheme.eq_ignore_ascii_case("bearer") {
            return None;
        }

        let mut realm = None;
        let mut service = None;
        let mut scope = None;
        for (key, value) in challenge_params(params) {
            match key.to_ascii_lowercase().as_str() {
                "realm" => realm = Some(value),
                "service" => service = Some(value),
                "scope" => scope = Some(value),
                _ => {}
            }
        }

        Some(Self {
            realm: realm?,
            service,
            scope,
        })
    }
}

/// Split `key="value",key=value` pairs; commas inside quotes are kept.
fn challenge_params(params: &str) -> Vec<(String, String)> {
    let mut pairs = Vec::new();
    let mut rest = params.trim();

    while !rest.is_empty() {
        let Some((key, after)) = rest.split_once('=') else {
            break;
        };
        let key = key.trim().trim_start_matches(',').trim().to_string();

        let (value, remaining) = if let Some(quoted) = after.strip_prefix('"') {
            match quoted.find('"') {
                Some(end) => (quoted[..end].to_string(), &quoted[end + 1..]),
                None => (quoted.to_string(), ""),
            }
        } else {
            match after.find(',') {
                Some(end) => (after[..end].trim().to_string(), &after[end..]),
                None => (after.trim().to_string(), ""),
            }
        };

        pairs.push((key, value));
        rest = remaining.trim_start().trim_start_matches(',').trim_start();
    }

    pairs
}

#[cfg(test)]
mod tests {
    use super::*;

    const CONFIG: &str = r#"{"architecture":"amd64","config":{"Labels":{"org.label-schema.vcs-ref":"abc123","org.label-schema.name":"whois"}}}"#;

    #[test]
    fn test_commit_from_image_config() {
        let commit = commit_from_image_config(CONFIG).unwrap();
        assert_eq!(commit, Some(CommitRef::new("abc123")));
    }

    #[test]
    fn test_commit_from_image_config_without_label() {
        let config = r#"{"config":{"Labels":{"org.label-schema.name":"whois"}}}"#;
        assert_eq!(commit_from_image_config(config).unwrap(), None);

        let config = r#"{"config":{"Labels":null}}"#;
        assert_eq!(commit_from_image_config(config).unwrap(), None);
    }

    #[test]
    fn test_commit_from_v1_manifest() {
        let body = serde_json::json!({
            "schemaVersion": 1,
            "history": [
                { "v1Compatibility": CONFIG },
                { "v1Compatibility": "{}" }
            ]
        })
        .to_string();

        assert_eq!(
            commit_from_v1_manifest(&body).unwrap(),
            Some(CommitRef::new("abc123"))
        );
    }

    #[test]
    fn test_v1_manifest_without_history_is_malformed() {
        let err = commit_from_v1_manifest(r#"{"schemaVersion":1}"#).unwrap_err();
        assert!(matches!(err, RegistryError::Malformed(_)));
    }

    #[test]
    fn test_commit_from_harbor_manifest() {
        let body = serde_json::json!({
            "manifest": { "schemaVersion": 2 },
            "config": CONFIG
        })
        .to_string();

        assert_eq!(
            commit_from_harbor_manifest(&body).unwrap(),
            Some(CommitRef::new("abc123"))
        );
    }

    #[test]
    fn test_garbage_is_an_error() {
        assert!(commit_from_harbor_manifest("<html>").is_err());
        assert!(commit_from_v1_manifest("not json").is_err());
    }

    #[test]
    fn test_digest_from_harbor_tag() {
        let body = r#"{"name":"devel","digest":"sha256:feed"}"#;
        assert_eq!(
            digest_from_harbor_tag(body).unwrap(),
            Some("sha256:feed".to_string())
        );
        assert_eq!(digest_from_harbor_tag(r#"{"name":"devel"}"#).unwrap(), None);
    }

    #[test]
    fn test_token_from_response() {
        assert_eq!(token_from_response(r#"{"token":"t1"}"#).unwrap(), "t1");
        assert_eq!(
            token_from_response(r#"{"access_token":"t2"}"#).unwrap(),
            "t2"
        );
        assert!(token_from_response("{}").is_err());
    }

    #[test]
    fn test_bearer_challenge() {
        let header = r#"Bearer realm="https://auth.docker.io/token",service="registry.docker.io",scope="repository:acme/whois:pull,push""#;
        let challenge = BearerChallenge::parse(header).unwrap();

        assert_eq!(challenge.realm, "https://auth.docker.io/token");
        assert_eq!(challenge.service.as_deref(), Some("registry.docker.io"));
        assert_eq!(
            challenge.scope.as_deref(),
            Some("repository:acme/whois:pull,push")
        );
    }

    #[test]
    fn test_non_bearer_challenge() {
        assert!(BearerChallenge::parse(r#"Basic realm="harbor""#).is_none());
        assert!(BearerChallenge::parse(r#"Bearer service="x""#).is_none());
    }
}
