//! Image tagging and push
//!
//! Retags the local worker image under its publish name and uploads it.

use crate::error::{BuildError, BuildResult};
use bollard::Docker;
use bollard::auth::DockerCredentials;
use bollard::models::PushImageInfo;
use futures_util::StreamExt;

/// Longest tag accepted by registries.
const MAX_TAG_LEN: usize = 128;

pub struct ImagePusher {
    docker: Docker,
}

impl ImagePusher {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Tag `source` as `repo:tag`.
    pub async fn tag(&self, source: &str, repo: &str, tag: &str) -> BuildResult<()> {
        validate_tag(tag)?;

        #[allow(deprecated)]
        let options = bollard::image::TagImageOptions::<String> {
            repo: repo.to_string(),
            tag: tag.to_string(),
        };

        tracing::debug!(source, repo, tag, "Tagging image");
        self.docker
            .tag_image(source, Some(options))
            .await
            .map_err(|e| BuildError::PushFailed {
                message: format!("failed to tag {} as {}:{}: {}", source, repo, tag, e),
            })
    }

    /// Push `repo:tag` and return the full image name.
    pub async fn push(
        &self,
        repo: &str,
        tag: &str,
        credentials: Option<DockerCredentials>,
    ) -> BuildResult<String> {
        let full_image = format!("{}:{}", repo, tag);
        validate_tag(tag)?;

        #[allow(deprecated)]
        let options = bollard::image::PushImageOptions::<String> {
            tag: tag.to_string(),
        };

        tracing::info!(image = %full_image, "Pushing image");

        #[allow(deprecated)]
        let mut stream = self.docker.push_image(repo, Some(options), credentials);

        let mut last_status = String::new();
        let mut error_message: Option<String> = None;

        while let Some(result) = stream.next().await {
            match result {
                Ok(info) => {
                    if let Some(err) = info.error {
                        error_message = Some(err);
                    } else {
                        handle_progress(&info, &mut last_status);
                    }
                }
                Err(e) => {
                    return Err(BuildError::PushFailed {
                        message: e.to_string(),
                    });
                }
            }
        }

        if let Some(err) = error_message {
            return Err(BuildError::PushFailed { message: err });
        }

        Ok(full_image)
    }

    /// Content digest the engine recorded for `repo` after pushing `repo:tag`.
    ///
    /// `Ok(None)` when the image exists but carries no digest for `repo`.
    pub async fn local_digest(&self, repo: &str, tag: &str) -> BuildResult<Option<String>> {
        let image = format!("{}:{}", repo, tag);
        let inspect = self.docker.inspect_image(&image).await?;
        let digests = inspect.repo_digests.unwrap_or_default();
        Ok(repo_digest(repo, &digests))
    }
}

/// Pick the digest of `repo` out of `name@sha256:...` entries.
pub fn repo_digest(repo: &str, repo_digests: &[String]) -> Option<String> {
    repo_digests.iter().find_map(|entry| {
        let (name, digest) = entry.split_once('@')?;
        (name == repo || name == format!("docker.io/{}", repo)).then(|| digest.to_string())
    })
}

/// Docker tag rules: non-empty, at most 128 characters of
/// `[A-Za-z0-9_.-]`, not starting with `.` or `-`.
pub fn validate_tag(tag: &str) -> BuildResult<()> {
    if tag.is_empty() {
        return Err(BuildError::InvalidTag {
            tag: "(empty)".to_string(),
        });
    }

    if tag.len() > MAX_TAG_LEN {
        return Err(BuildError::InvalidTag {
            tag: format!("tag too long ({} characters, max {})", tag.len(), MAX_TAG_LEN),
        });
    }

    if tag.starts_with('.') || tag.starts_with('-') {
        return Err(BuildError::InvalidTag {
            tag: tag.to_string(),
        });
    }

    if let Some(c) = tag
        .chars()
        .find(|c| !c.is_ascii_alphanumeric() && *c != '.' && *c != '-' && *c != '_')
    {
        return Err(BuildError::InvalidTag {
            tag: format!("invalid character '{}' in tag: {}", c, tag),
        });
    }

    Ok(())
}

fn handle_progress(info: &PushImageInfo, last_status: &mut String) {
    if let Some(status) = &info.status {
        match status.as_str() {
            // per-layer noise
            "Preparing" | "Waiting" | "Pushing" => {}
            "Pushed" | "Layer already exists" => {
                tracing::debug!(progress = info.progress.as_deref().unwrap_or(""), "{}", status);
            }
            _ => {
                if status != last_status {
                    tracing::info!("{}", status);
                    *last_status = status.clone();
                }
            }
        }
    }
}
