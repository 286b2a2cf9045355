use crate::context::ContextBuilder;
use crate::error::{BuildError, Result};
use crate::progress::BuildProgress;
use crate::resolver::BuildSpec;
use bollard::Docker;
use futures_util::stream::StreamExt;
use std::collections::HashMap;

pub struct ImageBuilder {
    docker: Docker,
}

impl ImageBuilder {
    pub fn new(docker: Docker) -> Self {
        Self { docker }
    }

    /// Build the image described by `spec`, tagging it `spec.image`.
    pub async fn build_image(&self, spec: &BuildSpec) -> Result<()> {
        tracing::info!(
            image = %spec.image,
            context = %spec.context_dir.display(),
            "Building image"
        );

        let context_data = ContextBuilder::create_context(&spec.context_dir)?;

        let labels: HashMap<&str, &str> = spec
            .labels
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .collect();

        #[allow(deprecated)]
        let options = bollard::image::BuildImageOptions {
            dockerfile: spec.dockerfile.as_str(),
            t: spec.image.as_str(),
            labels,
            rm: true,
            forcerm: true,
            pull: true,
            ..Default::default()
        };

        tracing::debug!("Build options: {:?}", options);

        use bytes::Bytes;
        use http_body_util::{Either, Full};
        let body = Full::new(Bytes::from(context_data));
        let mut stream = self
            .docker
            .build_image(options, None, Some(Either::Left(body)));

        let progress = BuildProgress::new(&spec.image);
        while let Some(msg) = stream.next().await {
            let result = match msg {
                Ok(output) => self.handle_build_output(output, &progress),
                Err(e) => Err(BuildError::DockerConnection(e)),
            };
            if let Err(e) = result {
                progress.finish_error(&e.to_string());
                return Err(e);
            }
        }
        progress.finish_success();

        tracing::info!(image = %spec.image, "Successfully built");
        Ok(())
    }

    fn handle_build_output(
        &self,
        output: bollard::models::BuildInfo,
        progress: &BuildProgress,
    ) -> Result<()> {
        if let Some(stream) = output.stream {
            tracing::debug!(target: "workerflow_build::engine", "{}", stream.trim_end());
            progress.set_step(&stream);
        }

        if let Some(error) = output.error {
            return Err(BuildError::BuildFailed(error));
        }

        if let Some(error_detail) = output.error_detail {
            let error_msg = error_detail
                .message
                .unwrap_or_else(|| "Unknown build error".to_string());
            return Err(BuildError::BuildFailed(error_msg));
        }

        if let Some(status) = output.status {
            tracing::debug!(target: "workerflow_build::engine", "{}", status);
        }

        Ok(())
    }
}
