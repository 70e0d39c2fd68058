use crate::config::StudioConfig;
use crate::models::{PresignedDescriptor, StagedFile, TransformResponse};
use crate::services::error::PipelineError;
use crate::services::presign::{PresignEnvelope, encode_file_name};
use crate::services::reconcile::parse_response;
use crate::services::transform::TransformBatch;
use anyhow::{Context, Result};
use async_trait::async_trait;
use bytes::Bytes;
use futures::StreamExt;
use reqwest::multipart::{Form, Part};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error};

/// Receives integer upload percentages in `0..=100`.
pub type ProgressFn = Arc<dyn Fn(u8) + Send + Sync>;

/// Bytes handed to the HTTP body per poll; also the progress granularity.
const UPLOAD_CHUNK_SIZE: usize = 64 * 1024;

/// The remote collaborators of the pipeline: presign endpoint, object
/// storage and the transform endpoint.
#[async_trait]
pub trait ImageApi: Send + Sync {
    async fn presign(&self, file_name: &str) -> Result<PresignedDescriptor, PipelineError>;

    async fn upload(
        &self,
        descriptor: &PresignedDescriptor,
        file: &StagedFile,
        on_progress: ProgressFn,
    ) -> Result<(), PipelineError>;

    async fn transform(&self, batch: &TransformBatch) -> Result<TransformResponse, PipelineError>;
}

pub fn upload_percent(sent: u64, total: u64) -> u8 {
    if total == 0 {
        return 100;
    }
    ((sent as f64 * 100.0) / total as f64).round().min(100.0) as u8
}

fn timeout_or<F>(
    e: reqwest::Error,
    operation: &'static str,
    after: Duration,
    other: F,
) -> PipelineError
where
    F: FnOnce(String) -> PipelineError,
{
    if e.is_timeout() {
        error!("⏱️  {} timed out after {:?}", operation, after);
        PipelineError::Timeout { operation, after }
    } else {
        other(e.to_string())
    }
}

pub struct HttpImageApi {
    client: reqwest::Client,
    base_url: String,
    presign_timeout: Duration,
    upload_timeout: Duration,
    transform_timeout: Duration,
}

impl HttpImageApi {
    pub fn new(client: reqwest::Client, config: &StudioConfig) -> Result<Self> {
        url::Url::parse(&config.api_base_url)
            .with_context(|| format!("Invalid IMAGE_API_BASE_URL: {}", config.api_base_url))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            presign_timeout: config.presign_timeout,
            upload_timeout: config.upload_timeout,
            transform_timeout: config.transform_timeout,
        })
    }

    pub fn presign_url(&self, file_name: &str) -> String {
        format!("{}/api/image?file={}", self.base_url, encode_file_name(file_name))
    }

    pub fn transform_url(&self) -> String {
        format!("{}/api/image/transform", self.base_url)
    }
}

#[async_trait]
impl ImageApi for HttpImageApi {
    async fn presign(&self, file_name: &str) -> Result<PresignedDescriptor, PipelineError> {
        let failed = |reason: String| PipelineError::PresignRequestFailed {
            file_name: file_name.to_string(),
            reason,
        };

        let response = self
            .client
            .get(self.presign_url(file_name))
            .timeout(self.presign_timeout)
            .send()
            .await
            .map_err(|e| timeout_or(e, "presign request", self.presign_timeout, failed))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let envelope = response
            .json::<PresignEnvelope>()
            .await
            .map_err(|e| timeout_or(e, "presign request", self.presign_timeout, failed))?;

        envelope.into_descriptor(file_name)
    }

    async fn upload(
        &self,
        descriptor: &PresignedDescriptor,
        file: &StagedFile,
        on_progress: ProgressFn,
    ) -> Result<(), PipelineError> {
        let failed = |reason: String| PipelineError::UploadFailed {
            file_name: file.original_file_name.clone(),
            reason,
        };

        let total = file.payload.len() as u64;
        let chunks: Vec<Bytes> = (0..file.payload.len())
            .step_by(UPLOAD_CHUNK_SIZE)
            .map(|start| {
                let end = (start + UPLOAD_CHUNK_SIZE).min(file.payload.len());
                file.payload.slice(start..end)
            })
            .collect();

        let mut sent = 0u64;
        let body = futures::stream::iter(chunks).map(move |chunk| {
            sent += chunk.len() as u64;
            on_progress(upload_percent(sent, total));
            Ok::<Bytes, std::io::Error>(chunk)
        });

        let part = Part::stream_with_length(reqwest::Body::wrap_stream(body), total)
            .file_name(file.original_file_name.clone())
            .mime_str(&file.content_type)
            .map_err(|e| failed(e.to_string()))?;

        // Policy fields must precede the file part
        let mut form = Form::new();
        for (name, value) in &descriptor.form_fields {
            form = form.text(name.clone(), value.clone());
        }
        let form = form.part("file", part);

        debug!(
            "Uploading {} to {}",
            file.original_file_name, descriptor.upload_url
        );
        let response = self
            .client
            .post(&descriptor.upload_url)
            .timeout(self.upload_timeout)
            .multipart(form)
            .send()
            .await
            .map_err(|e| timeout_or(e, "object upload", self.upload_timeout, failed))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }
        Ok(())
    }

    async fn transform(&self, batch: &TransformBatch) -> Result<TransformResponse, PipelineError> {
        let failed = PipelineError::TransformRequestFailed;

        let response = self
            .client
            .post(self.transform_url())
            .timeout(self.transform_timeout)
            .multipart(batch.to_form()?)
            .send()
            .await
            .map_err(|e| timeout_or(e, "transform request", self.transform_timeout, failed))?;

        if !response.status().is_success() {
            return Err(failed(format!("HTTP {}", response.status())));
        }

        let body = response
            .bytes()
            .await
            .map_err(|e| timeout_or(e, "transform request", self.transform_timeout, failed))?;

        parse_response(&body)
    }
}
