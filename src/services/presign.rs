use crate::models::{PresignedDescriptor, StagedFile};
use crate::services::error::PipelineError;
use crate::services::image_api::ImageApi;
use futures::future::try_join_all;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::info;

/// Characters left intact when encoding a URI component.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

pub fn encode_file_name(file_name: &str) -> String {
    utf8_percent_encode(file_name, URI_COMPONENT).to_string()
}

/// Body of `GET /api/image?file=...`
#[derive(Debug, Deserialize)]
pub struct PresignEnvelope {
    pub success: bool,
    #[serde(default)]
    pub data: Option<PresignData>,
    #[serde(default)]
    pub error: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PresignData {
    pub presigned: PresignedPost,
    #[serde(rename = "s3Key")]
    pub s3_key: String,
}

#[derive(Debug, Deserialize)]
pub struct PresignedPost {
    pub url: String,
    #[serde(default)]
    pub fields: BTreeMap<String, String>,
}

impl PresignEnvelope {
    pub fn into_descriptor(self, file_name: &str) -> Result<PresignedDescriptor, PipelineError> {
        if !self.success {
            return Err(PipelineError::PresignRequestFailed {
                file_name: file_name.to_string(),
                reason: self
                    .error
                    .unwrap_or_else(|| "request was rejected".to_string()),
            });
        }

        let data = self.data.ok_or_else(|| PipelineError::PresignRequestFailed {
            file_name: file_name.to_string(),
            reason: "response carried no upload descriptor".to_string(),
        })?;

        Ok(PresignedDescriptor {
            upload_url: data.presigned.url,
            form_fields: data.presigned.fields,
            storage_key: data.s3_key,
        })
    }
}

/// A staged file paired with the descriptor it will be uploaded with.
#[derive(Debug, Clone)]
pub struct PresignedFile {
    pub file: StagedFile,
    pub descriptor: PresignedDescriptor,
}

pub struct PresignClient {
    api: Arc<dyn ImageApi>,
}

impl PresignClient {
    pub fn new(api: Arc<dyn ImageApi>) -> Self {
        Self { api }
    }

    /// Requests every descriptor concurrently. The first failure fails the
    /// whole batch and the outstanding requests are dropped.
    pub async fn presign_all(
        &self,
        files: &[StagedFile],
    ) -> Result<Vec<PresignedFile>, PipelineError> {
        let descriptors = try_join_all(
            files
                .iter()
                .map(|file| self.api.presign(&file.original_file_name)),
        )
        .await?;

        info!("🔑 Received {} upload descriptors", descriptors.len());

        Ok(files
            .iter()
            .cloned()
            .zip(descriptors)
            .map(|(file, descriptor)| PresignedFile { file, descriptor })
            .collect())
    }
}
