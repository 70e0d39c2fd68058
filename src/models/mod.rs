use base64::{Engine as _, engine::general_purpose::STANDARD as BASE64};
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

impl fmt::Display for Dimensions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x {}", self.width, self.height)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AspectRatio {
    #[serde(rename = "1:1")]
    Square,
    #[serde(rename = "1:2")]
    Portrait,
    #[serde(rename = "2:1")]
    Landscape,
}

impl AspectRatio {
    pub fn as_str(&self) -> &'static str {
        match self {
            AspectRatio::Square => "1:1",
            AspectRatio::Portrait => "1:2",
            AspectRatio::Landscape => "2:1",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UpscaleFactor {
    X1,
    X2,
    X4,
}

impl UpscaleFactor {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpscaleFactor::X1 => "x1",
            UpscaleFactor::X2 => "x2",
            UpscaleFactor::X4 => "x4",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProcessingMethod {
    Uncrop,
    Upscale,
    Square,
}

impl ProcessingMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProcessingMethod::Uncrop => "uncrop",
            ProcessingMethod::Upscale => "upscale",
            ProcessingMethod::Square => "square",
        }
    }
}

impl fmt::Display for ProcessingMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The processing chosen for one staged file. The variant decides which
/// parameters exist, so an uncrop can never carry a scale factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingOption {
    Uncrop { aspect_ratio: AspectRatio },
    Upscale { factor: UpscaleFactor },
    Square { target_res: Option<u32> },
}

impl ProcessingOption {
    /// Option installed when a method is first selected
    pub fn default_for(method: ProcessingMethod) -> Self {
        match method {
            ProcessingMethod::Uncrop => ProcessingOption::Uncrop {
                aspect_ratio: AspectRatio::Square,
            },
            ProcessingMethod::Upscale => ProcessingOption::Upscale {
                factor: UpscaleFactor::X1,
            },
            ProcessingMethod::Square => ProcessingOption::Square { target_res: None },
        }
    }

    pub fn method(&self) -> ProcessingMethod {
        match self {
            ProcessingOption::Uncrop { .. } => ProcessingMethod::Uncrop,
            ProcessingOption::Upscale { .. } => ProcessingMethod::Upscale,
            ProcessingOption::Square { .. } => ProcessingMethod::Square,
        }
    }

    /// Short label shown next to a result, e.g. `UPSCALE x2`
    pub fn label(&self) -> String {
        let method = self.method().as_str().to_uppercase();
        match self {
            ProcessingOption::Uncrop { aspect_ratio } => {
                format!("{} {}", method, aspect_ratio.as_str())
            }
            ProcessingOption::Upscale { factor } => format!("{} {}", method, factor.as_str()),
            ProcessingOption::Square { .. } => method,
        }
    }
}

/// A file selected by the user and held until the batch is submitted.
#[derive(Debug, Clone)]
pub struct StagedFile {
    pub payload: Bytes,
    pub original_file_name: String,
    pub content_type: String,
    pub preview_ref: Uuid,
    pub dimensions: Option<Dimensions>,
    pub processing_option: Option<ProcessingOption>,
}

impl StagedFile {
    pub fn new(
        original_file_name: impl Into<String>,
        content_type: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Self {
        Self {
            payload: payload.into(),
            original_file_name: original_file_name.into(),
            content_type: content_type.into(),
            preview_ref: Uuid::new_v4(),
            dimensions: None,
            processing_option: None,
        }
    }

    pub fn size(&self) -> usize {
        self.payload.len()
    }

    pub fn processing_label(&self) -> String {
        self.processing_option
            .map(|option| option.label())
            .unwrap_or_else(|| "none".to_string())
    }
}

/// Short-lived credential for one direct upload to object storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PresignedDescriptor {
    pub upload_url: String,
    pub form_fields: BTreeMap<String, String>,
    pub storage_key: String,
}

/// Method specific metadata fields. Serialized without a tag, flattened into
/// [`TransformMetadata`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum MethodParams {
    Uncrop {
        #[serde(rename = "aspectRatio")]
        aspect_ratio: AspectRatio,
    },
    Upscale {
        factor: UpscaleFactor,
    },
    Square {
        #[serde(rename = "targetRes", skip_serializing_if = "Option::is_none")]
        target_res: Option<u32>,
    },
}

impl From<ProcessingOption> for MethodParams {
    fn from(option: ProcessingOption) -> Self {
        match option {
            ProcessingOption::Uncrop { aspect_ratio } => MethodParams::Uncrop { aspect_ratio },
            ProcessingOption::Upscale { factor } => MethodParams::Upscale { factor },
            ProcessingOption::Square { target_res } => MethodParams::Square { target_res },
        }
    }
}

/// JSON sent as `metadata_<i>` alongside each file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TransformMetadata {
    #[serde(rename = "s3Key")]
    pub storage_key: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub width: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub height: Option<u32>,
    #[serde(flatten)]
    pub params: MethodParams,
}

#[derive(Debug, Clone)]
pub struct TransformRequestItem {
    pub original_file_name: String,
    pub content_type: String,
    pub payload: Bytes,
    pub method: ProcessingMethod,
    pub metadata: TransformMetadata,
}

/// One entry of the transform endpoint's `results` array.
#[derive(Debug, Clone, Deserialize)]
pub struct TransformResultPayload {
    pub success: bool,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub resized_img: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TransformResponse {
    pub results: Vec<TransformResultPayload>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TransformResultItem {
    pub original_file_name: String,
    pub success: bool,
    pub message: String,
}

/// Processed output kept as a `data:` URL, ready for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedImage {
    data_url: String,
}

impl ProcessedImage {
    const PREFIX: &'static str = "data:image/jpeg;base64,";

    pub fn from_base64(payload: &str) -> Self {
        Self {
            data_url: format!("{}{}", Self::PREFIX, payload),
        }
    }

    pub fn from_bytes(bytes: &[u8]) -> Self {
        Self::from_base64(&BASE64.encode(bytes))
    }

    pub fn data_url(&self) -> &str {
        &self.data_url
    }

    /// Base64 part after the first comma
    pub fn payload(&self) -> &str {
        self.data_url
            .split_once(',')
            .map(|(_, data)| data)
            .unwrap_or("")
    }

    pub fn is_empty(&self) -> bool {
        self.payload().is_empty()
    }

    pub fn decode(&self) -> Result<Vec<u8>, base64::DecodeError> {
        BASE64.decode(self.payload())
    }
}

/// Linear pipeline progression. Ordering follows declaration order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Default, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum PipelineStage {
    #[default]
    Idle,
    GettingUrl,
    Uploading,
    Processing,
    Completed,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PipelineStatus {
    pub stage: PipelineStage,
    /// 1-based index of the file being uploaded, 0 before uploads start
    pub current_file_index: usize,
    pub total_files: usize,
    pub current_file_progress: u8,
    pub error: Option<String>,
}

/// Server-side record resolved by the image proxy.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProcessInfo {
    pub s3_url: String,
    pub original_file_name: String,
    pub method: String,
}
