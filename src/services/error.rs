use std::time::Duration;
use thiserror::Error;

/// Failures of the upload-and-transform pipeline.
#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("No files are staged")]
    NothingStaged,

    #[error("Please select at least one processing option.")]
    NoProcessingOptions,

    #[error("Failed to get upload URL for {file_name}: {reason}")]
    PresignRequestFailed { file_name: String, reason: String },

    #[error("Failed to upload {file_name}: {reason}")]
    UploadFailed { file_name: String, reason: String },

    #[error("Image processing failed: {0}")]
    TransformRequestFailed(String),

    #[error("{operation} timed out after {after:?}")]
    Timeout {
        operation: &'static str,
        after: Duration,
    },

    #[error("Failed to decode processed image {file_name}: {reason}")]
    DecodeFailed { file_name: String, reason: String },

    #[error("Failed to generate archive: {0}")]
    ArchiveGenerationFailed(String),

    #[error("Batch was cancelled before its results were applied")]
    Cancelled,
}

impl PipelineError {
    pub fn is_timeout(&self) -> bool {
        matches!(self, PipelineError::Timeout { .. })
    }
}

/// Rejections from the staging store's mutation entry points.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum StagingError {
    #[error("{file_name} is {size} bytes, the limit is {max} bytes")]
    FileTooLarge {
        file_name: String,
        size: usize,
        max: usize,
    },

    #[error("{file_name} has unsupported type {content_type}")]
    UnsupportedType {
        file_name: String,
        content_type: String,
    },

    #[error("No staged file at index {0}")]
    IndexOutOfRange(usize),

    #[error("Could not read dimensions of {file_name}: {reason}")]
    DimensionsUnavailable { file_name: String, reason: String },
}
