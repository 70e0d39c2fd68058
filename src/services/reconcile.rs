use crate::models::{ProcessedImage, TransformResponse, TransformResultItem};
use crate::services::error::PipelineError;
use crate::services::transform::TransformBatch;
use crate::store::generation::EpochTicket;
use tracing::warn;

const UNKNOWN_ERROR: &str = "Unknown error";

/// Everything a batch produced, ready to be committed to the results store.
#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub ticket: EpochTicket,
    /// Names of all staged files in their staging order
    pub staging_order: Vec<String>,
    /// One entry per answered item, in request order
    pub results: Vec<TransformResultItem>,
    pub processed: Vec<(String, ProcessedImage)>,
}

/// Parses the transform endpoint's body; a missing `results` array is a
/// failed request.
pub fn parse_response(body: &[u8]) -> Result<TransformResponse, PipelineError> {
    serde_json::from_slice(body).map_err(|e| {
        PipelineError::TransformRequestFailed(format!("malformed response: {}", e))
    })
}

/// Matches response entry `i` to request item `i`.
pub fn reconcile(
    batch: &TransformBatch,
    response: TransformResponse,
    staging_order: Vec<String>,
    ticket: EpochTicket,
) -> BatchOutcome {
    if response.results.len() != batch.len() {
        warn!(
            "Transform response has {} results for {} submitted items",
            response.results.len(),
            batch.len()
        );
    }

    let mut results = Vec::with_capacity(batch.len());
    let mut processed = Vec::new();

    for (name, entry) in batch.file_names().zip(response.results) {
        if entry.success {
            if let Some(image) = entry.resized_img.as_deref().filter(|img| !img.is_empty()) {
                processed.push((name.to_string(), ProcessedImage::from_base64(image)));
            }
        }

        results.push(TransformResultItem {
            original_file_name: name.to_string(),
            success: entry.success,
            message: entry.message.unwrap_or_else(|| UNKNOWN_ERROR.to_string()),
        });
    }

    BatchOutcome {
        ticket,
        staging_order,
        results,
        processed,
    }
}
