use crate::models::{ProcessedImage, TransformResultItem};
use crate::services::error::PipelineError;
use crate::services::reconcile::BatchOutcome;
use std::collections::{HashMap, HashSet};
use tracing::info;

/// Post-processing state the result views render from.
#[derive(Debug, Default)]
pub struct ResultsStore {
    staging_order: Vec<String>,
    batch: Vec<TransformResultItem>,
    results: HashMap<String, TransformResultItem>,
    processed: HashMap<String, ProcessedImage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResultSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
}

#[derive(Debug, Clone, Copy)]
pub struct SuccessfulResult<'a> {
    pub original_file_name: &'a str,
    pub result: &'a TransformResultItem,
    pub image: &'a ProcessedImage,
}

impl ResultsStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Applies a reconciled batch in one step, replacing the previous batch
    /// entirely. A batch whose epoch was invalidated is rejected and leaves
    /// the store untouched.
    pub fn commit(&mut self, outcome: BatchOutcome) -> Result<(), PipelineError> {
        if !outcome.ticket.is_current() {
            info!(
                "Discarding results of cancelled batch (epoch {})",
                outcome.ticket.epoch()
            );
            return Err(PipelineError::Cancelled);
        }

        self.staging_order = outcome.staging_order;
        self.results = outcome
            .results
            .iter()
            .map(|r| (r.original_file_name.clone(), r.clone()))
            .collect();
        self.batch = outcome.results;
        self.processed = outcome.processed.into_iter().collect();
        Ok(())
    }

    pub fn result(&self, original_file_name: &str) -> Option<&TransformResultItem> {
        self.results.get(original_file_name)
    }

    pub fn processed_image(&self, original_file_name: &str) -> Option<&ProcessedImage> {
        self.processed.get(original_file_name)
    }

    /// Results in the order the batch was submitted.
    pub fn batch_results(&self) -> &[TransformResultItem] {
        &self.batch
    }

    /// Successful items with a non-empty processed image, in staging order.
    /// Results are keyed by file name, so a repeated name is listed once.
    pub fn successful(&self) -> Vec<SuccessfulResult<'_>> {
        let mut seen = HashSet::new();
        self.staging_order
            .iter()
            .filter(|name| seen.insert(name.as_str()))
            .filter_map(|name| {
                let result = self.results.get(name).filter(|r| r.success)?;
                let image = self.processed.get(name).filter(|img| !img.is_empty())?;
                Some(SuccessfulResult {
                    original_file_name: name.as_str(),
                    result,
                    image,
                })
            })
            .collect()
    }

    pub fn first_successful(&self) -> Option<SuccessfulResult<'_>> {
        self.successful().into_iter().next()
    }

    pub fn summary(&self) -> ResultSummary {
        let total = self.batch.len();
        let succeeded = self.batch.iter().filter(|r| r.success).count();
        ResultSummary {
            total,
            succeeded,
            failed: total - succeeded,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.batch.is_empty() && self.processed.is_empty()
    }

    pub fn clear(&mut self) {
        self.staging_order.clear();
        self.batch.clear();
        self.results.clear();
        self.processed.clear();
    }
}
