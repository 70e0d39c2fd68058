use crate::models::PipelineStage;
use crate::services::error::PipelineError;
use crate::services::image_api::ImageApi;
use crate::services::presign::PresignClient;
use crate::services::reconcile::{BatchOutcome, reconcile};
use crate::services::status::StatusReporter;
use crate::services::transform::TransformBatch;
use crate::services::upload::UploadExecutor;
use crate::store::{ResultSummary, ResultsStore, StagingSnapshot, StagingStore};
use std::sync::Arc;
use tracing::{info, warn};

/// Drives a staged batch through presign, upload and transform.
pub struct Pipeline {
    api: Arc<dyn ImageApi>,
    presign: PresignClient,
    uploader: UploadExecutor,
    status: StatusReporter,
}

impl Pipeline {
    pub fn new(api: Arc<dyn ImageApi>) -> Self {
        Self {
            presign: PresignClient::new(api.clone()),
            uploader: UploadExecutor::new(api.clone()),
            api,
            status: StatusReporter::new(),
        }
    }

    pub fn status(&self) -> &StatusReporter {
        &self.status
    }

    /// Runs the batch and commits its results. The commit is refused when
    /// the staging store was reset while the batch was in flight.
    pub async fn process(
        &self,
        staging: &StagingStore,
        results: &mut ResultsStore,
    ) -> Result<ResultSummary, PipelineError> {
        let outcome = self.run(staging.snapshot()).await?;

        if let Err(e) = results.commit(outcome) {
            self.status.reset();
            return Err(e);
        }
        Ok(results.summary())
    }

    /// Runs the batch without touching any store.
    pub async fn run(&self, snapshot: StagingSnapshot) -> Result<BatchOutcome, PipelineError> {
        if snapshot.files.is_empty() {
            return Err(PipelineError::NothingStaged);
        }

        if snapshot.files.iter().all(|f| f.processing_option.is_none()) {
            let err = PipelineError::NoProcessingOptions;
            self.status.fail(err.to_string());
            return Err(err);
        }

        match self.execute(snapshot).await {
            Ok(outcome) => Ok(outcome),
            Err(PipelineError::Cancelled) => {
                info!("🛑 Batch cancelled");
                self.status.reset();
                Err(PipelineError::Cancelled)
            }
            Err(e) => {
                warn!("❌ Batch failed: {}", e);
                self.status.fail(e.to_string());
                Err(e)
            }
        }
    }

    async fn execute(&self, snapshot: StagingSnapshot) -> Result<BatchOutcome, PipelineError> {
        let StagingSnapshot { files, ticket } = snapshot;
        let ensure_current = || {
            if ticket.is_current() {
                Ok(())
            } else {
                Err(PipelineError::Cancelled)
            }
        };

        self.status.reset();
        self.status.begin_batch(files.len());
        self.status.advance(PipelineStage::GettingUrl);
        let presigned = self.presign.presign_all(&files).await?;
        ensure_current()?;

        self.status.advance(PipelineStage::Uploading);
        self.uploader.upload_all(&presigned, &self.status).await?;
        ensure_current()?;

        self.status.advance(PipelineStage::Processing);
        let batch = TransformBatch::build(&presigned);
        info!("🧪 Submitting {} of {} files for processing", batch.len(), files.len());
        let response = self.api.transform(&batch).await?;

        let staging_order = files
            .iter()
            .map(|f| f.original_file_name.clone())
            .collect();
        let outcome = reconcile(&batch, response, staging_order, ticket);

        self.status.advance(PipelineStage::Completed);
        Ok(outcome)
    }
}
