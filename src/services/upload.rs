use crate::services::error::PipelineError;
use crate::services::image_api::{ImageApi, ProgressFn};
use crate::services::presign::PresignedFile;
use crate::services::status::StatusReporter;
use std::sync::Arc;
use tracing::{error, info};

/// Uploads staged files to object storage one at a time.
pub struct UploadExecutor {
    api: Arc<dyn ImageApi>,
}

impl UploadExecutor {
    pub fn new(api: Arc<dyn ImageApi>) -> Self {
        Self { api }
    }

    /// The next file starts only after the previous one settled. A failure
    /// stops the queue; files already uploaded stay in storage.
    pub async fn upload_all(
        &self,
        files: &[PresignedFile],
        status: &StatusReporter,
    ) -> Result<(), PipelineError> {
        for (index, presigned) in files.iter().enumerate() {
            status.begin_file(index + 1);

            let reporter = status.clone();
            let on_progress: ProgressFn =
                Arc::new(move |percent| reporter.report_progress(percent));

            if let Err(e) = self
                .api
                .upload(&presigned.descriptor, &presigned.file, on_progress)
                .await
            {
                error!(
                    "❌ Upload {}/{} failed ({}): {}",
                    index + 1,
                    files.len(),
                    presigned.file.original_file_name,
                    e
                );
                return Err(e);
            }

            status.report_progress(100);
            info!(
                "📤 Uploaded {}/{}: {} -> {}",
                index + 1,
                files.len(),
                presigned.file.original_file_name,
                presigned.descriptor.storage_key
            );
        }
        Ok(())
    }
}
