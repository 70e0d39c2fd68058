use crate::models::{PipelineStage, PipelineStatus};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::warn;

/// Publishes the pipeline status to anyone rendering it.
#[derive(Debug, Clone)]
pub struct StatusReporter {
    tx: Arc<watch::Sender<PipelineStatus>>,
}

impl Default for StatusReporter {
    fn default() -> Self {
        Self::new()
    }
}

impl StatusReporter {
    pub fn new() -> Self {
        let (tx, _) = watch::channel(PipelineStatus::default());
        Self { tx: Arc::new(tx) }
    }

    pub fn subscribe(&self) -> watch::Receiver<PipelineStatus> {
        self.tx.subscribe()
    }

    pub fn current(&self) -> PipelineStatus {
        self.tx.borrow().clone()
    }

    /// Moves forward to `stage`. Going backwards is refused; use
    /// [`StatusReporter::reset`] or [`StatusReporter::fail`] to return to idle.
    pub fn advance(&self, stage: PipelineStage) {
        self.tx.send_modify(|status| {
            if stage > status.stage {
                status.stage = stage;
                status.error = None;
            } else {
                warn!("Ignoring stage transition {:?} -> {:?}", status.stage, stage);
            }
        });
    }

    pub fn begin_batch(&self, total_files: usize) {
        self.tx.send_modify(|status| {
            status.total_files = total_files;
            status.current_file_index = 0;
            status.current_file_progress = 0;
        });
    }

    /// `index` is 1-based.
    pub fn begin_file(&self, index: usize) {
        self.tx.send_modify(|status| {
            status.current_file_index = index;
            status.current_file_progress = 0;
        });
    }

    /// Progress never decreases within a file.
    pub fn report_progress(&self, percent: u8) {
        let percent = percent.min(100);
        self.tx.send_if_modified(|status| {
            if percent > status.current_file_progress {
                status.current_file_progress = percent;
                true
            } else {
                false
            }
        });
    }

    pub fn fail(&self, message: impl Into<String>) {
        let message = message.into();
        self.tx.send_modify(|status| {
            status.stage = PipelineStage::Idle;
            status.error = Some(message);
        });
    }

    pub fn reset(&self) {
        self.tx.send_replace(PipelineStatus::default());
    }
}
