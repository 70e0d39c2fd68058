use crate::models::{MethodParams, TransformMetadata, TransformRequestItem};
use crate::services::error::PipelineError;
use crate::services::presign::PresignedFile;
use reqwest::multipart::{Form, Part};
use tracing::debug;

/// Ordered items of one transform request. Response entries are matched
/// back to these items by index.
#[derive(Debug, Clone, Default)]
pub struct TransformBatch {
    items: Vec<TransformRequestItem>,
}

impl TransformBatch {
    /// Files without a processing option are left out of the batch.
    pub fn build(uploaded: &[PresignedFile]) -> Self {
        let items = uploaded
            .iter()
            .filter_map(|PresignedFile { file, descriptor }| {
                let Some(option) = file.processing_option else {
                    debug!(
                        "Skipping {}: no processing option selected",
                        file.original_file_name
                    );
                    return None;
                };

                Some(TransformRequestItem {
                    original_file_name: file.original_file_name.clone(),
                    content_type: file.content_type.clone(),
                    payload: file.payload.clone(),
                    method: option.method(),
                    metadata: TransformMetadata {
                        storage_key: descriptor.storage_key.clone(),
                        width: file.dimensions.map(|d| d.width),
                        height: file.dimensions.map(|d| d.height),
                        params: MethodParams::from(option),
                    },
                })
            })
            .collect();

        Self { items }
    }

    pub fn items(&self) -> &[TransformRequestItem] {
        &self.items
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn file_names(&self) -> impl Iterator<Item = &str> {
        self.items.iter().map(|i| i.original_file_name.as_str())
    }

    /// `file_<i>`, `method_<i>` and `metadata_<i>` for every item.
    pub fn to_form(&self) -> Result<Form, PipelineError> {
        let mut form = Form::new();
        for (index, item) in self.items.iter().enumerate() {
            let metadata = serde_json::to_string(&item.metadata)
                .map_err(|e| PipelineError::TransformRequestFailed(e.to_string()))?;
            let file = Part::bytes(item.payload.to_vec())
                .file_name(item.original_file_name.clone())
                .mime_str(&item.content_type)
                .map_err(|e| PipelineError::TransformRequestFailed(e.to_string()))?;

            form = form
                .part(format!("file_{}", index), file)
                .text(format!("method_{}", index), item.method.as_str())
                .text(format!("metadata_{}", index), metadata);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{
        AspectRatio, Dimensions, PresignedDescriptor, ProcessingMethod, ProcessingOption,
        StagedFile, UpscaleFactor,
    };

    fn presigned(name: &str, option: Option<ProcessingOption>) -> PresignedFile {
        let mut file = StagedFile::new(name, "image/png", vec![1, 2, 3]);
        file.processing_option = option;
        file.dimensions = Some(Dimensions {
            width: 800,
            height: 600,
        });
        PresignedFile {
            file,
            descriptor: PresignedDescriptor {
                upload_url: "http://storage.local".to_string(),
                form_fields: Default::default(),
                storage_key: format!("uploads/{}", name),
            },
        }
    }

    #[test]
    fn test_build_skips_files_without_option() {
        let batch = TransformBatch::build(&[
            presigned(
                "a.png",
                Some(ProcessingOption::Upscale {
                    factor: UpscaleFactor::X2,
                }),
            ),
            presigned("b.png", None),
            presigned(
                "c.png",
                Some(ProcessingOption::Uncrop {
                    aspect_ratio: AspectRatio::Portrait,
                }),
            ),
        ]);

        assert_eq!(batch.len(), 2);
        assert_eq!(batch.file_names().collect::<Vec<_>>(), vec!["a.png", "c.png"]);
        assert_eq!(batch.items()[1].method, ProcessingMethod::Uncrop);
        assert_eq!(
            serde_json::to_value(&batch.items()[1].metadata).unwrap(),
            serde_json::json!({
                "s3Key": "uploads/c.png",
                "width": 800,
                "height": 600,
                "aspectRatio": "1:2"
            })
        );
    }

    #[test]
    fn test_build_without_dimensions_omits_size() {
        let mut item = presigned("a.png", Some(ProcessingOption::Square { target_res: None }));
        item.file.dimensions = None;
        let batch = TransformBatch::build(&[item]);

        assert_eq!(
            serde_json::to_value(&batch.items()[0].metadata).unwrap(),
            serde_json::json!({"s3Key": "uploads/a.png"})
        );
    }

    #[test]
    fn test_to_form_builds_for_every_item() {
        let batch = TransformBatch::build(&[
            presigned("a.png", Some(ProcessingOption::Square { target_res: None })),
            presigned("b.png", Some(ProcessingOption::Square { target_res: Some(512) })),
        ]);
        assert!(batch.to_form().is_ok());
        assert!(TransformBatch::default().is_empty());
    }
}
