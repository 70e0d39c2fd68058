use crate::services::error::PipelineError;
use crate::store::ResultsStore;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

pub const ARCHIVE_FILE_NAME: &str = "processed_images.zip";
pub const ENTRY_PREFIX: &str = "processed_";

/// A finished archive held in memory.
#[derive(Debug, Clone)]
pub struct ArchiveBlob {
    pub file_name: String,
    pub bytes: Vec<u8>,
    pub entries: Vec<String>,
    /// Items left out because their payload did not decode
    pub skipped: Vec<String>,
}

impl ArchiveBlob {
    pub fn save_to(&self, dir: &Path) -> std::io::Result<PathBuf> {
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.bytes)?;
        Ok(path)
    }
}

pub fn entry_name(original_file_name: &str) -> String {
    format!("{}{}", ENTRY_PREFIX, original_file_name)
}

pub struct ArchiveExporter;

impl ArchiveExporter {
    /// Packs every successful processed image. Items that fail to decode are
    /// logged and skipped; only writing the archive itself can fail.
    pub fn export(results: &ResultsStore) -> Result<ArchiveBlob, PipelineError> {
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

        let mut entries = Vec::new();
        let mut skipped = Vec::new();

        for item in results.successful() {
            let bytes = match item.image.decode() {
                Ok(bytes) => bytes,
                Err(e) => {
                    let err = PipelineError::DecodeFailed {
                        file_name: item.original_file_name.to_string(),
                        reason: e.to_string(),
                    };
                    warn!("{}", err);
                    skipped.push(item.original_file_name.to_string());
                    continue;
                }
            };

            let name = entry_name(item.original_file_name);
            writer
                .start_file(name.clone(), options)
                .map_err(|e| PipelineError::ArchiveGenerationFailed(e.to_string()))?;
            writer
                .write_all(&bytes)
                .map_err(|e| PipelineError::ArchiveGenerationFailed(e.to_string()))?;
            entries.push(name);
        }

        let bytes = writer
            .finish()
            .map_err(|e| PipelineError::ArchiveGenerationFailed(e.to_string()))?
            .into_inner();

        info!(
            "🗜️  Archived {} processed images ({} skipped, {} bytes)",
            entries.len(),
            skipped.len(),
            bytes.len()
        );

        Ok(ArchiveBlob {
            file_name: ARCHIVE_FILE_NAME.to_string(),
            bytes,
            entries,
            skipped,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ProcessedImage, TransformResultItem};
    use crate::services::reconcile::BatchOutcome;
    use crate::store::Generation;
    use std::io::Read;

    fn ok(name: &str) -> TransformResultItem {
        TransformResultItem {
            original_file_name: name.to_string(),
            success: true,
            message: "ok".to_string(),
        }
    }

    fn store_with(processed: Vec<(String, ProcessedImage)>) -> ResultsStore {
        let names: Vec<String> = processed.iter().map(|(n, _)| n.clone()).collect();
        let mut store = ResultsStore::new();
        store
            .commit(BatchOutcome {
                ticket: Generation::new().ticket(),
                staging_order: names.clone(),
                results: names.iter().map(|n| ok(n)).collect(),
                processed,
            })
            .unwrap();
        store
    }

    #[test]
    fn test_undecodable_item_is_skipped() {
        let store = store_with(vec![
            ("good.png".into(), ProcessedImage::from_bytes(b"pixels")),
            ("bad.png".into(), ProcessedImage::from_base64("%%%not-base64%%%")),
        ]);

        let blob = ArchiveExporter::export(&store).unwrap();
        assert_eq!(blob.entries, vec!["processed_good.png"]);
        assert_eq!(blob.skipped, vec!["bad.png"]);

        let mut archive = zip::ZipArchive::new(Cursor::new(blob.bytes)).unwrap();
        assert_eq!(archive.len(), 1);
        let mut content = Vec::new();
        archive
            .by_name("processed_good.png")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"pixels");
    }

    #[test]
    fn test_empty_store_gives_empty_archive() {
        let blob = ArchiveExporter::export(&ResultsStore::new()).unwrap();
        assert_eq!(blob.file_name, "processed_images.zip");
        assert!(blob.entries.is_empty());
        let archive = zip::ZipArchive::new(Cursor::new(blob.bytes)).unwrap();
        assert_eq!(archive.len(), 0);
    }

    #[test]
    fn test_repeated_file_name_gives_single_entry() {
        let mut store = ResultsStore::new();
        store
            .commit(BatchOutcome {
                ticket: Generation::new().ticket(),
                staging_order: vec!["a.png".into(), "a.png".into(), "b.png".into()],
                results: vec![ok("a.png"), ok("a.png"), ok("b.png")],
                processed: vec![
                    ("a.png".into(), ProcessedImage::from_bytes(b"first")),
                    ("a.png".into(), ProcessedImage::from_bytes(b"second")),
                    ("b.png".into(), ProcessedImage::from_bytes(b"other")),
                ],
            })
            .unwrap();

        let blob = ArchiveExporter::export(&store).unwrap();
        assert_eq!(blob.entries, vec!["processed_a.png", "processed_b.png"]);

        let mut archive = zip::ZipArchive::new(Cursor::new(blob.bytes)).unwrap();
        assert_eq!(archive.len(), 2);
        let mut content = Vec::new();
        archive
            .by_name("processed_a.png")
            .unwrap()
            .read_to_end(&mut content)
            .unwrap();
        assert_eq!(content, b"second");
    }

    #[test]
    fn test_save_to_writes_archive_file() {
        let store = store_with(vec![("a.png".into(), ProcessedImage::from_bytes(b"pixels"))]);
        let blob = ArchiveExporter::export(&store).unwrap();

        let dir = std::env::temp_dir().join(format!("image-studio-{}", uuid::Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let path = blob.save_to(&dir).unwrap();

        assert_eq!(path, dir.join("processed_images.zip"));
        assert_eq!(std::fs::read(&path).unwrap(), blob.bytes);
        std::fs::remove_dir_all(&dir).unwrap();
    }
}
