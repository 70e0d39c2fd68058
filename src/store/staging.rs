use crate::config::StudioConfig;
use crate::models::{
    AspectRatio, Dimensions, ProcessingMethod, ProcessingOption, StagedFile, UpscaleFactor,
};
use crate::services::error::StagingError;
use crate::store::generation::{EpochTicket, Generation};
use crate::utils::image::{format_size_mb, probe_dimensions};
use crate::utils::validation::{detect_content_type, validate_content_type, validate_file_size};
use bytes::Bytes;
use tracing::{debug, warn};

/// Ordered collection of files the user picked, with their chosen options.
#[derive(Debug)]
pub struct StagingStore {
    files: Vec<StagedFile>,
    generation: Generation,
    max_file_size: usize,
    allowed_types: Vec<String>,
}

/// Copy of the staged files taken when a batch starts.
#[derive(Debug, Clone)]
pub struct StagingSnapshot {
    pub files: Vec<StagedFile>,
    pub ticket: EpochTicket,
}

impl StagingStore {
    pub fn new(config: &StudioConfig) -> Self {
        Self {
            files: Vec::new(),
            generation: Generation::new(),
            max_file_size: config.max_file_size,
            allowed_types: config.allowed_types.clone(),
        }
    }

    /// Validates and appends a file, returning its index.
    pub fn add_file(
        &mut self,
        file_name: impl Into<String>,
        payload: impl Into<Bytes>,
    ) -> Result<usize, StagingError> {
        let file_name = file_name.into();
        let payload = payload.into();

        validate_file_size(&file_name, payload.len(), self.max_file_size)?;
        let content_type = detect_content_type(&file_name, &payload);
        validate_content_type(&file_name, &content_type, &self.allowed_types)?;

        debug!(
            "Staged {} ({}, {} bytes)",
            file_name,
            content_type,
            payload.len()
        );
        self.files.push(StagedFile::new(file_name, content_type, payload));
        Ok(self.files.len() - 1)
    }

    pub fn files(&self) -> &[StagedFile] {
        &self.files
    }

    pub fn get(&self, index: usize) -> Option<&StagedFile> {
        self.files.get(index)
    }

    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn total_size_bytes(&self) -> u64 {
        self.files.iter().map(|f| f.size() as u64).sum()
    }

    pub fn total_size_mb(&self) -> String {
        format_size_mb(self.total_size_bytes())
    }

    fn file_mut(&mut self, index: usize) -> Result<&mut StagedFile, StagingError> {
        self.files
            .get_mut(index)
            .ok_or(StagingError::IndexOutOfRange(index))
    }

    pub fn set_dimensions(
        &mut self,
        index: usize,
        dimensions: Dimensions,
    ) -> Result<(), StagingError> {
        self.file_mut(index)?.dimensions = Some(dimensions);
        Ok(())
    }

    /// Reads the dimensions of one file from its payload and stores them.
    pub fn load_dimensions(&mut self, index: usize) -> Result<Dimensions, StagingError> {
        let file = self.file_mut(index)?;
        let dimensions =
            probe_dimensions(&file.payload).map_err(|e| StagingError::DimensionsUnavailable {
                file_name: file.original_file_name.clone(),
                reason: e.to_string(),
            })?;
        file.dimensions = Some(dimensions);
        Ok(dimensions)
    }

    /// Probes every file that has no dimensions yet. Unreadable files are
    /// logged and left without dimensions. Returns how many were resolved.
    pub fn resolve_dimensions(&mut self) -> usize {
        let mut resolved = 0;
        for index in 0..self.files.len() {
            if self.files[index].dimensions.is_some() {
                continue;
            }
            match self.load_dimensions(index) {
                Ok(_) => resolved += 1,
                Err(e) => warn!("Error loading image dimensions: {}", e),
            }
        }
        resolved
    }

    pub fn set_processing_option(
        &mut self,
        index: usize,
        option: Option<ProcessingOption>,
    ) -> Result<(), StagingError> {
        self.file_mut(index)?.processing_option = option;
        Ok(())
    }

    /// Selecting the current method clears it; any other method replaces the
    /// option with that method's defaults.
    pub fn toggle_method(
        &mut self,
        index: usize,
        method: ProcessingMethod,
    ) -> Result<(), StagingError> {
        let file = self.file_mut(index)?;
        file.processing_option = match file.processing_option {
            Some(current) if current.method() == method => None,
            _ => Some(ProcessingOption::default_for(method)),
        };
        Ok(())
    }

    /// Only applies to a file whose option is currently uncrop.
    pub fn set_aspect_ratio(
        &mut self,
        index: usize,
        ratio: AspectRatio,
    ) -> Result<(), StagingError> {
        let file = self.file_mut(index)?;
        if let Some(ProcessingOption::Uncrop { aspect_ratio }) = file.processing_option.as_mut() {
            *aspect_ratio = ratio;
        }
        Ok(())
    }

    /// Only applies to a file whose option is currently upscale.
    pub fn set_upscale_factor(
        &mut self,
        index: usize,
        new_factor: UpscaleFactor,
    ) -> Result<(), StagingError> {
        let file = self.file_mut(index)?;
        if let Some(ProcessingOption::Upscale { factor }) = file.processing_option.as_mut() {
            *factor = new_factor;
        }
        Ok(())
    }

    /// Only applies to a file whose option is currently square.
    pub fn set_square_target_res(
        &mut self,
        index: usize,
        resolution: Option<u32>,
    ) -> Result<(), StagingError> {
        let file = self.file_mut(index)?;
        if let Some(ProcessingOption::Square { target_res }) = file.processing_option.as_mut() {
            *target_res = resolution;
        }
        Ok(())
    }

    pub fn has_any_option(&self) -> bool {
        self.files.iter().any(|f| f.processing_option.is_some())
    }

    /// True when every staged file has an option chosen.
    pub fn has_valid_options(&self) -> bool {
        self.files.iter().all(|f| f.processing_option.is_some())
    }

    pub fn remove(&mut self, index: usize) -> Result<StagedFile, StagingError> {
        if index >= self.files.len() {
            return Err(StagingError::IndexOutOfRange(index));
        }
        Ok(self.files.remove(index))
    }

    /// Drops every staged file and invalidates batches already in flight.
    pub fn reset(&mut self) {
        self.files.clear();
        self.generation.advance();
    }

    /// Handle that can cancel in-flight batches without borrowing the store.
    pub fn generation(&self) -> Generation {
        self.generation.clone()
    }

    pub fn snapshot(&self) -> StagingSnapshot {
        StagingSnapshot {
            files: self.files.clone(),
            ticket: self.generation.ticket(),
        }
    }
}
