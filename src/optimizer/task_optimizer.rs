//! # Task Optimizer Module
//!
//! Worker per la generazione delle varianti di una singola immagine.
//! Separato dall'orchestratore principale per maggiore modularità.

use crate::{
    config::Config,
    error::{OptimizeError, OptimizeResult},
    image_processor::ImageProcessor,
    index::ProcessedImage,
};
use std::path::PathBuf;
use tracing::{debug, warn};

/// Risultato della generazione per una immagine
#[derive(Debug)]
pub struct ImageOutcome {
    pub processed: ProcessedImage,
    /// Placeholder failure; the variants are still valid
    pub placeholder_error: Option<OptimizeError>,
}

impl ImageOutcome {
    /// Combine generated variants with the placeholder attempt, if any.
    ///
    /// A failed placeholder is recorded but never discards the variants.
    pub fn new(mut processed: ProcessedImage, placeholder: Option<OptimizeResult<String>>) -> Self {
        let placeholder_error = match placeholder {
            Some(Ok(data_uri)) => {
                processed.placeholder = Some(data_uri);
                None
            }
            Some(Err(e)) => {
                warn!("Placeholder skipped for {}: {}", processed.original.display(), e);
                Some(e)
            }
            None => None,
        };

        Self {
            processed,
            placeholder_error,
        }
    }
}

/// Worker per elaborazione singole immagini
#[derive(Debug, Clone)]
pub struct TaskOptimizer {
    pub config: Config,
    pub image_processor: ImageProcessor,
}

impl TaskOptimizer {
    /// Crea nuovo task optimizer
    pub fn new(config: Config) -> Self {
        Self {
            config,
            image_processor: ImageProcessor::new(),
        }
    }

    /// Genera varianti (e placeholder se abilitato) per una immagine
    pub async fn process_single_image(&self, image_path: PathBuf) -> OptimizeResult<ImageOutcome> {
        let processed = self
            .image_processor
            .process(
                &image_path,
                &self.config.generate_sizes,
                &self.config.formats,
                self.config.quality,
            )
            .await?;
        debug!(
            "Generated {} variants for {}",
            processed.variants.len(),
            image_path.display()
        );

        let placeholder = if self.config.enable_blur_placeholder {
            Some(self.image_processor.create_placeholder(&image_path).await)
        } else {
            None
        };

        Ok(ImageOutcome::new(processed, placeholder))
    }
}
