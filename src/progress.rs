//! # Progress Tracking and Statistics Module
//!
//! Questo modulo gestisce il progress tracking della fase di generazione e
//! le statistiche aggregate della run.
//!
//! ## Componenti principali:
//! - `ProgressManager`: progress bar `indicatif` (una tacca per immagine)
//! - `GenerationStats`: immagini processate/fallite, varianti scritte, byte
//!
//! ## Statistiche tracciate:
//! - **images_processed**: immagini entrate nell'indice
//! - **images_failed**: immagini saltate per errore di generazione
//! - **variants_written**: varianti scritte su disco
//! - **placeholders_failed**: placeholder non generati (immagine comunque tenuta)
//! - **total_original_size** / **total_delivered_size**: base per la riduzione misurata
//!
//! ## Visual feedback:
//! ```text
//! ⠋ [00:00:04] [========================================] 12/12 (100%) [OK] hero.jpg: 8 variants
//! ```

use crate::file_manager::FileManager;
use crate::index::ProcessedImage;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Manages progress reporting for variant generation
#[derive(Clone)]
pub struct ProgressManager {
    bar: ProgressBar,
}

impl ProgressManager {
    /// Create a progress bar; hidden when `visible` is false (JSON mode, tests)
    pub fn new(total_images: u64, visible: bool) -> Self {
        if !visible {
            return Self {
                bar: ProgressBar::hidden(),
            };
        }

        let bar = ProgressBar::new(total_images);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap()
                .progress_chars("=>-"),
        );
        bar.enable_steady_tick(Duration::from_millis(100));

        Self { bar }
    }

    /// Advance by one image with a message
    pub fn update(&self, message: &str) {
        self.bar.inc(1);
        self.bar.set_message(message.to_string());
    }

    /// Finish with a final message
    pub fn finish(&self, message: &str) {
        self.bar.finish_with_message(message.to_string());
    }
}

/// Statistics for the generation phase
#[derive(Debug, Default, Clone)]
pub struct GenerationStats {
    pub images_processed: usize,
    pub images_failed: usize,
    pub variants_written: usize,
    pub placeholders_failed: usize,
    pub total_original_size: u64,
    pub total_delivered_size: u64,
}

impl GenerationStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_processed(&mut self, processed: &ProcessedImage) {
        self.images_processed += 1;
        self.variants_written += processed.variants.len();
        self.total_original_size += processed.original_size;
        self.total_delivered_size += processed.delivered_size();
    }

    pub fn add_error(&mut self) {
        self.images_failed += 1;
    }

    pub fn add_placeholder_error(&mut self) {
        self.placeholders_failed += 1;
    }

    /// Measured reduction of bytes a wide viewport downloads
    pub fn reduction_percent(&self) -> f64 {
        FileManager::calculate_reduction(self.total_original_size, self.total_delivered_size)
    }

    pub fn format_summary(&self) -> String {
        format!(
            "Images: {} | Variants: {} | Failed: {} | Originals: {} | Delivered: {} ({:.2}% smaller)",
            self.images_processed,
            self.variants_written,
            self.images_failed,
            FileManager::format_size(self.total_original_size),
            FileManager::format_size(self.total_delivered_size),
            self.reduction_percent()
        )
    }
}
