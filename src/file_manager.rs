//! # File Management Module
//!
//! Questo modulo gestisce la discovery dei file del progetto.
//!
//! ## Responsabilità:
//! - Discovery ricorsiva delle immagini originali da ottimizzare
//! - Discovery dei fogli di stile da riscrivere
//! - Esclusione delle directory di dipendenze e build output
//! - Utilità per calcoli dimensioni e percentuali
//!
//! ## Formati supportati:
//! - **Immagini**: JPG, JPEG, PNG, WebP
//! - **Fogli di stile**: CSS, SCSS, Sass, Less
//!
//! ## Directory escluse:
//! `node_modules`, `dist`, `build` (e le directory nascoste come `.git`)
//!
//! ## Varianti già generate:
//! Le immagini il cui nome termina con `-<N>w` sono output di una run
//! precedente: `find_images()` le salta, `find_all_images()` le include.
//!
//! ## Esempio:
//! ```ignore
//! let images = FileManager::find_images(project_root)?;
//! if images.is_empty() {
//!     // nothing to optimize
//! }
//! ```

use crate::optimizer::path_resolver::PathResolver;
use anyhow::Result;
use std::path::{Path, PathBuf};
use walkdir::{DirEntry, WalkDir};

/// Directories never scanned
pub const EXCLUDED_DIRS: &[&str] = &["node_modules", "dist", "build"];

/// Token identifying a previously processed project
const PROCESSED_MARKER: &str = "-320w.";

/// Manages file discovery
pub struct FileManager;

impl FileManager {
    /// Find original images (generated variants excluded)
    pub fn find_images(root: &Path) -> Result<Vec<PathBuf>> {
        Ok(Self::find_all_images(root)?
            .into_iter()
            .filter(|path| !PathResolver::is_variant(path))
            .collect())
    }

    /// Find every supported image, including generated variants
    pub fn find_all_images(root: &Path) -> Result<Vec<PathBuf>> {
        Self::find_files(root, Self::is_image)
    }

    /// Find stylesheets to rewrite
    pub fn find_stylesheets(root: &Path) -> Result<Vec<PathBuf>> {
        Self::find_files(root, Self::is_stylesheet)
    }

    /// True if the project contains at least one original image
    pub fn has_images(root: &Path) -> bool {
        Self::find_images(root).map(|images| !images.is_empty()).unwrap_or(false)
    }

    /// True if a previous run already produced variants
    pub fn has_processed_images(root: &Path) -> bool {
        Self::find_all_images(root)
            .map(|images| {
                images
                    .iter()
                    .any(|path| path.to_string_lossy().contains(PROCESSED_MARKER))
            })
            .unwrap_or(false)
    }

    fn find_files(root: &Path, accept: fn(&Path) -> bool) -> Result<Vec<PathBuf>> {
        if !root.is_dir() {
            return Err(anyhow::anyhow!("Project directory does not exist: {}", root.display()));
        }

        let mut files = Vec::new();

        for entry in WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| e.depth() == 0 || !Self::is_excluded_dir(e))
            .filter_map(|e| e.ok())
            .filter(|e| e.file_type().is_file())
        {
            let path = entry.path();
            if accept(path) {
                files.push(path.to_path_buf());
            }
        }

        Ok(files)
    }

    fn is_excluded_dir(entry: &DirEntry) -> bool {
        if !entry.file_type().is_dir() {
            return false;
        }
        let name = entry.file_name().to_string_lossy();
        name.starts_with('.') || EXCLUDED_DIRS.contains(&name.as_ref())
    }

    /// Check if a file is a supported raster image
    pub fn is_image(path: &Path) -> bool {
        Self::extension_in(path, &["jpg", "jpeg", "png", "webp"])
    }

    /// Check if a file is a stylesheet
    pub fn is_stylesheet(path: &Path) -> bool {
        Self::extension_in(path, &["css", "scss", "sass", "less"])
    }

    fn extension_in(path: &Path, extensions: &[&str]) -> bool {
        if let Some(ext) = path.extension() {
            let ext_lower = ext.to_string_lossy().to_lowercase();
            extensions.contains(&ext_lower.as_str())
        } else {
            false
        }
    }

    /// Get human-readable file size
    pub fn format_size(size: u64) -> String {
        const UNITS: &[&str] = &["B", "KB", "MB", "GB", "TB"];
        let mut size = size as f64;
        let mut unit_index = 0;

        while size >= 1024.0 && unit_index < UNITS.len() - 1 {
            size /= 1024.0;
            unit_index += 1;
        }

        if unit_index == 0 {
            format!("{} {}", size as u64, UNITS[unit_index])
        } else {
            format!("{:.2} {}", size, UNITS[unit_index])
        }
    }

    /// Calculate percentage reduction (never negative)
    pub fn calculate_reduction(original_size: u64, new_size: u64) -> f64 {
        if original_size == 0 {
            0.0
        } else {
            (((original_size as f64 - new_size as f64) / original_size as f64) * 100.0).max(0.0)
        }
    }
}
