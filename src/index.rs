//! # Reference Index Module
//!
//! Mappa run-scoped da immagine originale alle sue varianti generate.
//!
//! ## Responsabilità:
//! - Definisce `ImageVariant` e `ProcessedImage` (una per immagine originale)
//! - Raccoglie i risultati della generazione in `ReferenceIndex`
//! - Risolve un URL referenziato nei sorgenti all'immagine originale
//!
//! ## Ciclo di vita:
//! L'indice viene costruito dall'orchestratore durante la generazione e poi
//! passato come `&ReferenceIndex` a tutti i rewriter: dopo la costruzione è
//! di sola lettura. L'iterazione è ordinata per path (BTreeMap) così la
//! risoluzione per nome file è deterministica anche quando due originali
//! condividono lo stesso basename.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// One encoded, resized copy of an original image
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageVariant {
    pub format: String,
    pub width: u32,
    pub path: PathBuf,
    pub size: u64,
}

/// All variants generated for one original image
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessedImage {
    pub original: PathBuf,
    pub variants: Vec<ImageVariant>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub placeholder: Option<String>,
    pub aspect_ratio: f64,
    /// Size of the original file in bytes
    pub original_size: u64,
}

impl ProcessedImage {
    /// Largest generated width, if any variant exists
    pub fn widest_width(&self) -> Option<u32> {
        self.variants.iter().map(|v| v.width).max()
    }

    /// Bytes a wide viewport downloads: the smallest variant at the widest width.
    ///
    /// Falls back to the original size when no variant could be generated.
    pub fn delivered_size(&self) -> u64 {
        match self.widest_width() {
            Some(widest) => self
                .variants
                .iter()
                .filter(|v| v.width == widest)
                .map(|v| v.size)
                .min()
                .unwrap_or(self.original_size),
            None => self.original_size,
        }
    }
}

/// Original image path -> generated variant set
#[derive(Debug, Default, Clone, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ReferenceIndex {
    images: BTreeMap<PathBuf, ProcessedImage>,
}

impl ReferenceIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an image keyed by its original path, replacing any previous entry
    pub fn insert(&mut self, processed: ProcessedImage) {
        self.images.insert(processed.original.clone(), processed);
    }

    pub fn get(&self, original: &Path) -> Option<&ProcessedImage> {
        self.images.get(original)
    }

    pub fn len(&self) -> usize {
        self.images.len()
    }

    pub fn is_empty(&self) -> bool {
        self.images.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&PathBuf, &ProcessedImage)> {
        self.images.iter()
    }

    /// Resolve a referenced URL by file name containment.
    ///
    /// The first original (in path order) whose base file name occurs in
    /// `url` wins. Two originals sharing a base name in different
    /// directories are indistinguishable here; that ambiguity is accepted.
    pub fn find_by_filename(&self, url: &str) -> Option<&ProcessedImage> {
        self.images.iter().find_map(|(original, processed)| {
            let name = original.file_name()?.to_str()?;
            url.contains(name).then_some(processed)
        })
    }
}
