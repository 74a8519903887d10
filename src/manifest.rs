//! # Manifest Module
//!
//! Questo modulo persiste il `ReferenceIndex` di una run su file JSON.
//!
//! ## Responsabilità:
//! - Serializza tutte le immagini processate con le loro varianti
//! - Salva il manifest nella root del progetto (`image-manifest.json`)
//! - Ricarica un manifest esistente (per tool esterni o run successive)
//!
//! ## Esempio struttura manifest:
//! ```json
//! {
//!   "generated_at": 1642680000,
//!   "images": {
//!     "/project/img/hero.jpg": {
//!       "original": "/project/img/hero.jpg",
//!       "variants": [
//!         { "format": "webp", "width": 320, "path": "/project/img/hero-320w.webp", "size": 10240 }
//!       ],
//!       "aspect_ratio": 1.5,
//!       "original_size": 524288
//!     }
//!   }
//! }
//! ```

use crate::error::OptimizeResult;
use crate::index::ReferenceIndex;
use crate::rewriter::AssetGenerator;
use futures::future::BoxFuture;
use futures::FutureExt;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::SystemTime;
use tokio::fs;
use tracing::info;

pub const MANIFEST_FILE_NAME: &str = "image-manifest.json";

/// Manifest file contents
#[derive(Debug, Serialize, Deserialize, Default)]
pub struct ImageManifest {
    pub generated_at: u64,
    pub images: ReferenceIndex,
}

/// Writes the index of a run next to the project sources
#[derive(Debug, Default, Clone)]
pub struct ManifestWriter;

impl ManifestWriter {
    pub fn new() -> Self {
        Self
    }

    /// Path of the manifest for a project
    pub fn manifest_path(project_root: &Path) -> PathBuf {
        project_root.join(MANIFEST_FILE_NAME)
    }

    /// Save the index as the project's manifest
    pub async fn create(&self, project_root: &Path, index: &ReferenceIndex) -> OptimizeResult<PathBuf> {
        let manifest = ImageManifest {
            generated_at: SystemTime::now()
                .duration_since(SystemTime::UNIX_EPOCH)
                .map(|d| d.as_secs())
                .unwrap_or_default(),
            images: index.clone(),
        };

        let path = Self::manifest_path(project_root);
        let content = serde_json::to_string_pretty(&manifest)?;
        fs::write(&path, content).await?;

        info!("Wrote image manifest: {} ({} images)", path.display(), index.len());
        Ok(path)
    }

    /// Load a previously written manifest
    pub async fn load(project_root: &Path) -> OptimizeResult<ImageManifest> {
        let content = fs::read_to_string(Self::manifest_path(project_root)).await?;
        Ok(serde_json::from_str(&content)?)
    }
}

impl AssetGenerator for ManifestWriter {
    fn name(&self) -> &str {
        "manifest"
    }

    fn generate<'a>(
        &'a self,
        project_root: &'a Path,
        index: &'a ReferenceIndex,
    ) -> BoxFuture<'a, anyhow::Result<()>> {
        async move {
            self.create(project_root, index).await?;
            Ok(())
        }
        .boxed()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ImageVariant, ProcessedImage};
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_manifest_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let original = temp_dir.path().join("hero.jpg");

        let mut index = ReferenceIndex::new();
        index.insert(ProcessedImage {
            original: original.clone(),
            variants: vec![ImageVariant {
                format: "webp".to_string(),
                width: 320,
                path: temp_dir.path().join("hero-320w.webp"),
                size: 1234,
            }],
            placeholder: Some("data:image/jpeg;base64,AAAA".to_string()),
            aspect_ratio: 1.5,
            original_size: 9999,
        });

        let path = ManifestWriter::new().create(temp_dir.path(), &index).await.unwrap();
        assert_eq!(path, temp_dir.path().join(MANIFEST_FILE_NAME));

        let loaded = ManifestWriter::load(temp_dir.path()).await.unwrap();
        assert!(loaded.generated_at > 0);
        assert_eq!(loaded.images.len(), 1);

        let entry = loaded.images.get(&original).unwrap();
        assert_eq!(entry.variants[0].size, 1234);
        assert_eq!(entry.placeholder.as_deref(), Some("data:image/jpeg;base64,AAAA"));
        assert_eq!(entry.original_size, 9999);
    }

    #[tokio::test]
    async fn test_load_missing_manifest_fails() {
        let temp_dir = TempDir::new().unwrap();
        assert!(ManifestWriter::load(temp_dir.path()).await.is_err());
    }
}
