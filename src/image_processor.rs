//! # Image Processing Module
//!
//! Questo modulo genera le varianti responsive di una singola immagine.
//!
//! ## Responsabilità:
//! - Decodifica l'immagine originale e ne legge le dimensioni intrinseche
//! - Produce una variante per ogni coppia (formato, larghezza) ammessa
//! - Scrive le varianti accanto all'originale con naming idempotente
//! - Crea il placeholder sfocato inline (data URI)
//!
//! ## Regole di generazione:
//! - **Mai upscaling**: le larghezze maggiori di quella intrinseca vengono saltate
//! - **Nessun duplicato**: larghezze e formati ripetuti vengono collassati
//! - **Dimensione reale**: `size` viene riletta dal file scritto, mai stimata
//! - **Aspect ratio**: width / height dell'originale, 1.0 se non disponibile
//!
//! ## Formati supportati
//!
//! | Formato | Encoder                        | Quality |
//! |---------|--------------------------------|---------|
//! | webp    | `WebPEncoder` lossless          | ignorata |
//! | jpeg/jpg| `JpegEncoder::new_with_quality` | 1-100   |
//! | png     | `PngEncoder`                    | ignorata |
//!
//! ## Concorrenza
//!
//! Decodifica, resize ed encoding sono CPU-bound: girano su
//! `tokio::task::spawn_blocking` così da non bloccare il runtime.
//! L'I/O su disco usa `tokio::fs`.
//!
//! ## Esempio:
//! ```ignore
//! let processor = ImageProcessor::new();
//! let processed = processor
//!     .process(&path, &[320, 640], &["webp".to_string()], 80)
//!     .await?;
//! ```

use crate::error::{OptimizeError, OptimizeResult};
use crate::index::{ImageVariant, ProcessedImage};
use crate::optimizer::path_resolver::PathResolver;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::codecs::webp::WebPEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;

/// Width of the inline placeholder in pixels
pub const PLACEHOLDER_WIDTH: u32 = 20;
const PLACEHOLDER_BLUR_SIGMA: f32 = 2.5;
const PLACEHOLDER_QUALITY: u8 = 60;

/// Output encodings a variant can be written in
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    WebP,
    Jpeg,
    Png,
}

impl OutputFormat {
    /// Parse a format identifier (case-insensitive)
    pub fn from_identifier(format: &str) -> Option<Self> {
        match format.to_lowercase().as_str() {
            "webp" => Some(Self::WebP),
            "jpeg" | "jpg" => Some(Self::Jpeg),
            "png" => Some(Self::Png),
            _ => None,
        }
    }

    /// Encode an image into memory
    pub fn encode(&self, image: &DynamicImage, quality: u8) -> Result<Vec<u8>, ImageError> {
        let mut buffer = Vec::new();
        match self {
            // Lossless only: the pure-Rust encoder has no quality setting
            Self::WebP => DynamicImage::ImageRgba8(image.to_rgba8())
                .write_with_encoder(WebPEncoder::new_lossless(&mut buffer))?,
            // JPEG has no alpha channel
            Self::Jpeg => DynamicImage::ImageRgb8(image.to_rgb8())
                .write_with_encoder(JpegEncoder::new_with_quality(&mut buffer, quality.clamp(1, 100)))?,
            Self::Png => image.write_with_encoder(PngEncoder::new(&mut buffer))?,
        }
        Ok(buffer)
    }
}

/// Generates responsive variants and placeholders for single images
#[derive(Debug, Default, Clone)]
pub struct ImageProcessor;

impl ImageProcessor {
    pub fn new() -> Self {
        Self
    }

    /// Generate every (format, width) variant the original is wide enough for.
    ///
    /// Formats are validated before anything is decoded or written, so an
    /// unknown identifier never leaves partial output behind.
    pub async fn process(
        &self,
        image_path: &Path,
        sizes: &[u32],
        formats: &[String],
        quality: u8,
    ) -> OptimizeResult<ProcessedImage> {
        let formats = Self::resolve_formats(formats)?;
        let sizes = dedup(sizes.iter().copied());

        let original_size = tokio::fs::metadata(image_path)
            .await
            .map_err(|e| OptimizeError::ImageRead {
                path: image_path.to_path_buf(),
                source: ImageError::IoError(e),
            })?
            .len();

        let image = Arc::new(Self::decode(image_path.to_path_buf()).await?);
        let (width, height) = (image.width(), image.height());
        debug!("Decoded {} ({}x{})", image_path.display(), width, height);

        let mut variants = Vec::new();
        for (identifier, format) in &formats {
            for &target_width in &sizes {
                if target_width > width {
                    debug!(
                        "Skipping {}w for {}: wider than original ({}px)",
                        target_width,
                        image_path.display(),
                        width
                    );
                    continue;
                }

                let variant = self
                    .create_variant(image_path, image.clone(), target_width, identifier, *format, quality)
                    .await?;
                variants.push(variant);
            }
        }

        Ok(ProcessedImage {
            original: image_path.to_path_buf(),
            variants,
            placeholder: None,
            aspect_ratio: Self::calculate_aspect_ratio(width, height),
            original_size,
        })
    }

    /// Create a tiny blurred JPEG preview as an embeddable data URI
    pub async fn create_placeholder(&self, image_path: &Path) -> OptimizeResult<String> {
        let path = image_path.to_path_buf();
        let placeholder_error = |reason: String| OptimizeError::Placeholder {
            path: path.clone(),
            reason,
        };

        let image = Self::decode(path.clone())
            .await
            .map_err(|e| placeholder_error(e.to_string()))?;

        let encoded = tokio::task::spawn_blocking(move || {
            let height = scaled_height(image.width(), image.height(), PLACEHOLDER_WIDTH);
            let preview = image
                .resize_exact(PLACEHOLDER_WIDTH, height, FilterType::Triangle)
                .blur(PLACEHOLDER_BLUR_SIGMA);
            OutputFormat::Jpeg.encode(&preview, PLACEHOLDER_QUALITY)
        })
        .await
        .map_err(|e| placeholder_error(e.to_string()))?
        .map_err(|e| placeholder_error(e.to_string()))?;

        Ok(format!(
            "data:image/jpeg;base64,{}",
            base64::engine::general_purpose::STANDARD.encode(&encoded)
        ))
    }

    async fn create_variant(
        &self,
        image_path: &Path,
        image: Arc<DynamicImage>,
        width: u32,
        identifier: &str,
        format: OutputFormat,
        quality: u8,
    ) -> OptimizeResult<ImageVariant> {
        let output_path = PathResolver::variant_path(image_path, width, identifier);

        let encoded = tokio::task::spawn_blocking(move || {
            let height = scaled_height(image.width(), image.height(), width);
            let resized = image.resize_exact(width, height, FilterType::Lanczos3);
            format.encode(&resized, quality)
        })
        .await
        .map_err(|e| OptimizeError::Encode {
            path: output_path.clone(),
            source: ImageError::IoError(std::io::Error::other(e)),
        })?
        .map_err(|source| OptimizeError::Encode {
            path: output_path.clone(),
            source,
        })?;

        let write_error = |source: std::io::Error| OptimizeError::Write {
            path: output_path.clone(),
            source,
        };
        tokio::fs::write(&output_path, &encoded).await.map_err(write_error)?;
        let size = tokio::fs::metadata(&output_path).await.map_err(write_error)?.len();

        debug!("Wrote {} ({} bytes)", output_path.display(), size);

        Ok(ImageVariant {
            format: identifier.to_string(),
            width,
            path: output_path,
            size,
        })
    }

    async fn decode(path: PathBuf) -> OptimizeResult<DynamicImage> {
        let read_path = path.clone();
        tokio::task::spawn_blocking(move || -> Result<DynamicImage, ImageError> {
            ImageReader::open(&read_path)?.with_guessed_format()?.decode()
        })
        .await
        .map_err(|e| OptimizeError::ImageRead {
            path: path.clone(),
            source: ImageError::IoError(std::io::Error::other(e)),
        })?
        .map_err(|source| OptimizeError::ImageRead { path, source })
    }

    fn resolve_formats(formats: &[String]) -> OptimizeResult<Vec<(String, OutputFormat)>> {
        dedup(formats.iter().map(|f| f.to_lowercase()))
            .into_iter()
            .map(|identifier| match OutputFormat::from_identifier(&identifier) {
                Some(format) => Ok((identifier, format)),
                None => Err(OptimizeError::UnsupportedFormat(identifier)),
            })
            .collect()
    }

    fn calculate_aspect_ratio(width: u32, height: u32) -> f64 {
        if width == 0 || height == 0 {
            return 1.0;
        }
        width as f64 / height as f64
    }
}

/// Height preserving aspect ratio at `target_width`, never below 1
fn scaled_height(width: u32, height: u32, target_width: u32) -> u32 {
    if width == 0 {
        return height.max(1);
    }
    let scaled = (height as f64 * target_width as f64 / width as f64).round() as u32;
    scaled.max(1)
}

/// Drop repeated items, keeping first occurrence order
fn dedup<T: PartialEq>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut unique = Vec::new();
    for item in items {
        if !unique.contains(&item) {
            unique.push(item);
        }
    }
    unique
}
