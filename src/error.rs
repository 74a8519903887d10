//! # Error Types Module
//!
//! Questo modulo definisce tutti i tipi di errore custom della pipeline.
//!
//! ## Responsabilità:
//! - Definisce `OptimizeError` enum per categorizzare tutti gli errori possibili
//! - Mantiene il path del file coinvolto per messaggi utili al debugging
//! - Integra con `thiserror` per automatic error conversion
//! - Supporta error chaining (`source`) per mantenere il contesto
//!
//! ## Categorie di errori:
//! - **Generazione varianti** (per immagine): `ImageRead`, `UnsupportedFormat`, `Encode`, `Write`
//! - **Placeholder**: `Placeholder` (non blocca le varianti)
//! - **Riscrittura riferimenti** (per file): `FileRead`, `FileWrite`
//! - **Orchestrazione**: `ProcessingAborted` (nessuna immagine trovata)
//! - **Manifest**: `Manifest` (serializzazione JSON)
//!
//! ## Esempio:
//! ```ignore
//! let format = OutputFormat::from_identifier(&identifier)
//!     .ok_or_else(|| OptimizeError::UnsupportedFormat(identifier.clone()))?;
//! ```

use std::path::PathBuf;

/// Custom error types for responsive image optimization
#[derive(thiserror::Error, Debug)]
pub enum OptimizeError {
    #[error("Failed to read image {path}: {source}")]
    ImageRead {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Unsupported output format: {0}")]
    UnsupportedFormat(String),

    #[error("Failed to encode variant {path}: {source}")]
    Encode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to write variant {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to create placeholder for {path}: {reason}")]
    Placeholder { path: PathBuf, reason: String },

    #[error("Failed to read {path}: {source}")]
    FileRead {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    FileWrite {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("{0}")]
    ProcessingAborted(String),

    #[error("Manifest error: {0}")]
    Manifest(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type OptimizeResult<T> = std::result::Result<T, OptimizeError>;
