//! # Responsive Image Optimizer Library
//!
//! Questo è il modulo principale della libreria che espone tutte le API pubbliche.
//!
//! ## Responsabilità:
//! - Definisce la struttura modulare dell'applicazione
//! - Espone i tipi e le funzioni principali tramite re-exports
//! - Fornisce un'interfaccia pulita per il main.rs e per host esterni
//!
//! ## Architettura dei moduli:
//! - `config`: Gestione configurazione e validazione parametri
//! - `error`: Tipi di errore custom per generazione e riscrittura
//! - `file_manager`: Discovery di immagini e fogli di stile
//! - `image_processor`: Generazione varianti (formato × larghezza) e placeholder
//! - `index`: Reference Index, originale → varianti
//! - `css_rewriter`: Riscrittura `background-image` in cascate responsive
//! - `rewriter`: Trait per rewriter di markup e generatori di asset
//! - `manifest`: Persistenza JSON dell'indice
//! - `optimizer`: Orchestratore principale del processo
//! - `progress`: Progress tracking e statistiche
//! - `json_output`: Forma del risultato ed emissione JSON
//!
//! ## Utilizzo:
//! ```ignore
//! use responsive_image_optimizer::{Config, ResponsiveOptimizer};
//!
//! let optimizer = ResponsiveOptimizer::new(Config::default())?;
//! let result = optimizer.optimize(&project_root).await;
//! ```

pub mod config;
pub mod css_rewriter;
pub mod error;
pub mod file_manager;
pub mod image_processor;
pub mod index;
pub mod json_output;
pub mod manifest;
pub mod optimizer;
pub mod progress;
pub mod rewriter;

pub use config::Config;
pub use css_rewriter::CssRewriter;
pub use error::OptimizeError;
pub use image_processor::ImageProcessor;
pub use index::{ImageVariant, ProcessedImage, ReferenceIndex};
pub use json_output::OptimizationResult;
pub use optimizer::ResponsiveOptimizer;
pub use rewriter::{AssetGenerator, ReferenceRewriter};
