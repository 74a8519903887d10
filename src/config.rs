//! # Configuration Management Module
//!
//! Questo modulo gestisce tutta la configurazione di una run di ottimizzazione.
//!
//! ## Responsabilità:
//! - Definisce la struct `Config` con tutti i parametri di generazione e riscrittura
//! - Fornisce validazione robusta dei parametri di input
//! - Supporta caricamento/salvataggio configurazione da/verso file JSON
//! - Fornisce valori di default sensati per tutti i parametri
//!
//! ## Parametri di configurazione:
//! - `generate_sizes`: Larghezze target in pixel (default: 320, 640, 1024, 1920)
//! - `formats`: Formati di output (default: webp, jpeg)
//! - `quality`: Qualità di encoding (1-100, default: 80)
//! - `enable_blur_placeholder`: Genera placeholder sfocato inline (default: true)
//! - `replace_html`: Riscrive riferimenti in markup e componenti (default: true)
//! - `replace_css`: Riscrive `background-image` nei fogli di stile (default: true)
//! - `enable_preload`: Genera preload hints (default: false)
//! - `verbose`: Logging dettagliato (default: false)
//! - `workers`: Numero di worker paralleli per la generazione (default: 4)
//! - `json_output`: Risultato finale in JSON su stdout (default: false)
//!
//! ## Validazione:
//! - Controlla che quality sia 1-100
//! - Controlla che ci sia almeno una larghezza e che siano tutte > 0
//! - Controlla che ci sia almeno un formato
//! - Controlla che workers sia > 0
//!
//! ## Esempio:
//! ```ignore
//! let config = Config {
//!     generate_sizes: vec![480, 960],
//!     formats: vec!["webp".to_string()],
//!     ..Default::default()
//! };
//! config.validate()?;
//! ```

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Configuration for a responsive image run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Target pixel widths
    pub generate_sizes: Vec<u32>,
    /// Output format identifiers (webp, jpeg, jpg, png)
    pub formats: Vec<String>,
    /// Encoding quality (1-100)
    pub quality: u8,
    /// Attach a blurred inline placeholder to each image
    pub enable_blur_placeholder: bool,
    /// Run the markup and component rewriters
    pub replace_html: bool,
    /// Run the stylesheet rewriter
    pub replace_css: bool,
    /// Run the preload generators
    pub enable_preload: bool,
    /// Verbose logging
    pub verbose: bool,
    /// Number of parallel workers
    pub workers: usize,
    /// Output the final result as JSON for programmatic use
    pub json_output: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            generate_sizes: vec![320, 640, 1024, 1920],
            formats: vec!["webp".to_string(), "jpeg".to_string()],
            quality: 80,
            enable_blur_placeholder: true,
            replace_html: true,
            replace_css: true,
            enable_preload: false,
            verbose: false,
            workers: 4,
            json_output: false,
        }
    }
}

impl Config {
    /// Validate configuration parameters
    pub fn validate(&self) -> Result<()> {
        if self.quality == 0 || self.quality > 100 {
            return Err(anyhow::anyhow!("Quality must be between 1 and 100"));
        }

        if self.generate_sizes.is_empty() {
            return Err(anyhow::anyhow!("At least one target width is required"));
        }

        if self.generate_sizes.iter().any(|&width| width == 0) {
            return Err(anyhow::anyhow!("Target widths must be greater than 0"));
        }

        if self.formats.is_empty() {
            return Err(anyhow::anyhow!("At least one output format is required"));
        }

        if self.workers == 0 {
            return Err(anyhow::anyhow!("Number of workers must be greater than 0"));
        }

        Ok(())
    }

    /// Load configuration from file
    pub async fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = tokio::fs::read_to_string(path).await?;
        let config: Config = serde_json::from_str(&content)?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub async fn save_to_file(&self, path: &Path) -> Result<()> {
        let content = serde_json::to_string_pretty(self)?;
        tokio::fs::write(path, content).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_validation() {
        let mut config = Config::default();
        assert!(config.validate().is_ok());

        config.quality = 0;
        assert!(config.validate().is_err());

        config.quality = 80;
        config.generate_sizes = vec![];
        assert!(config.validate().is_err());

        config.generate_sizes = vec![320, 0];
        assert!(config.validate().is_err());

        config.generate_sizes = vec![320];
        config.formats = vec![];
        assert!(config.validate().is_err());

        config.formats = vec!["webp".to_string()];
        config.workers = 0;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.generate_sizes, vec![320, 640, 1024, 1920]);
        assert_eq!(config.formats, vec!["webp", "jpeg"]);
        assert_eq!(config.quality, 80);
        assert!(config.enable_blur_placeholder);
        assert!(config.replace_html);
        assert!(config.replace_css);
        assert!(!config.enable_preload);
        assert_eq!(config.workers, 4);
    }

    #[tokio::test]
    async fn test_config_save_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");

        let original_config = Config {
            generate_sizes: vec![480, 960],
            formats: vec!["png".to_string()],
            quality: 90,
            enable_preload: true,
            workers: 8,
            ..Default::default()
        };

        original_config.save_to_file(&config_path).await.unwrap();
        let loaded_config = Config::from_file(&config_path).await.unwrap();

        assert_eq!(loaded_config.generate_sizes, vec![480, 960]);
        assert_eq!(loaded_config.formats, vec!["png"]);
        assert_eq!(loaded_config.quality, 90);
        assert!(loaded_config.enable_preload);
        assert_eq!(loaded_config.workers, 8);
    }

    #[tokio::test]
    async fn test_partial_config_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.json");
        tokio::fs::write(&config_path, r#"{ "quality": 70 }"#).await.unwrap();

        let loaded = Config::from_file(&config_path).await.unwrap();
        assert_eq!(loaded.quality, 70);
        assert_eq!(loaded.generate_sizes, Config::default().generate_sizes);
    }

    #[tokio::test]
    async fn test_missing_config_file_gives_default() {
        let temp_dir = TempDir::new().unwrap();
        let loaded = Config::from_file(&temp_dir.path().join("absent.json")).await.unwrap();
        assert_eq!(loaded.quality, 80);
    }
}
