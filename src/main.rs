//! # Responsive Image Optimizer - Main Entry Point
//!
//! Questo è il punto di ingresso principale dell'applicazione.
//!
//! ## Responsabilità:
//! - Parsing degli argomenti della command line con `clap`
//! - Inizializzazione del sistema di logging con `tracing`
//! - Validazione degli input dell'utente
//! - Creazione della configurazione e avvio dell'optimizer
//!
//! ## Flusso di esecuzione:
//! 1. Parsa gli argomenti CLI (directory, sizes, formats, quality, workers, etc.)
//! 2. Carica la configurazione (file JSON opzionale + override da CLI)
//! 3. Configura il logging (INFO o DEBUG secondo `verbose` della config finale)
//! 4. Valida che la directory del progetto esista
//! 5. Istanzia ResponsiveOptimizer e avvia la pipeline
//!
//! ## Esempio di utilizzo:
//! ```bash
//! responsive-images ./my-site --sizes 320,640,1280 --formats webp,jpeg --quality 82 --verbose
//! ```

use anyhow::Result;
use clap::Parser;
use std::path::PathBuf;
use tracing::info;

use responsive_image_optimizer::{Config, ResponsiveOptimizer};

#[derive(Parser)]
#[command(name = "responsive-images")]
#[command(about = "Generate responsive image variants and rewrite stylesheet references")]
struct Args {
    /// Project directory containing images and stylesheets
    project_directory: PathBuf,

    /// Load configuration from a JSON file (CLI flags override it)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Write the effective configuration to a JSON file
    #[arg(long)]
    save_config: Option<PathBuf>,

    /// Target widths in pixels, comma separated
    #[arg(short, long, value_delimiter = ',')]
    sizes: Option<Vec<u32>>,

    /// Output formats (webp, jpeg, jpg, png), comma separated
    #[arg(short, long, value_delimiter = ',')]
    formats: Option<Vec<String>>,

    /// Encoding quality (1-100)
    #[arg(short, long)]
    quality: Option<u8>,

    /// Number of parallel workers
    #[arg(short, long)]
    workers: Option<usize>,

    /// Skip the blurred inline placeholder
    #[arg(long)]
    no_placeholder: bool,

    /// Do not rewrite markup and component references
    #[arg(long)]
    no_html: bool,

    /// Do not rewrite stylesheet references
    #[arg(long)]
    no_css: bool,

    /// Generate preload hints
    #[arg(long)]
    preload: bool,

    /// Print the final result as JSON on stdout
    #[arg(long)]
    json: bool,

    /// Verbose logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn apply(&self, mut config: Config) -> Config {
        if let Some(ref sizes) = self.sizes {
            config.generate_sizes = sizes.clone();
        }
        if let Some(ref formats) = self.formats {
            config.formats = formats.clone();
        }
        if let Some(quality) = self.quality {
            config.quality = quality;
        }
        if let Some(workers) = self.workers {
            config.workers = workers;
        }
        config.enable_blur_placeholder &= !self.no_placeholder;
        config.replace_html &= !self.no_html;
        config.replace_css &= !self.no_css;
        config.enable_preload |= self.preload;
        config.json_output |= self.json;
        config.verbose |= self.verbose;
        config
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let base = match args.config {
        Some(ref path) => Config::from_file(path).await?,
        None => Config::default(),
    };
    let config = args.apply(base);

    // Initialize logging (stderr, so JSON output on stdout stays clean)
    let subscriber = tracing_subscriber::fmt()
        .with_max_level(if config.verbose {
            tracing::Level::DEBUG
        } else {
            tracing::Level::INFO
        })
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)?;

    // Validate arguments
    if !args.project_directory.is_dir() {
        return Err(anyhow::anyhow!(
            "Project directory does not exist: {}",
            args.project_directory.display()
        ));
    }

    config.validate()?;

    if let Some(ref path) = args.save_config {
        config.save_to_file(path).await?;
        info!("Saved configuration to {}", path.display());
    }

    let json_output = config.json_output;
    let optimizer = ResponsiveOptimizer::new(config)?;
    let result = optimizer.optimize(&args.project_directory).await;

    if json_output {
        result.emit();
    }

    match result.error {
        Some(error) if !result.success => Err(anyhow::anyhow!(error)),
        _ => {
            if let Some(message) = result.message {
                info!("{}", message);
            }
            Ok(())
        }
    }
}
