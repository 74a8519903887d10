//! # Responsive Optimizer Main Orchestrator
//!
//! Orchestratore principale: sequenzia generazione, riscrittura dei
//! riferimenti e generazione degli asset ausiliari.
//!
//! ## Flusso di esecuzione:
//! 1. **Discovery**: trova le immagini originali (zero immagini = run abortita)
//! 2. **Generazione**: un task per immagine, limitati da un semaforo (`workers`)
//! 3. **Barriera**: tutti i task vengono attesi prima di qualsiasi riscrittura,
//!    i rewriter ricevono sempre un indice completo
//! 4. **Riscrittura**: markup e componenti (`replace_html`), fogli di stile (`replace_css`)
//! 5. **Asset**: preload hints (`enable_preload`) e manifest (sempre)
//! 6. **Report**: conteggi aggregati e riduzione misurata
//!
//! ## Error handling:
//! - Un'immagine che fallisce viene saltata, loggata e contata (skip-and-report)
//! - Un placeholder fallito non toglie l'immagine dall'indice
//! - Errori di riscrittura non fanno rollback dei file già riscritti
//! - `optimize()` converte qualsiasi errore in un `OptimizationResult` di fallimento

use crate::{
    config::Config,
    css_rewriter::CssRewriter,
    error::{OptimizeError, OptimizeResult},
    file_manager::FileManager,
    index::ReferenceIndex,
    json_output::{now_millis, OptimizationResult, RunSummary},
    manifest::ManifestWriter,
    optimizer::task_optimizer::{ImageOutcome, TaskOptimizer},
    progress::{GenerationStats, ProgressManager},
    rewriter::{AssetGenerator, ReferenceRewriter},
};
use anyhow::Result;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::Semaphore;
use tracing::{debug, error, info};

/// Conteggi delle sostituzioni per famiglia di file
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ReplacementStats {
    pub html: usize,
    pub css: usize,
    pub react: usize,
}

/// Orchestratore principale
pub struct ResponsiveOptimizer {
    config: Config,
    css_rewriter: CssRewriter,
    markup_rewriters: Vec<Box<dyn ReferenceRewriter>>,
    component_rewriters: Vec<Box<dyn ReferenceRewriter>>,
    preload_generators: Vec<Box<dyn AssetGenerator>>,
    manifest: ManifestWriter,
}

impl ResponsiveOptimizer {
    /// Crea nuova istanza dell'ottimizzatore
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let css_rewriter = CssRewriter::new(config.workers);

        Ok(Self {
            config,
            css_rewriter,
            markup_rewriters: Vec::new(),
            component_rewriters: Vec::new(),
            preload_generators: Vec::new(),
            manifest: ManifestWriter::new(),
        })
    }

    /// Registra un rewriter per file di markup (HTML)
    pub fn with_markup_rewriter(mut self, rewriter: Box<dyn ReferenceRewriter>) -> Self {
        self.markup_rewriters.push(rewriter);
        self
    }

    /// Registra un rewriter per template di componenti (JSX/TSX)
    pub fn with_component_rewriter(mut self, rewriter: Box<dyn ReferenceRewriter>) -> Self {
        self.component_rewriters.push(rewriter);
        self
    }

    /// Registra un generatore di preload hints
    pub fn with_preload_generator(mut self, generator: Box<dyn AssetGenerator>) -> Self {
        self.preload_generators.push(generator);
        self
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// True se il progetto contiene immagini da ottimizzare
    pub fn is_applicable(&self, project_root: &Path) -> bool {
        FileManager::has_images(project_root)
    }

    /// True se una run precedente ha già prodotto varianti
    pub fn validate(&self, project_root: &Path) -> bool {
        FileManager::has_processed_images(project_root)
    }

    /// Esegue la pipeline e riporta sempre un risultato (mai `Err`)
    pub async fn optimize(&self, project_root: &Path) -> OptimizationResult {
        let start = now_millis();
        match self.run(project_root).await {
            Ok(summary) => OptimizationResult::success(&summary, start),
            Err(e) => {
                error!("Image optimization failed: {:#}", e);
                OptimizationResult::failure(&e)
            }
        }
    }

    /// Esegue la pipeline propagando il primo errore
    pub async fn run(&self, project_root: &Path) -> Result<RunSummary> {
        let images = FileManager::find_images(project_root)?;
        self.log_configuration(project_root, &images);

        if images.is_empty() {
            return Err(OptimizeError::ProcessingAborted("No images found to optimize".to_string()).into());
        }

        let (index, stats) = self.process_images(images).await?;

        if index.is_empty() {
            return Err(OptimizeError::ProcessingAborted(format!(
                "All {} images failed to process",
                stats.images_failed
            ))
            .into());
        }

        let replacements = self.replace_references(project_root, &index).await?;
        self.generate_assets(project_root, &index).await?;

        let summary = RunSummary {
            processed: index.len(),
            failed: stats.images_failed,
            html_replacements: replacements.html,
            css_replacements: replacements.css,
            react_replacements: replacements.react,
            reduction_percent: stats.reduction_percent(),
        };
        self.print_final_stats(&summary);

        Ok(summary)
    }

    /// Genera le varianti di tutte le immagini con concorrenza controllata.
    ///
    /// Ritorna solo quando ogni task è terminato: l'indice è completo.
    pub async fn process_images(&self, images: Vec<PathBuf>) -> Result<(ReferenceIndex, GenerationStats)> {
        let progress = ProgressManager::new(images.len() as u64, !self.config.json_output);
        let semaphore = Arc::new(Semaphore::new(self.config.workers));
        let task_optimizer = Arc::new(TaskOptimizer::new(self.config.clone()));
        let mut tasks = Vec::with_capacity(images.len());

        for image_path in images {
            let permit = semaphore.clone().acquire_owned().await?;
            let task_optimizer = task_optimizer.clone();
            let progress = progress.clone();

            let task = tokio::spawn(async move {
                let _permit = permit;
                let result = task_optimizer.process_single_image(image_path.clone()).await;

                let name = image_path.file_name().unwrap_or_default().to_string_lossy().into_owned();
                let message = match &result {
                    Ok(outcome) => format!("[OK] {}: {} variants", name, outcome.processed.variants.len()),
                    Err(_) => format!("[ERROR] {}: error", name),
                };
                progress.update(&message);

                (image_path, result)
            });

            tasks.push(task);
        }

        let mut index = ReferenceIndex::new();
        let mut stats = GenerationStats::new();

        for task in tasks {
            let (image_path, result) = task.await?;
            Self::record_outcome(&mut index, &mut stats, &image_path, result);
        }

        progress.finish(&stats.format_summary());
        Ok((index, stats))
    }

    /// Registra il risultato di un task: errore = immagine saltata e contata
    fn record_outcome(
        index: &mut ReferenceIndex,
        stats: &mut GenerationStats,
        image_path: &Path,
        result: OptimizeResult<ImageOutcome>,
    ) {
        match result {
            Ok(outcome) => {
                if outcome.placeholder_error.is_some() {
                    stats.add_placeholder_error();
                }
                stats.add_processed(&outcome.processed);
                index.insert(outcome.processed);
            }
            Err(e) => {
                stats.add_error();
                error!("Failed to process image {}: {}", image_path.display(), e);
            }
        }
    }

    async fn replace_references(&self, project_root: &Path, index: &ReferenceIndex) -> Result<ReplacementStats> {
        let mut stats = ReplacementStats::default();

        if self.config.replace_html {
            stats.html = Self::run_rewriters(&self.markup_rewriters, project_root, index).await?;
            stats.react = Self::run_rewriters(&self.component_rewriters, project_root, index).await?;
        }

        if self.config.replace_css {
            if self.config.verbose {
                info!("Replacing CSS background images with responsive classes...");
            }
            stats.css = self.css_rewriter.replace_in_files(project_root, index).await?;
        }

        Ok(stats)
    }

    async fn run_rewriters(
        rewriters: &[Box<dyn ReferenceRewriter>],
        project_root: &Path,
        index: &ReferenceIndex,
    ) -> Result<usize> {
        let mut total = 0;
        for rewriter in rewriters {
            let count = rewriter.replace_in_files(project_root, index).await?;
            debug!("Rewriter {} replaced {} references", rewriter.name(), count);
            total += count;
        }
        Ok(total)
    }

    async fn generate_assets(&self, project_root: &Path, index: &ReferenceIndex) -> Result<()> {
        if self.config.enable_preload {
            for generator in &self.preload_generators {
                debug!("Running asset generator {}", generator.name());
                generator.generate(project_root, index).await?;
            }
        }

        self.manifest.generate(project_root, index).await
    }

    /// Logga configurazione (solo se non JSON mode)
    fn log_configuration(&self, project_root: &Path, images: &[PathBuf]) {
        if self.config.json_output {
            return;
        }

        info!("Starting responsive image optimization in: {}", project_root.display());
        info!("Widths: {:?} | Formats: {:?} | Quality: {}", self.config.generate_sizes, self.config.formats, self.config.quality);
        if self.config.enable_blur_placeholder {
            info!("Blur placeholders enabled");
        }
        if !self.config.replace_html && !self.config.replace_css {
            info!("Reference rewriting disabled: variants only");
        }
        info!("Found {} images to process", images.len());
    }

    fn print_final_stats(&self, summary: &RunSummary) {
        if self.config.json_output {
            return;
        }

        info!("=== Optimization Complete ===");
        info!("Images processed: {}", summary.processed);
        info!("Images failed: {}", summary.failed);
        info!("HTML replacements: {}", summary.html_replacements);
        info!("Component replacements: {}", summary.react_replacements);
        info!("CSS replacements: {}", summary.css_replacements);
        info!("Measured reduction: {:.2}%", summary.reduction_percent);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{ImageVariant, ProcessedImage};
    use crate::manifest::MANIFEST_FILE_NAME;
    use futures::future::BoxFuture;
    use futures::FutureExt;
    use image::{Rgb, RgbImage};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tempfile::TempDir;

    /// Reports how many images the index held when it ran
    struct IndexSizeRewriter;

    impl ReferenceRewriter for IndexSizeRewriter {
        fn name(&self) -> &str {
            "index-size"
        }

        fn replace_in_files<'a>(&'a self, _root: &'a Path, index: &'a ReferenceIndex) -> BoxFuture<'a, Result<usize>> {
            async move { Ok(index.len()) }.boxed()
        }
    }

    struct FlagGenerator(Arc<AtomicBool>);

    impl AssetGenerator for FlagGenerator {
        fn name(&self) -> &str {
            "flag"
        }

        fn generate<'a>(&'a self, _root: &'a Path, _index: &'a ReferenceIndex) -> BoxFuture<'a, Result<()>> {
            self.0.store(true, Ordering::SeqCst);
            async { Ok(()) }.boxed()
        }
    }

    fn test_config() -> Config {
        Config {
            generate_sizes: vec![320, 640, 1024],
            formats: vec!["webp".to_string(), "png".to_string()],
            workers: 2,
            json_output: true,
            ..Default::default()
        }
    }

    fn setup_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();
        std::fs::create_dir_all(root.join("img")).unwrap();
        std::fs::create_dir_all(root.join("styles")).unwrap();

        RgbImage::from_fn(800, 400, |x, _| Rgb([(x % 256) as u8, 90, 200]))
            .save(root.join("img/hero.png"))
            .unwrap();
        RgbImage::from_pixel(400, 400, Rgb([0, 0, 0]))
            .save(root.join("img/square.jpg"))
            .unwrap();
        std::fs::write(root.join("img/broken.jpg"), b"corrupt").unwrap();
        std::fs::write(
            root.join("styles/main.css"),
            ".hero {\n  background-image: url('../img/hero.png');\n  color: red;\n}\n",
        )
        .unwrap();

        temp_dir
    }

    #[tokio::test]
    async fn test_full_pipeline() {
        let project = setup_project();
        let root = project.path();
        let optimizer = ResponsiveOptimizer::new(test_config())
            .unwrap()
            .with_markup_rewriter(Box::new(IndexSizeRewriter))
            .with_component_rewriter(Box::new(IndexSizeRewriter));

        let summary = optimizer.run(root).await.unwrap();

        assert_eq!(summary.processed, 2);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.css_replacements, 1);
        // Rewriters only run once the index holds every successful image
        assert_eq!(summary.html_replacements, 2);
        assert_eq!(summary.react_replacements, 2);

        assert!(root.join("img/hero-320w.webp").exists());
        assert!(root.join("img/hero-640w.png").exists());
        assert!(!root.join("img/hero-1024w.webp").exists());
        assert!(root.join("img/square-320w.png").exists());
        assert!(!root.join("img/square-640w.png").exists());
        assert!(root.join(MANIFEST_FILE_NAME).exists());

        let css = std::fs::read_to_string(root.join("styles/main.css")).unwrap();
        assert!(css.contains("@media (min-width: 640px)"));
        assert!(css.contains("url('../img/hero-320w.webp')"));
        assert!(css.contains("  color: red;\n}\n"));

        let manifest = ManifestWriter::load(root).await.unwrap();
        let hero = manifest.images.get(&root.join("img/hero.png")).unwrap();
        assert!(hero.placeholder.is_some());
        assert!((hero.aspect_ratio - 2.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_flags_disable_rewriting_and_preload() {
        let project = setup_project();
        let root = project.path();
        let preload_ran = Arc::new(AtomicBool::new(false));

        let config = Config {
            replace_html: false,
            replace_css: false,
            enable_preload: false,
            ..test_config()
        };
        let optimizer = ResponsiveOptimizer::new(config)
            .unwrap()
            .with_markup_rewriter(Box::new(IndexSizeRewriter))
            .with_preload_generator(Box::new(FlagGenerator(preload_ran.clone())));

        let summary = optimizer.run(root).await.unwrap();

        assert_eq!(summary.html_replacements, 0);
        assert_eq!(summary.css_replacements, 0);
        assert!(!preload_ran.load(Ordering::SeqCst));
        let css = std::fs::read_to_string(root.join("styles/main.css")).unwrap();
        assert!(css.contains("url('../img/hero.png')"));
    }

    #[tokio::test]
    async fn test_preload_generators_run_when_enabled() {
        let project = setup_project();
        let preload_ran = Arc::new(AtomicBool::new(false));
        let config = Config {
            enable_preload: true,
            enable_blur_placeholder: false,
            ..test_config()
        };

        ResponsiveOptimizer::new(config)
            .unwrap()
            .with_preload_generator(Box::new(FlagGenerator(preload_ran.clone())))
            .run(project.path())
            .await
            .unwrap();

        assert!(preload_ran.load(Ordering::SeqCst));
    }

    #[tokio::test]
    async fn test_no_images_aborts() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join("style.css"), "body {}").unwrap();
        let optimizer = ResponsiveOptimizer::new(test_config()).unwrap();

        let err = optimizer.run(temp_dir.path()).await.unwrap_err();
        assert!(matches!(
            err.downcast_ref::<OptimizeError>(),
            Some(OptimizeError::ProcessingAborted(_))
        ));

        let result = optimizer.optimize(temp_dir.path()).await;
        assert!(!result.success);
        assert_eq!(
            result.error.as_deref(),
            Some("Image optimization failed: No images found to optimize")
        );
        assert!(!temp_dir.path().join(MANIFEST_FILE_NAME).exists());
    }

    #[tokio::test]
    async fn test_optimize_success_result() {
        let project = setup_project();
        let optimizer = ResponsiveOptimizer::new(test_config()).unwrap();

        assert!(optimizer.is_applicable(project.path()));
        assert!(!optimizer.validate(project.path()));

        let result = optimizer.optimize(project.path()).await;
        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Optimized 2 images"));
        let metrics = result.metrics.unwrap();
        assert!(metrics.improvement.ends_with("% reduction in image sizes"));
        assert!(metrics.time_after >= metrics.time_before);

        assert!(optimizer.validate(project.path()));
    }

    #[tokio::test]
    async fn test_rerun_does_not_stack_suffixes() {
        let project = setup_project();
        let root = project.path();
        let optimizer = ResponsiveOptimizer::new(test_config()).unwrap();

        optimizer.run(root).await.unwrap();
        let first = FileManager::find_all_images(root).unwrap();
        let summary = optimizer.run(root).await.unwrap();
        let second = FileManager::find_all_images(root).unwrap();

        assert_eq!(first, second);
        assert_eq!(summary.processed, 2);
        // Stylesheet already points at variants
        assert_eq!(summary.css_replacements, 0);
    }

    #[test]
    fn test_placeholder_failure_keeps_image_in_index() {
        let original = PathBuf::from("/project/img/hero.png");
        let processed = ProcessedImage {
            original: original.clone(),
            variants: vec![ImageVariant {
                format: "webp".to_string(),
                width: 320,
                path: PathBuf::from("/project/img/hero-320w.webp"),
                size: 400,
            }],
            placeholder: None,
            aspect_ratio: 2.0,
            original_size: 1000,
        };
        let placeholder = Err(OptimizeError::Placeholder {
            path: original.clone(),
            reason: "decode failed".to_string(),
        });
        let outcome = ImageOutcome::new(processed, Some(placeholder));
        assert!(outcome.placeholder_error.is_some());

        let mut index = ReferenceIndex::new();
        let mut stats = GenerationStats::new();
        ResponsiveOptimizer::record_outcome(&mut index, &mut stats, &original, Ok(outcome));
        ResponsiveOptimizer::record_outcome(
            &mut index,
            &mut stats,
            Path::new("/project/img/broken.jpg"),
            Err(OptimizeError::UnsupportedFormat("tiff".to_string())),
        );

        assert_eq!(index.len(), 1);
        let kept = index.get(&original).unwrap();
        assert_eq!(kept.variants.len(), 1);
        assert!(kept.placeholder.is_none());
        assert_eq!(stats.images_processed, 1);
        assert_eq!(stats.placeholders_failed, 1);
        assert_eq!(stats.images_failed, 1);
        assert_eq!(stats.variants_written, 1);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = Config {
            workers: 0,
            ..Default::default()
        };
        assert!(ResponsiveOptimizer::new(config).is_err());
    }
}
