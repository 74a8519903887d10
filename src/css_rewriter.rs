//! # Stylesheet Rewriter Module
//!
//! Sostituisce le dichiarazioni `background-image: url(...)` che puntano a
//! un'immagine originale con una cascata di regole responsive.
//!
//! ## Responsabilità:
//! - Trova i fogli di stile del progetto (css, scss, sass, less)
//! - Individua le dichiarazioni con un pattern testuale a singola passata
//! - Risolve l'URL referenziato nel `ReferenceIndex` per nome file
//! - Genera nome classe e cascata di media query
//! - Riscrive il file solo se il contenuto è cambiato
//!
//! ## Matching testuale:
//! Nessun parser CSS. Il pattern accetta URL con apici singoli, doppi o senza
//! apici (un solo `url()` per dichiarazione). Tutto ciò che non matcha resta
//! identico byte per byte.
//! Query string e fragment (`?v=2`, `#id`) non partecipano alla risoluzione
//! e vengono riapplicati all'URL della variante.
//!
//! ## Cascata:
//! ```css
//! .bg-hero {
//!   background-image: url('img/hero-320w.webp');
//! }
//! @media (min-width: 640px) {
//!   .bg-hero {
//!     background-image: url('img/hero-640w.webp');
//!   }
//! }
//! ```
//! La regola senza media query porta la variante più stretta ed è emessa per
//! prima; le media query seguono in ordine crescente di larghezza, così vince
//! l'ultima regola che matcha, cioè il breakpoint più largo applicabile.

use crate::error::{OptimizeError, OptimizeResult};
use crate::file_manager::FileManager;
use crate::index::{ImageVariant, ProcessedImage, ReferenceIndex};
use crate::rewriter::ReferenceRewriter;
use anyhow::Result;
use futures::future::BoxFuture;
use futures::{stream, FutureExt, StreamExt, TryStreamExt};
use regex::Regex;
use std::ops::Range;
use std::path::Path;
use std::sync::OnceLock;
use tracing::{debug, info};

fn background_image_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r#"background-image:\s*url\(['"]?([^'")]+)['"]?\)"#)
            .expect("valid background-image pattern")
    })
}

fn non_alphanumeric() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"[^a-zA-Z0-9]").expect("valid class name pattern"))
}

/// One `background-image` declaration found in a stylesheet
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CssMatch<'a> {
    /// Full matched declaration text (without the trailing `;`)
    pub declaration: &'a str,
    /// Referenced URL, quotes stripped
    pub url: &'a str,
    /// Byte range of `declaration` in the scanned content
    pub range: Range<usize>,
}

/// Rewrites stylesheet background images into responsive cascades
#[derive(Debug, Clone)]
pub struct CssRewriter {
    workers: usize,
}

impl Default for CssRewriter {
    fn default() -> Self {
        Self::new(4)
    }
}

impl CssRewriter {
    /// `workers` bounds how many files are rewritten at once
    pub fn new(workers: usize) -> Self {
        Self {
            workers: workers.max(1),
        }
    }

    /// Rewrite every stylesheet under `project_root`.
    ///
    /// Returns the number of declarations replaced, not files touched.
    pub async fn replace_in_files(&self, project_root: &Path, index: &ReferenceIndex) -> Result<usize> {
        let files = FileManager::find_stylesheets(project_root)?;
        debug!("Found {} stylesheets under {}", files.len(), project_root.display());

        let total = stream::iter(files)
            .map(|file| async move { Self::replace_in_file(&file, index).await })
            .buffer_unordered(self.workers)
            .try_fold(0usize, |acc, count| async move { Ok(acc + count) })
            .await?;

        info!("Replaced {} stylesheet background images", total);
        Ok(total)
    }

    /// Rewrite a single stylesheet, writing it back only if it changed
    pub async fn replace_in_file(path: &Path, index: &ReferenceIndex) -> OptimizeResult<usize> {
        let content = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| OptimizeError::FileRead {
                path: path.to_path_buf(),
                source,
            })?;

        let (rewritten, count) = Self::rewrite_content(&content, index);

        if rewritten != content {
            Self::write_stylesheet(path, rewritten).await?;
            debug!("Rewrote {} ({} declarations)", path.display(), count);
        }

        Ok(count)
    }

    async fn write_stylesheet(path: &Path, content: String) -> OptimizeResult<()> {
        tokio::fs::write(path, content)
            .await
            .map_err(|source| OptimizeError::FileWrite {
                path: path.to_path_buf(),
                source,
            })
    }

    /// All `background-image` declarations in `content`, in order
    pub fn find_matches(content: &str) -> Vec<CssMatch<'_>> {
        background_image_pattern()
            .captures_iter(content)
            .filter_map(|caps| {
                let declaration = caps.get(0)?;
                Some(CssMatch {
                    declaration: declaration.as_str(),
                    url: caps.get(1)?.as_str(),
                    range: declaration.range(),
                })
            })
            .collect()
    }

    /// Replace every resolvable declaration; returns new content and count
    pub fn rewrite_content(content: &str, index: &ReferenceIndex) -> (String, usize) {
        let mut rewritten = String::with_capacity(content.len());
        let mut copied_up_to = 0;
        let mut count = 0;

        for found in Self::find_matches(content) {
            let processed = match index.find_by_filename(strip_query(found.url)) {
                Some(processed) if !processed.variants.is_empty() => processed,
                _ => continue,
            };

            rewritten.push_str(&content[copied_up_to..found.range.start]);
            let class_name = Self::generate_class_name(found.url);
            rewritten.push_str(&Self::generate_media_queries(processed, &class_name, found.url));
            copied_up_to = found.range.end;
            count += 1;
        }

        rewritten.push_str(&content[copied_up_to..]);
        (rewritten, count)
    }

    /// `bg-` + URL file stem with every non-alphanumeric char replaced by `-`
    pub fn generate_class_name(url: &str) -> String {
        let name = Path::new(strip_query(url))
            .file_stem()
            .map(|s| s.to_string_lossy().into_owned())
            .unwrap_or_default();
        format!("bg-{}", non_alphanumeric().replace_all(&name, "-"))
    }

    /// Build the cascade for one image, narrowest rule first.
    ///
    /// One rule per distinct width; when several formats share a width the
    /// first recorded variant is used.
    pub fn generate_media_queries(processed: &ProcessedImage, class_name: &str, url: &str) -> String {
        let mut by_width: Vec<&ImageVariant> = Vec::new();
        for variant in &processed.variants {
            if !by_width.iter().any(|v| v.width == variant.width) {
                by_width.push(variant);
            }
        }
        by_width.sort_by(|a, b| b.width.cmp(&a.width));

        let Some((narrowest, wider)) = by_width.split_last() else {
            return String::new();
        };

        let mut rules = vec![format!(
            ".{} {{\n  background-image: url('{}');\n}}",
            class_name,
            variant_url(url, narrowest)
        )];

        for variant in wider.iter().rev() {
            rules.push(format!(
                "@media (min-width: {}px) {{\n  .{} {{\n    background-image: url('{}');\n  }}\n}}",
                variant.width,
                class_name,
                variant_url(url, variant)
            ));
        }

        rules.join("\n")
    }
}

/// URL without its `?query` or `#fragment`
fn strip_query(url: &str) -> &str {
    url.find(['?', '#']).map_or(url, |end| &url[..end])
}

/// Reference the variant the same way the original was referenced:
/// the last path segment of `url` is swapped for the variant's file name,
/// any query or fragment is kept.
fn variant_url(url: &str, variant: &ImageVariant) -> String {
    let file_name = variant
        .path
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let path = strip_query(url);
    let suffix = &url[path.len()..];
    match path.rfind('/') {
        Some(pos) => format!("{}{}{}", &path[..=pos], file_name, suffix),
        None => format!("{}{}", file_name, suffix),
    }
}

impl ReferenceRewriter for CssRewriter {
    fn name(&self) -> &str {
        "css"
    }

    fn replace_in_files<'a>(
        &'a self,
        project_root: &'a Path,
        index: &'a ReferenceIndex,
    ) -> BoxFuture<'a, Result<usize>> {
        CssRewriter::replace_in_files(self, project_root, index).boxed()
    }
}
