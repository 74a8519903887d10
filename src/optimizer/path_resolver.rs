//! # Path Resolution Module
//!
//! Centralizza tutta la logica di calcolo dei path delle varianti.
//! Evita duplicazione tra ImageProcessor e lo scanner dei file.
//!
//! Il nome di output è funzione pura di (path originale, larghezza, formato):
//! `<dir>/<nome normalizzato>-<width>w.<format>`, dove la normalizzazione
//! rimuove i suffissi `-<N>w` già presenti (anche concatenati) così che una
//! nuova run non accumuli suffissi.

use regex::Regex;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use tracing::debug;

fn width_suffix_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| Regex::new(r"-\d+w(-\d+w)*$").expect("valid width suffix pattern"))
}

/// Utility per calcolare i path delle varianti in modo centralizzato
pub struct PathResolver;

impl PathResolver {
    /// Calcola il path di output di una variante
    pub fn variant_path(image_path: &Path, width: u32, format: &str) -> PathBuf {
        let base_name = Self::normalized_base_name(image_path);
        let filename = format!("{}-{}w.{}", base_name, width, format);
        let result = image_path.with_file_name(filename);
        debug!("Resolved variant path: {} -> {}", image_path.display(), result.display());
        result
    }

    /// File stem senza estensione e senza suffissi di larghezza
    pub fn normalized_base_name(image_path: &Path) -> String {
        let stem = image_path
            .file_stem()
            .map(|s| s.to_string_lossy())
            .unwrap_or_default();
        width_suffix_pattern().replace(&stem, "").into_owned()
    }

    /// True se il file è già una variante generata (stem terminante con `-<N>w`)
    pub fn is_variant(path: &Path) -> bool {
        path.file_stem()
            .map(|s| width_suffix_pattern().is_match(&s.to_string_lossy()))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_path_appends_width_and_format() {
        let path = PathResolver::variant_path(Path::new("/site/img/photo.jpg"), 320, "webp");
        assert_eq!(path, PathBuf::from("/site/img/photo-320w.webp"));
    }

    #[test]
    fn test_existing_suffix_is_not_stacked() {
        let once = PathResolver::variant_path(Path::new("/site/photo.jpg"), 640, "jpeg");
        let again = PathResolver::variant_path(Path::new("/site/photo-320w.jpg"), 640, "jpeg");
        let chained = PathResolver::variant_path(Path::new("/site/photo-320w-640w.jpg"), 640, "jpeg");

        assert_eq!(once, PathBuf::from("/site/photo-640w.jpeg"));
        assert_eq!(again, once);
        assert_eq!(chained, once);
    }

    #[test]
    fn test_only_trailing_tokens_are_stripped() {
        assert_eq!(PathResolver::normalized_base_name(Path::new("a-320w-b.png")), "a-320w-b");
        assert_eq!(PathResolver::normalized_base_name(Path::new("hero-wide.png")), "hero-wide");
        assert_eq!(PathResolver::normalized_base_name(Path::new("shot-12.png")), "shot-12");
    }

    #[test]
    fn test_is_variant() {
        assert!(PathResolver::is_variant(Path::new("photo-320w.webp")));
        assert!(PathResolver::is_variant(Path::new("photo-320w-640w.jpg")));
        assert!(!PathResolver::is_variant(Path::new("photo.jpg")));
        assert!(!PathResolver::is_variant(Path::new("photo-w.jpg")));
    }
}
