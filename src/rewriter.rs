//! # Rewriter Interfaces
//!
//! Punti di estensione della pipeline. L'orchestratore conosce solo questi
//! trait: i rewriter di markup (HTML, JSX/TSX) e i generatori di asset
//! (preload hints) vengono registrati dall'esterno.
//!
//! Entrambi ricevono il `ReferenceIndex` per riferimento condiviso: l'indice
//! è completo e di sola lettura quando vengono invocati.

use crate::index::ReferenceIndex;
use anyhow::Result;
use futures::future::BoxFuture;
use std::path::Path;

/// Rewrites references to original images inside one family of source files
pub trait ReferenceRewriter: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Rewrite every matching reference under `project_root`.
    ///
    /// Returns the number of individual references replaced.
    fn replace_in_files<'a>(
        &'a self,
        project_root: &'a Path,
        index: &'a ReferenceIndex,
    ) -> BoxFuture<'a, Result<usize>>;
}

/// Produces auxiliary files (preload hints, manifests) from a finished index
pub trait AssetGenerator: Send + Sync {
    fn name(&self) -> &str;

    fn generate<'a>(
        &'a self,
        project_root: &'a Path,
        index: &'a ReferenceIndex,
    ) -> BoxFuture<'a, Result<()>>;
}
