//! # Optimizer Module
//!
//! Modulo che separa le responsabilità della pipeline in sottomoduli:
//! - `responsive_optimizer`: Orchestratore principale
//! - `task_optimizer`: Worker per singole immagini
//! - `path_resolver`: Logica di naming delle varianti centralizzata

pub mod path_resolver;
pub mod responsive_optimizer;
pub mod task_optimizer;

pub use path_resolver::PathResolver;
pub use responsive_optimizer::ResponsiveOptimizer;
pub use task_optimizer::TaskOptimizer;
