//! # Result Reporting Module
//!
//! Questo modulo definisce la forma del risultato di una run e la sua
//! emissione JSON per comunicazione con host esterni (pipeline di build,
//! plugin di ottimizzazione).
//!
//! ## Tipi:
//! - `RunSummary`: conteggi aggregati (immagini processate, sostituzioni per rewriter)
//! - `OptimizationResult`: successo con messaggio e metriche, oppure errore
//! - `Metrics`: riduzione percentuale e timestamp di inizio/fine (Unix millis)
//!
//! ## Esempio output:
//! ```json
//! {"success":true,"message":"Optimized 12 images","metrics":{"improvement":"41% reduction in image sizes","time_before":1700000000000,"time_after":1700000004200}}
//! ```

use serde::{Deserialize, Serialize};
use std::time::SystemTime;

/// Aggregate counts of one pipeline run
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Images present in the reference index
    pub processed: usize,
    /// Images skipped because generation failed
    pub failed: usize,
    pub html_replacements: usize,
    pub css_replacements: usize,
    pub react_replacements: usize,
    /// Measured reduction of delivered bytes vs originals
    pub reduction_percent: f64,
}

/// Metrics attached to a successful result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metrics {
    pub improvement: String,
    pub time_before: u64,
    pub time_after: u64,
}

/// Final outcome reported to the caller
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResult {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub metrics: Option<Metrics>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl OptimizationResult {
    /// Successful run
    pub fn success(summary: &RunSummary, time_before: u64) -> Self {
        Self {
            success: true,
            message: Some(format!("Optimized {} images", summary.processed)),
            metrics: Some(Metrics {
                improvement: format!("{:.0}% reduction in image sizes", summary.reduction_percent),
                time_before,
                time_after: now_millis(),
            }),
            error: None,
        }
    }

    /// Failed run wrapping the underlying cause
    pub fn failure(cause: &anyhow::Error) -> Self {
        Self {
            success: false,
            message: None,
            metrics: None,
            error: Some(format!("Image optimization failed: {}", cause)),
        }
    }

    /// Emette il risultato JSON su stdout
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            println!("{}", json);
        }
    }
}

/// Current time as Unix milliseconds
pub fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_result() {
        let summary = RunSummary {
            processed: 3,
            reduction_percent: 41.4,
            ..Default::default()
        };
        let start = now_millis();
        let result = OptimizationResult::success(&summary, start);

        assert!(result.success);
        assert_eq!(result.message.as_deref(), Some("Optimized 3 images"));
        let metrics = result.metrics.unwrap();
        assert_eq!(metrics.improvement, "41% reduction in image sizes");
        assert_eq!(metrics.time_before, start);
        assert!(metrics.time_after >= start);
        assert!(result.error.is_none());
    }

    #[test]
    fn test_failure_result_serialization() {
        let result = OptimizationResult::failure(&anyhow::anyhow!("No images found to optimize"));
        let json = serde_json::to_string(&result).unwrap();

        assert_eq!(
            json,
            r#"{"success":false,"error":"Image optimization failed: No images found to optimize"}"#
        );
    }
}
