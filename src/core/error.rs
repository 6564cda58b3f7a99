// src/core/error.rs

use thiserror::Error;

/// Structural failures of an analysis. Probe failures are not errors; they
/// surface as negative or unknown signals instead.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("invalid URL '{input}': {reason}")]
    InvalidUrl { input: String, reason: String },

    #[error("failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}
