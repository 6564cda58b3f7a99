// src/core/mod.rs

// Root of the analysis engine. Everything below is independent of the CLI
// and can be driven directly through `scanner::Analyzer`.

/// Data structures shared by the probes, the scorer and the summary,
/// such as `AnalysisResult`, `Signals` and `SuspiciousPattern`.
pub mod models;

/// URL normalization and the parsed `NormalizedUrl` every probe consumes.
pub mod normalizer;

pub mod error;

/// The static table of URL heuristics: TLD and shortener lists, phishing
/// keywords, rule weights and the verdict bands.
pub mod knowledge_base;

pub mod scoring;

pub mod summary;

pub mod deadline;

/// Persistence and statistics for finished analyses.
pub mod history;

/// The individual probes and the `Analyzer` that runs them concurrently.
pub mod scanner;
