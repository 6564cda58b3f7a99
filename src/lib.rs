// src/lib.rs

//! Heuristic trust scoring for URLs.
//!
//! [`core::scanner::Analyzer`] normalizes a URL, probes it over HTTP, TLS and
//! WHOIS concurrently, scans it for lexical red flags, and folds everything
//! into a scored [`core::models::AnalysisResult`].

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
