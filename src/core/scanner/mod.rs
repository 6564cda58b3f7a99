// src/core/scanner/mod.rs

//! Probes that gather trust signals for a URL, and the [`Analyzer`] that runs
//! them together and folds the outcome into an [`AnalysisResult`].

pub mod http_scanner;
pub mod pattern_scanner;
pub mod ssl_scanner;
pub mod whois_scanner;

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::config::Settings;
use crate::core::error::AnalysisError;
use crate::core::history::ResultLog;
use crate::core::models::{AnalysisResult, Signals};
use crate::core::normalizer::NormalizedUrl;
use self::http_scanner::{AccessibilityProbe, HttpAccessibilityProbe};
use self::pattern_scanner::run_pattern_scan;
use self::ssl_scanner::{NativeTlsProbe, TlsProbe};
use self::whois_scanner::{DomainAgeLookup, TcpWhoisClient};

/// Runs every probe against a URL and scores the result.
///
/// Each call is independent; an `Analyzer` can be shared across tasks.
/// Dropping the future returned by [`Analyzer::analyze`] cancels the
/// in-flight network probes.
pub struct Analyzer {
    accessibility: Arc<dyn AccessibilityProbe>,
    tls: Arc<dyn TlsProbe>,
    domain_age: DomainAgeLookup,
    history: Option<Arc<dyn ResultLog>>,
}

impl Analyzer {
    pub fn new(
        accessibility: Arc<dyn AccessibilityProbe>,
        tls: Arc<dyn TlsProbe>,
        domain_age: DomainAgeLookup,
    ) -> Self {
        Self { accessibility, tls, domain_age, history: None }
    }

    /// Builds the production probes from configuration. History is not attached.
    pub fn from_settings(settings: &Settings) -> Result<Self, AnalysisError> {
        let probes = &settings.probes;
        let accessibility = HttpAccessibilityProbe::new(
            Duration::from_secs(probes.http_timeout_secs),
            &probes.user_agent,
            probes.http_fallback,
        )?;
        let tls = NativeTlsProbe::new(Duration::from_secs(probes.tls_timeout_secs));
        let whois = TcpWhoisClient::new(
            Duration::from_secs(settings.whois.io_timeout_secs),
            settings.whois.server.clone(),
        );
        let domain_age = DomainAgeLookup::new(
            Arc::new(whois),
            Duration::from_secs(settings.whois.deadline_secs),
        );

        Ok(Self::new(Arc::new(accessibility), Arc::new(tls), domain_age))
    }

    /// Records every finished analysis in `history`.
    pub fn with_history(mut self, history: Arc<dyn ResultLog>) -> Self {
        self.history = Some(history);
        self
    }

    pub fn history(&self) -> Option<&Arc<dyn ResultLog>> {
        self.history.as_ref()
    }

    /// Analyzes one URL.
    ///
    /// Only an unparseable URL is an error. Probe failures turn into negative
    /// or unknown signals, and a history write that fails is logged and ignored.
    pub async fn analyze(&self, raw_url: &str) -> Result<AnalysisResult, AnalysisError> {
        let url = NormalizedUrl::parse(raw_url)?;
        info!(url = %url, "Starting analysis.");

        let (accessibility, tls, domain_age) = tokio::join!(
            self.accessibility.check(&url),
            self.tls.check(&url),
            self.domain_age.lookup(url.host())
        );
        let patterns = run_pattern_scan(&url);

        let signals = Signals { accessibility, tls, domain_age };
        let result = AnalysisResult::new(&url, signals, patterns);
        info!(
            url = %url,
            score = result.trust_score(),
            legitimate = result.is_legitimate(),
            patterns = result.suspicious_patterns().len(),
            "Analysis finished."
        );

        if let Some(history) = &self.history {
            if let Err(e) = history.insert(&result) {
                warn!(id = %result.id(), error = %e, "Could not record analysis in history.");
            }
        }

        Ok(result)
    }
}
