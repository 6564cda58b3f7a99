// src/app.rs

use color_eyre::eyre::Result;
use std::sync::Arc;

use crate::cli::CliCommand;
use crate::config::Settings;
use crate::core::history::{JsonlResultLog, ResultLog, ScoreHistogram, DEFAULT_BOUNDARIES};
use crate::core::knowledge_base::{all_rules, Verdict};
use crate::core::models::AnalysisResult;
use crate::core::scanner::Analyzer;

/// Headline numbers of one report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReportSummary {
    pub score: u8,
    pub verdict: Verdict,
    pub pattern_count: usize,
    pub worst_severity: u8,
}

impl ReportSummary {
    pub fn from_result(result: &AnalysisResult) -> Self {
        let patterns = result.suspicious_patterns();
        Self {
            score: result.trust_score(),
            verdict: Verdict::from_score(result.trust_score()),
            pattern_count: patterns.len(),
            worst_severity: patterns.iter().map(|p| p.severity()).max().unwrap_or(0),
        }
    }
}

pub struct App {
    settings: Settings,
    history: Option<Arc<dyn ResultLog>>,
}

impl App {
    pub fn new(settings: Settings) -> Self {
        let history: Option<Arc<dyn ResultLog>> = if settings.history.enabled {
            Some(Arc::new(JsonlResultLog::new(settings.history_file())))
        } else {
            None
        };
        Self { settings, history }
    }

    /// Executes one command and returns what should be printed on stdout.
    pub async fn run(&self, command: CliCommand) -> Result<String> {
        match command {
            CliCommand::Analyze { url, json, no_history } => {
                let mut analyzer = Analyzer::from_settings(&self.settings)?;
                if let (Some(history), false) = (&self.history, no_history) {
                    analyzer = analyzer.with_history(Arc::clone(history));
                }
                let result = analyzer.analyze(&url).await?;
                if json {
                    Ok(serde_json::to_string_pretty(&result)?)
                } else {
                    Ok(render_report(&result))
                }
            }
            CliCommand::Recent { limit, json } => {
                let limit = limit.unwrap_or(self.settings.history.recent_limit);
                let recent = match &self.history {
                    Some(history) => history.list_recent(limit)?,
                    None => Vec::new(),
                };
                if json {
                    Ok(serde_json::to_string_pretty(&recent)?)
                } else {
                    Ok(render_recent(&recent))
                }
            }
            CliCommand::Stats { json } => {
                let histogram = match &self.history {
                    Some(history) => history.histogram(DEFAULT_BOUNDARIES)?,
                    None => ScoreHistogram::from_scores(std::iter::empty(), DEFAULT_BOUNDARIES),
                };
                if json {
                    Ok(serde_json::to_string_pretty(&histogram)?)
                } else {
                    Ok(render_stats(&histogram))
                }
            }
            CliCommand::Rules => Ok(render_rules()),
        }
    }
}

// --- Text Rendering ---

pub fn render_report(result: &AnalysisResult) -> String {
    let summary = ReportSummary::from_result(result);
    let status = result.http_status().map(|s| format!(" (HTTP {s})")).unwrap_or_default();
    let ssl = match (result.has_ssl(), result.ssl_valid()) {
        (true, true) => "valid certificate",
        (true, false) => "no certificate presented",
        (false, _) => "none",
    };
    let age = result
        .domain_age_days()
        .map(|d| format!("{d} days"))
        .unwrap_or_else(|| "unknown".to_string());

    let mut lines = vec![
        format!("URL:          {}", result.url()),
        format!("Trust score:  {}/100 ({})", summary.score, summary.verdict),
        format!("Legitimate:   {}", yes_no(result.is_legitimate())),
        format!("Accessible:   {}{status}", yes_no(result.is_accessible())),
        format!("SSL/TLS:      {ssl}"),
    ];
    if let Some(cert) = result.certificate() {
        lines.push(format!("  Issuer:     {}", cert.issuer_name));
        lines.push(format!(
            "  Expires:    {} ({} days)",
            cert.not_after.format("%Y-%m-%d"),
            cert.days_until_expiry
        ));
    }
    lines.push(format!("Domain age:   {age}"));

    if summary.pattern_count > 0 {
        lines.push(format!(
            "Patterns ({}, worst severity {}):",
            summary.pattern_count, summary.worst_severity
        ));
        lines.extend(
            result
                .suspicious_patterns()
                .iter()
                .map(|p| format!("  [{}] {} ({})", p.severity(), p.pattern(), p.kind())),
        );
    }

    lines.push(String::new());
    lines.push(result.analysis_summary().to_string());
    lines.join("\n")
}

pub fn render_recent(results: &[AnalysisResult]) -> String {
    if results.is_empty() {
        return "No analyses recorded yet.".to_string();
    }
    results
        .iter()
        .map(|r| {
            format!(
                "{}  {:>3}  {:<14}  {}",
                r.timestamp().format("%Y-%m-%d %H:%M:%S"),
                r.trust_score(),
                Verdict::from_score(r.trust_score()).to_string(),
                r.url()
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_stats(histogram: &ScoreHistogram) -> String {
    let mut lines = vec![format!("Analyses: {}", histogram.total)];
    lines.extend(histogram.buckets.iter().map(|bucket| {
        format!(
            "  {:>3}-{:<3} {}",
            bucket.lower,
            bucket.upper.saturating_sub(1),
            bucket.count
        )
    }));
    lines.push(format!("  other   {}", histogram.other));
    lines.join("\n")
}

pub fn render_rules() -> String {
    all_rules()
        .map(|rule| format!("{:<24} severity {:>2}  {}", rule.title, rule.severity, rule.description))
        .collect::<Vec<_>>()
        .join("\n")
}

fn yes_no(value: bool) -> &'static str {
    if value { "yes" } else { "no" }
}
