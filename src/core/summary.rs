// src/core/summary.rs

//! Renders a finished analysis into short, ordered statements.
//!
//! The output depends only on fields of the result, so the same result
//! always renders to the same text.

use crate::core::knowledge_base::Verdict;
use crate::core::models::AnalysisResult;

/// At most this many pattern descriptions are quoted.
pub const PATTERN_PREVIEW_LIMIT: usize = 3;

/// The summary as one string, one statement per line.
pub fn render(result: &AnalysisResult) -> String {
    statements(result).join("\n")
}

pub fn statements(result: &AnalysisResult) -> Vec<String> {
    let mut lines = vec![Verdict::from_score(result.trust_score()).banner().to_string()];

    lines.push(if result.is_accessible() {
        "• The website is accessible and responds to requests.".to_string()
    } else {
        "• ⚠️ The website is not accessible or not responding.".to_string()
    });

    lines.push(match (result.has_ssl(), result.ssl_valid()) {
        (true, true) => "• ✅ Uses a valid SSL certificate for secure connections.".to_string(),
        (true, false) => "• ⚠️ Has SSL but certificate may have issues.".to_string(),
        (false, _) => "• ❌ No SSL certificate - connections are not secure.".to_string(),
    });

    lines.push(domain_age_line(result.domain_age_days()));

    let patterns = result.suspicious_patterns();
    if !patterns.is_empty() {
        lines.push(format!(
            "• 🚨 Found {} suspicious pattern{}:",
            patterns.len(),
            plural(patterns.len() as u32)
        ));
        lines.extend(
            patterns
                .iter()
                .take(PATTERN_PREVIEW_LIMIT)
                .map(|p| format!("  - {}", p.description())),
        );
    }

    lines
}

fn domain_age_line(age_days: Option<u32>) -> String {
    match age_days {
        None => "• ⚠️ Domain age could not be verified.".to_string(),
        Some(days) if days > 365 => {
            let years = days / 365;
            format!("• ✅ Domain is well-established ({years} year{} old).", plural(years))
        }
        Some(days) if days > 30 => {
            let months = days / 30;
            format!("• Domain is {months} month{} old.", plural(months))
        }
        Some(days) => format!("• ⚠️ Domain is very new ({days} day{} old).", plural(days)),
    }
}

fn plural(count: u32) -> &'static str {
    if count == 1 { "" } else { "s" }
}
