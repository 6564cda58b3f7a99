// src/core/scanner/pattern_scanner.rs

use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::core::knowledge_base::{
    MAX_HOST_DOTS, MAX_HOST_LENGTH, PHISHING_KEYWORDS, PUNYCODE_PREFIX, SUSPICIOUS_TLDS, URL_SHORTENERS,
};
use crate::core::models::{PatternKind, SuspiciousPattern};
use crate::core::normalizer::NormalizedUrl;

static RE_IPV4: Lazy<Regex> = Lazy::new(|| Regex::new(r"\b(?:[0-9]{1,3}\.){3}[0-9]{1,3}\b").unwrap());

/// Convenience wrapper over [`run_pattern_scan`] for raw input.
///
/// Input that cannot be normalized into a URL with a hostname yields no patterns.
pub fn scan(url: &str) -> Vec<SuspiciousPattern> {
    match NormalizedUrl::parse(url) {
        Ok(normalized) => run_pattern_scan(&normalized),
        Err(e) => {
            debug!(error = %e, "Skipping pattern scan of unparseable input.");
            Vec::new()
        }
    }
}

/// Applies every lexical rule to the hostname and path of `url`.
///
/// Rules are independent; every one that applies contributes. The result is
/// ordered by rule, then by position in the rule's word list.
pub fn run_pattern_scan(url: &NormalizedUrl) -> Vec<SuspiciousPattern> {
    let host = url.host();
    let path = url.path().to_lowercase();
    let mut patterns = Vec::new();

    check_tld(host, &mut patterns);
    check_ip_host(host, &mut patterns);
    check_subdomains(host, &mut patterns);
    check_shorteners(host, &mut patterns);
    check_keywords(host, &path, &mut patterns);
    check_punycode(host, &mut patterns);
    check_length(host, &mut patterns);

    info!(url = %url, findings = %patterns.len(), "Pattern scan finished.");
    patterns
}

fn check_tld(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    for tld in SUSPICIOUS_TLDS.iter().filter(|tld| host.ends_with(*tld)) {
        debug!(tld, "Suspicious TLD matched.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::SuspiciousTld,
            format!("Suspicious TLD: {tld}"),
            format!("Domain uses potentially suspicious top-level domain {tld}"),
        ));
    }
}

fn check_ip_host(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    if RE_IPV4.is_match(host) {
        debug!(host, "IPv4 literal used as hostname.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::IpAddressHost,
            "IP address as domain",
            "Uses IP address instead of domain name",
        ));
    }
}

fn check_subdomains(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    let dots = host.matches('.').count();
    if dots > MAX_HOST_DOTS {
        debug!(dots, "Hostname has too many labels.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::ExcessiveSubdomains,
            "Excessive subdomains",
            format!("Domain has {dots} dots, indicating multiple subdomains"),
        ));
    }
}

fn check_shorteners(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    for shortener in URL_SHORTENERS.iter().filter(|s| host.contains(*s)) {
        debug!(shortener, "URL shortener matched.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::UrlShortener,
            format!("URL shortener: {shortener}"),
            "Uses URL shortening service which can hide destination",
        ));
    }
}

// Keywords are looked for in the hostname as well as the path; lures such as
// `paypal-secure-login.tk` carry them in the name itself.
fn check_keywords(host: &str, path: &str, patterns: &mut Vec<SuspiciousPattern>) {
    for keyword in PHISHING_KEYWORDS
        .iter()
        .filter(|k| host.contains(*k) || path.contains(*k))
    {
        debug!(keyword, "Phishing keyword matched.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::PhishingKeyword,
            format!("Suspicious keyword: {keyword}"),
            format!("URL contains potentially phishing-related keyword: {keyword}"),
        ));
    }
}

fn check_punycode(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    if host.contains(PUNYCODE_PREFIX) {
        debug!(host, "Punycode label found.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::Punycode,
            "Punycode domain",
            "Domain contains non-Latin characters (internationalized domain)",
        ));
    }
}

fn check_length(host: &str, patterns: &mut Vec<SuspiciousPattern>) {
    let length = host.chars().count();
    if length > MAX_HOST_LENGTH {
        debug!(length, "Hostname is unusually long.");
        patterns.push(SuspiciousPattern::new(
            PatternKind::LongHostname,
            "Extremely long domain",
            format!("Domain name is unusually long ({length} characters)"),
        ));
    }
}
