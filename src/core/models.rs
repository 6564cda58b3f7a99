// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter};
use uuid::Uuid;

use crate::core::knowledge_base;
use crate::core::normalizer::NormalizedUrl;
use crate::core::{scoring, summary};

// --- Pattern Models ---

// Identifies the lexical rule that produced a suspicious pattern.
#[derive(
    Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, Display, EnumIter,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum PatternKind {
    SuspiciousTld,
    IpAddressHost,
    ExcessiveSubdomains,
    UrlShortener,
    PhishingKeyword,
    Punycode,
    LongHostname,
}

// A named, weighted red flag detected in a URL. Only the pattern scanner creates these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct SuspiciousPattern {
    kind: PatternKind,
    pattern: String,
    description: String,
    severity: u8,
}

impl SuspiciousPattern {
    pub(crate) fn new(kind: PatternKind, pattern: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            kind,
            pattern: pattern.into(),
            description: description.into(),
            severity: knowledge_base::severity_of(kind),
        }
    }

    pub fn kind(&self) -> PatternKind {
        self.kind
    }

    /// Short label, e.g. `Suspicious TLD: .tk`.
    pub fn pattern(&self) -> &str {
        &self.pattern
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Rule weight in `1..=10`, consumed only by the scorer.
    pub fn severity(&self) -> u8 {
        self.severity
    }
}

// --- Signal Models ---

// Outcome of the HTTP reachability probe.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum Accessibility {
    Reachable { status: u16 },
    Unreachable { status: Option<u16> },
}

impl Accessibility {
    pub fn is_reachable(&self) -> bool {
        matches!(self, Accessibility::Reachable { .. })
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Accessibility::Reachable { status } => Some(*status),
            Accessibility::Unreachable { status } => *status,
        }
    }
}

// Details extracted from the peer certificate of a TLS handshake.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_before: DateTime<Utc>,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
}

// Outcome of the TLS probe. `Absent` covers plain HTTP as well as every failure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum TlsStatus {
    Absent,
    Secured {
        certificate_present: bool,
        certificate: Option<CertificateInfo>,
    },
}

impl TlsStatus {
    pub fn has_ssl(&self) -> bool {
        matches!(self, TlsStatus::Secured { .. })
    }

    pub fn ssl_valid(&self) -> bool {
        matches!(self, TlsStatus::Secured { certificate_present: true, .. })
    }

    pub fn certificate(&self) -> Option<&CertificateInfo> {
        match self {
            TlsStatus::Secured { certificate, .. } => certificate.as_ref(),
            TlsStatus::Absent => None,
        }
    }
}

// Outcome of the WHOIS registration lookup.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum DomainAge {
    Known(u32),
    Unknown,
}

impl DomainAge {
    pub fn days(&self) -> Option<u32> {
        match self {
            DomainAge::Known(days) => Some(*days),
            DomainAge::Unknown => None,
        }
    }
}

// The three network-derived observations fed into the scorer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signals {
    pub accessibility: Accessibility,
    pub tls: TlsStatus,
    pub domain_age: DomainAge,
}

impl Signals {
    pub fn is_accessible(&self) -> bool {
        self.accessibility.is_reachable()
    }

    pub fn has_ssl(&self) -> bool {
        self.tls.has_ssl()
    }

    pub fn ssl_valid(&self) -> bool {
        self.tls.ssl_valid()
    }

    pub fn domain_age_days(&self) -> Option<u32> {
        self.domain_age.days()
    }
}

// --- Main Result ---

/// The immutable record produced by one pipeline run.
///
/// The score, the legitimacy flag and the summary are derived inside
/// [`AnalysisResult::new`]; there is no way to set them independently.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AnalysisResult {
    id: Uuid,
    url: String,
    trust_score: u8,
    is_legitimate: bool,
    is_accessible: bool,
    http_status: Option<u16>,
    has_ssl: bool,
    ssl_valid: bool,
    certificate: Option<CertificateInfo>,
    domain_age_days: Option<u32>,
    suspicious_patterns: Vec<SuspiciousPattern>,
    analysis_summary: String,
    timestamp: DateTime<Utc>,
}

impl AnalysisResult {
    pub fn new(url: &NormalizedUrl, signals: Signals, suspicious_patterns: Vec<SuspiciousPattern>) -> Self {
        let trust_score = scoring::trust_score(&signals, &suspicious_patterns);
        let mut result = Self {
            id: Uuid::new_v4(),
            url: url.as_str().to_string(),
            trust_score,
            is_legitimate: scoring::is_legitimate(trust_score),
            is_accessible: signals.is_accessible(),
            http_status: signals.accessibility.status(),
            has_ssl: signals.has_ssl(),
            ssl_valid: signals.ssl_valid(),
            certificate: signals.tls.certificate().cloned(),
            domain_age_days: signals.domain_age_days(),
            suspicious_patterns,
            analysis_summary: String::new(),
            timestamp: Utc::now(),
        };
        result.analysis_summary = summary::render(&result);
        result
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn trust_score(&self) -> u8 {
        self.trust_score
    }

    pub fn is_legitimate(&self) -> bool {
        self.is_legitimate
    }

    pub fn is_accessible(&self) -> bool {
        self.is_accessible
    }

    pub fn http_status(&self) -> Option<u16> {
        self.http_status
    }

    pub fn has_ssl(&self) -> bool {
        self.has_ssl
    }

    pub fn ssl_valid(&self) -> bool {
        self.ssl_valid
    }

    pub fn certificate(&self) -> Option<&CertificateInfo> {
        self.certificate.as_ref()
    }

    pub fn domain_age_days(&self) -> Option<u32> {
        self.domain_age_days
    }

    pub fn suspicious_patterns(&self) -> &[SuspiciousPattern] {
        &self.suspicious_patterns
    }

    pub fn analysis_summary(&self) -> &str {
        &self.analysis_summary
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        self.timestamp
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn pattern_kind_names_match_serde_and_display() {
        for kind in PatternKind::iter() {
            let json = serde_json::to_string(&kind).unwrap();
            assert_eq!(json, format!("\"{kind}\""));
        }
        assert_eq!(PatternKind::IpAddressHost.to_string(), "ip_address_host");
    }

    #[test]
    fn tls_views() {
        let absent = TlsStatus::Absent;
        assert!(!absent.has_ssl() && !absent.ssl_valid());

        let bare = TlsStatus::Secured { certificate_present: false, certificate: None };
        assert!(bare.has_ssl());
        assert!(!bare.ssl_valid());
        assert!(bare.certificate().is_none());
    }
}
