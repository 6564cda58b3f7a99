// tests/pipeline.rs

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use chrono::Utc;

use url_trust_scanner::core::error::AnalysisError;
use url_trust_scanner::core::history::{HistoryError, MemoryResultLog, ResultLog, ScoreHistogram};
use url_trust_scanner::core::knowledge_base::Verdict;
use url_trust_scanner::core::models::{Accessibility, AnalysisResult, PatternKind, TlsStatus};
use url_trust_scanner::core::normalizer::NormalizedUrl;
use url_trust_scanner::core::scanner::http_scanner::AccessibilityProbe;
use url_trust_scanner::core::scanner::ssl_scanner::TlsProbe;
use url_trust_scanner::core::scanner::whois_scanner::{
    CreationDate, DomainAgeLookup, WhoisClient, WhoisError, WhoisRecord,
};
use url_trust_scanner::core::scanner::Analyzer;

// --- Stub Probes ---

struct StubHttp {
    outcome: Accessibility,
    delay: Duration,
    calls: AtomicUsize,
}

#[async_trait]
impl AccessibilityProbe for StubHttp {
    async fn check(&self, _url: &NormalizedUrl) -> Accessibility {
        self.calls.fetch_add(1, Ordering::SeqCst);
        tokio::time::sleep(self.delay).await;
        self.outcome
    }
}

struct StubTls {
    outcome: TlsStatus,
    delay: Duration,
}

#[async_trait]
impl TlsProbe for StubTls {
    async fn check(&self, _url: &NormalizedUrl) -> TlsStatus {
        tokio::time::sleep(self.delay).await;
        self.outcome.clone()
    }
}

enum StubWhois {
    AgedDays(i64),
    Failing,
    Hanging,
    Sleeping(Duration, i64),
}

impl WhoisClient for StubWhois {
    fn lookup(&self, domain: &str) -> Result<WhoisRecord, WhoisError> {
        let aged = |days: i64| WhoisRecord {
            domain: domain.to_string(),
            creation_date: Some(CreationDate::Timestamp(Utc::now() - chrono::Duration::days(days))),
            created: None,
        };
        match self {
            StubWhois::AgedDays(days) => Ok(aged(*days)),
            StubWhois::Failing => Err(WhoisError::EmptyResponse { server: "whois.test".into() }),
            StubWhois::Hanging => loop {
                thread::park();
            },
            StubWhois::Sleeping(delay, days) => {
                thread::sleep(*delay);
                Ok(aged(*days))
            }
        }
    }
}

struct FailingLog;

impl ResultLog for FailingLog {
    fn insert(&self, _result: &AnalysisResult) -> Result<(), HistoryError> {
        Err(HistoryError::Poisoned)
    }

    fn list_recent(&self, _limit: usize) -> Result<Vec<AnalysisResult>, HistoryError> {
        Err(HistoryError::Poisoned)
    }

    fn histogram(&self, _boundaries: &[u8]) -> Result<ScoreHistogram, HistoryError> {
        Err(HistoryError::Poisoned)
    }
}

fn analyzer(accessibility: Accessibility, tls: TlsStatus, whois: StubWhois) -> (Analyzer, Arc<StubHttp>) {
    let http = Arc::new(StubHttp { outcome: accessibility, delay: Duration::ZERO, calls: AtomicUsize::new(0) });
    let tls = Arc::new(StubTls { outcome: tls, delay: Duration::ZERO });
    let age = DomainAgeLookup::new(Arc::new(whois), Duration::from_secs(2));
    (Analyzer::new(http.clone(), tls, age), http)
}

fn healthy() -> (Analyzer, Arc<StubHttp>) {
    analyzer(
        Accessibility::Reachable { status: 200 },
        TlsStatus::Secured { certificate_present: true, certificate: None },
        StubWhois::AgedDays(5000),
    )
}

// --- Scenarios ---

#[tokio::test]
async fn phishing_lookalike_is_not_legitimate() {
    let (analyzer, _) = analyzer(
        Accessibility::Unreachable { status: None },
        TlsStatus::Absent,
        StubWhois::Failing,
    );

    let result = analyzer.analyze("paypal-secure-login.tk").await.unwrap();

    assert_eq!(result.url(), "https://paypal-secure-login.tk");
    assert!(result.trust_score() < 60);
    assert!(!result.is_legitimate());
    assert!(!result.is_accessible());
    assert!(!result.has_ssl());
    assert_eq!(result.domain_age_days(), None);

    let kinds: Vec<PatternKind> = result.suspicious_patterns().iter().map(|p| p.kind()).collect();
    assert!(kinds.contains(&PatternKind::SuspiciousTld));
    assert!(kinds.contains(&PatternKind::PhishingKeyword));
    assert!(result.analysis_summary().contains("Domain age could not be verified."));
}

#[tokio::test]
async fn established_site_is_trustworthy() {
    let (analyzer, _) = healthy();

    let result = analyzer.analyze("https://example.com").await.unwrap();

    assert!(result.trust_score() >= 80);
    assert!(result.is_legitimate());
    assert!(result.ssl_valid());
    assert_eq!(result.domain_age_days(), Some(5000));
    assert!(result.suspicious_patterns().is_empty());
    assert_eq!(
        result.analysis_summary().lines().next(),
        Some(Verdict::Trustworthy.banner())
    );
}

#[tokio::test]
async fn equivalent_inputs_score_the_same() {
    let (analyzer, _) = healthy();

    let bare = analyzer.analyze("  EXAMPLE.com ").await.unwrap();
    let full = analyzer.analyze("https://example.com").await.unwrap();

    assert_eq!(bare.url(), full.url());
    assert_eq!(bare.trust_score(), full.trust_score());
    assert_eq!(bare.analysis_summary(), full.analysis_summary());
    assert_ne!(bare.id(), full.id());
}

#[tokio::test]
async fn invalid_url_never_reaches_the_probes() {
    let (analyzer, http) = healthy();

    let err = analyzer.analyze("   ").await.unwrap_err();

    assert!(matches!(err, AnalysisError::InvalidUrl { .. }));
    assert_eq!(http.calls.load(Ordering::SeqCst), 0);
}

#[tokio::test]
async fn malformed_ip_host_is_analyzed_not_rejected() {
    let (analyzer, http) = analyzer(
        Accessibility::Unreachable { status: None },
        TlsStatus::Absent,
        StubWhois::AgedDays(5000),
    );

    let result = analyzer.analyze("999.999.999.999/login").await.unwrap();

    assert_eq!(result.url(), "https://999.999.999.999/login");
    assert_eq!(http.calls.load(Ordering::SeqCst), 1);
    assert_eq!(result.domain_age_days(), None);
    assert!(!result.is_legitimate());
    let kinds: Vec<PatternKind> = result.suspicious_patterns().iter().map(|p| p.kind()).collect();
    assert!(kinds.contains(&PatternKind::IpAddressHost));
}

#[tokio::test]
async fn hung_whois_only_costs_the_deadline() {
    let http = Arc::new(StubHttp {
        outcome: Accessibility::Reachable { status: 200 },
        delay: Duration::ZERO,
        calls: AtomicUsize::new(0),
    });
    let tls = Arc::new(StubTls {
        outcome: TlsStatus::Secured { certificate_present: true, certificate: None },
        delay: Duration::ZERO,
    });
    let age = DomainAgeLookup::new(Arc::new(StubWhois::Hanging), Duration::from_millis(300));
    let analyzer = Analyzer::new(http, tls, age);

    let started = Instant::now();
    let result = analyzer.analyze("example.org").await.unwrap();

    assert!(started.elapsed() < Duration::from_secs(3));
    assert_eq!(result.domain_age_days(), None);
    assert!(result.is_accessible());
}

#[tokio::test]
async fn probes_run_concurrently() {
    let delay = Duration::from_millis(400);
    let http = Arc::new(StubHttp {
        outcome: Accessibility::Reachable { status: 200 },
        delay,
        calls: AtomicUsize::new(0),
    });
    let tls = Arc::new(StubTls {
        outcome: TlsStatus::Secured { certificate_present: true, certificate: None },
        delay,
    });
    let age = DomainAgeLookup::new(Arc::new(StubWhois::Sleeping(delay, 400)), Duration::from_secs(5));
    let analyzer = Analyzer::new(http, tls, age);

    let started = Instant::now();
    let result = analyzer.analyze("example.net").await.unwrap();

    assert!(started.elapsed() < Duration::from_millis(1100));
    assert_eq!(result.domain_age_days(), Some(400));
}

#[tokio::test]
async fn results_are_recorded_in_history() {
    let log = Arc::new(MemoryResultLog::default());
    let (analyzer, _) = healthy();
    assert!(analyzer.history().is_none());
    let analyzer = analyzer.with_history(log.clone());
    assert!(analyzer.history().is_some());

    let first = analyzer.analyze("example.com").await.unwrap();
    let second = analyzer.analyze("paypal-secure-login.tk").await.unwrap();

    let recent = log.list_recent(10).unwrap();
    assert_eq!(recent.len(), 2);
    assert!(recent.contains(&first));
    assert!(recent.contains(&second));
}

#[tokio::test]
async fn history_failure_does_not_fail_the_analysis() {
    let (analyzer, _) = healthy();
    let analyzer = analyzer.with_history(Arc::new(FailingLog));

    let result = analyzer.analyze("example.com").await.unwrap();
    assert!(result.is_legitimate());
}
