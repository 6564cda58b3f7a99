//! Static, read-only knowledge the scanner relies on.
//! It holds the word lists the lexical rules match against, the weight and
//! title of every rule, and the verdict bands used to explain a trust score.
//! Keeping this data in one place means the rules themselves stay free of
//! magic strings.

use crate::core::models::PatternKind;
use strum::{Display, IntoEnumIterator};

// --- Word Lists ---

/// Top-level domains that are disproportionately used for throwaway sites.
pub const SUSPICIOUS_TLDS: &[&str] = &[".tk", ".ml", ".ga", ".cf", ".pw", ".top", ".click", ".download"];

/// Link-shortening services that hide the real destination.
pub const URL_SHORTENERS: &[&str] = &["bit.ly", "tinyurl.com", "t.co", "goo.gl", "ow.ly", "short.link"];

/// Words commonly used to dress up credential-harvesting pages.
pub const PHISHING_KEYWORDS: &[&str] = &[
    "login", "verify", "update", "secure", "account", "bank", "paypal", "amazon",
];

/// ACE prefix of an internationalized (punycode) label.
pub const PUNYCODE_PREFIX: &str = "xn--";

/// A hostname with more dots than this is flagged as a subdomain chain.
pub const MAX_HOST_DOTS: usize = 3;

/// A hostname longer than this many characters is flagged.
pub const MAX_HOST_LENGTH: usize = 50;

// --- Rule Catalogue ---

/// Descriptive entry for one lexical rule.
#[derive(Debug)]
pub struct RuleDetail {
    pub kind: PatternKind,
    /// A short, human-readable title for the rule.
    pub title: &'static str,
    /// Weight in `1..=10`; the scorer turns the sum of weights into a penalty.
    pub severity: u8,
    /// What the rule looks at.
    pub description: &'static str,
}

/// The rules in the order the pattern scanner evaluates them.
static RULES: &[RuleDetail] = &[
    RuleDetail {
        kind: PatternKind::SuspiciousTld,
        title: "Suspicious TLD",
        severity: 7,
        description: "Hostname ends with a top-level domain that is cheap or free to register and popular with throwaway sites.",
    },
    RuleDetail {
        kind: PatternKind::IpAddressHost,
        title: "IP address as domain",
        severity: 8,
        description: "Hostname is a raw IPv4 address instead of a registered name.",
    },
    RuleDetail {
        kind: PatternKind::ExcessiveSubdomains,
        title: "Excessive subdomains",
        severity: 6,
        description: "Hostname contains more than three dots, a common way to bury a brand name deep in a subdomain chain.",
    },
    RuleDetail {
        kind: PatternKind::UrlShortener,
        title: "URL shortener",
        severity: 5,
        description: "Hostname belongs to a link-shortening service that hides the final destination.",
    },
    RuleDetail {
        kind: PatternKind::PhishingKeyword,
        title: "Suspicious keyword",
        severity: 4,
        description: "Hostname or path contains a word typical of credential-harvesting pages. Reported once per keyword.",
    },
    RuleDetail {
        kind: PatternKind::Punycode,
        title: "Punycode domain",
        severity: 6,
        description: "Hostname contains an internationalized label, which can imitate a familiar name with look-alike characters.",
    },
    RuleDetail {
        kind: PatternKind::LongHostname,
        title: "Extremely long domain",
        severity: 5,
        description: "Hostname is longer than fifty characters.",
    },
];

/// Retrieves the catalogue entry for a rule.
pub fn get_rule_detail(kind: PatternKind) -> Option<&'static RuleDetail> {
    RULES.iter().find(|r| r.kind == kind)
}

/// Iterates the catalogue in evaluation order.
pub fn all_rules() -> impl Iterator<Item = &'static RuleDetail> {
    PatternKind::iter().filter_map(get_rule_detail)
}

/// Weight of a rule. Every kind has a catalogue entry, so the fallback is never hit in practice.
pub fn severity_of(kind: PatternKind) -> u8 {
    get_rule_detail(kind).map(|r| r.severity).unwrap_or(5)
}

// --- Verdict Bands ---

/// Coarse band a trust score falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum Verdict {
    #[strum(to_string = "Trustworthy")]
    Trustworthy,
    #[strum(to_string = "Minor concerns")]
    MinorConcerns,
    #[strum(to_string = "Concerning")]
    Concerning,
    #[strum(to_string = "Red flags")]
    RedFlags,
}

impl Verdict {
    pub fn from_score(score: u8) -> Self {
        if score >= 80 {
            Verdict::Trustworthy
        } else if score >= 60 {
            Verdict::MinorConcerns
        } else if score >= 40 {
            Verdict::Concerning
        } else {
            Verdict::RedFlags
        }
    }

    /// Opening statement of an analysis summary.
    pub fn banner(self) -> &'static str {
        match self {
            Verdict::Trustworthy => "✅ This website appears to be legitimate and trustworthy.",
            Verdict::MinorConcerns => "✅ This website appears to be legitimate with minor concerns.",
            Verdict::Concerning => "⚠️ This website has some concerning indicators but may be legitimate.",
            Verdict::RedFlags => "🚨 This website has multiple red flags and should be approached with caution.",
        }
    }
}
