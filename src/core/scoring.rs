// src/core/scoring.rs

//! Turns collected signals into a bounded trust score.
//!
//! One policy is implemented: start from a baseline of 100, apply the
//! signal adjustments below, subtract the capped pattern penalty, clamp to
//! `0..=100` and truncate to an integer.

use crate::core::models::{Signals, SuspiciousPattern};

pub const BASELINE: i32 = 100;
pub const INACCESSIBLE_PENALTY: i32 = 25;
pub const NO_TLS_PENALTY: i32 = 20;
pub const UNVERIFIED_CERTIFICATE_PENALTY: i32 = 10;
pub const UNKNOWN_AGE_PENALTY: i32 = 8;
pub const ESTABLISHED_AGE_BONUS: i32 = 15;
pub const MATURE_AGE_BONUS: i32 = 8;
pub const NEW_DOMAIN_PENALTY: i32 = 15;
pub const PATTERN_WEIGHT: f64 = 1.5;
pub const MAX_PATTERN_PENALTY: f64 = 40.0;

/// Scores at or above this are considered legitimate.
pub const LEGITIMACY_THRESHOLD: u8 = 60;

pub fn trust_score(signals: &Signals, patterns: &[SuspiciousPattern]) -> u8 {
    let mut score = BASELINE;

    if !signals.is_accessible() {
        score -= INACCESSIBLE_PENALTY;
    }

    if !signals.has_ssl() {
        score -= NO_TLS_PENALTY;
    } else if !signals.ssl_valid() {
        score -= UNVERIFIED_CERTIFICATE_PENALTY;
    }

    score += age_adjustment(signals.domain_age_days());

    let adjusted = f64::from(score) - pattern_penalty(patterns);
    adjusted.clamp(0.0, 100.0) as u8
}

pub fn is_legitimate(trust_score: u8) -> bool {
    trust_score >= LEGITIMACY_THRESHOLD
}

fn age_adjustment(age_days: Option<u32>) -> i32 {
    match age_days {
        None => -UNKNOWN_AGE_PENALTY,
        Some(days) if days > 365 => ESTABLISHED_AGE_BONUS,
        Some(days) if days > 30 => MATURE_AGE_BONUS,
        Some(days) if days < 7 => -NEW_DOMAIN_PENALTY,
        Some(_) => 0,
    }
}

fn pattern_penalty(patterns: &[SuspiciousPattern]) -> f64 {
    let total_severity: u32 = patterns.iter().map(|p| u32::from(p.severity())).sum();
    (f64::from(total_severity) * PATTERN_WEIGHT).min(MAX_PATTERN_PENALTY)
}
