//! Verdict Classifier (component E) and the News Fraud Probability Index (NFPI).

use chrono::{DateTime, Duration, Utc};
use core_types::{EventLegitimacy, Verdict};

/// The full result of classifying one Cluster's (DI, TN, NI, EL) tuple.
#[derive(Debug, Clone)]
pub struct VerdictOutcome {
    pub verdict: Verdict,
    pub reason: String,
    pub confidence_multiplier: f64,
    pub cooling_intensity: f64,
    pub cooling_until: Option<DateTime<Utc>>,
    pub nfpi: f64,
}

/// First matching rule wins, in the order below.
pub fn classify(di: f64, tn: f64, ni: f64, el: &EventLegitimacy, now: DateTime<Utc>) -> VerdictOutcome {
    let nfpi = compute_nfpi(di, ni, tn, el);

    let (verdict, reason, confidence_multiplier, cooling) = if el.matched && el.confidence > 0.7 {
        (
            Verdict::EmbargoEvent,
            "matched a scheduled event window with high confidence".to_string(),
            1.5,
            None,
        )
    } else if di < 0.4 && ni < 0.4 && tn < -0.5 {
        (
            Verdict::ManipulationAttack,
            "low source diversity, low narrative independence, and a scripted burst".to_string(),
            0.0,
            Some((Duration::hours(24), 1.0)),
        )
    } else if tn < -0.6 || (di < 0.5 && ni < 0.5) {
        (
            Verdict::SuspiciousBurst,
            "burst timing or weak diversity and independence".to_string(),
            0.3,
            Some((Duration::minutes(30), 0.7)),
        )
    } else if di > 0.7 && ni > 0.6 {
        (
            Verdict::OrganicConsensus,
            "high source diversity and narrative independence".to_string(),
            1.2,
            None,
        )
    } else {
        (
            Verdict::ViralTrend,
            "no strong signal in either direction".to_string(),
            1.0,
            None,
        )
    };

    let (cooling_until, cooling_intensity) = match cooling {
        Some((duration, intensity)) => (Some(now + duration), intensity),
        None => (None, 0.0),
    };

    VerdictOutcome {
        verdict,
        reason,
        confidence_multiplier,
        cooling_intensity,
        cooling_until,
        nfpi,
    }
}

fn compute_nfpi(di: f64, ni: f64, tn: f64, el: &EventLegitimacy) -> f64 {
    let raw = 100.0
        * (0.3 * (1.0 - di)
            + 0.3 * (1.0 - ni)
            + 0.2 * (-tn).max(0.0)
            + 0.2 * if el.matched { 0.0 } else { 1.0 });
    (raw * 100.0).round() / 100.0
}
