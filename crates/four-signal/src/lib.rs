//! Four-Signal Calculator (component D) and Verdict Classifier (component E).
//!
//! Both are pure: given a Cluster's Article list, theme, and first-seen timestamp,
//! [`score`] returns the four signals plus the verdict, confidence multiplier, and
//! cooling window the Clustering Engine writes back onto the Cluster.

pub mod calculator;
pub mod verdict;

pub use calculator::{diversity_integrity, event_legitimacy, narrative_independence, temporal_naturalness};
pub use verdict::{classify, VerdictOutcome};

use chrono::{DateTime, Utc};
use core_types::{Article, EventLegitimacy};

#[derive(Debug, Clone)]
pub struct FourSignalResult {
    pub di: f64,
    pub tn: f64,
    pub ni: f64,
    pub el: EventLegitimacy,
    pub verdict: VerdictOutcome,
}

/// Recompute all four signals and the verdict for a cluster's current articles.
pub fn score(articles: &[Article], theme: &str, now: DateTime<Utc>) -> FourSignalResult {
    let di = calculator::diversity_integrity(articles);
    let tn = calculator::temporal_naturalness(articles);
    let ni = calculator::narrative_independence(articles);
    let first_seen = articles
        .iter()
        .map(|a| a.published_at)
        .min()
        .unwrap_or(now);
    let el = calculator::event_legitimacy(first_seen, theme, articles);
    let verdict = verdict::classify(di, tn, ni, &el, now);
    FourSignalResult { di, tn, ni, el, verdict }
}
