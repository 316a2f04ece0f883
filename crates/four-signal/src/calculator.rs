//! Four-Signal Calculator (component D).
//!
//! Four pure functions over a Cluster's current Article list: Diversity Integrity
//! (DI), Temporal Naturalness (TN), Narrative Independence (NI), and Event
//! Legitimacy (EL). None of them hold state; the Clustering Engine recomputes all
//! four on every Article addition.

use std::collections::HashSet;

use chrono::{DateTime, Timelike, Utc};
use core_types::{Article, EventLegitimacy, SourceTier};
use event_calendar::is_clean_time;

const EARNINGS_KEYWORDS: &[&str] = &[
    "earnings", "eps", "revenue", "quarterly results", "guidance", "q1", "q2", "q3", "q4",
];
const FOMC_KEYWORDS: &[&str] = &[
    "fomc", "fed", "federal reserve", "interest rate", "rate decision", "rate cut", "rate hike",
];
const ECON_KEYWORDS: &[&str] = &[
    "cpi", "inflation", "nfp", "payrolls", "gdp", "unemployment", "ppi", "retail sales",
];

/// DI: how many, how credible, and how varied the sources backing this cluster are.
pub fn diversity_integrity(articles: &[Article]) -> f64 {
    if articles.is_empty() {
        return 0.0;
    }
    let mut seen_sources: HashSet<String> = HashSet::new();
    let mut total_weight = 0.0;
    let mut has_major = false;
    for article in articles {
        if article.source_tier == SourceTier::Major {
            has_major = true;
        }
        let key = article.source_name.to_lowercase();
        let weight = article.source_tier.weight();
        if seen_sources.insert(key) {
            total_weight += weight;
        } else {
            total_weight += weight * 0.5;
        }
    }
    let base = (total_weight / articles.len() as f64).min(1.0);
    let mut di = base;
    if has_major {
        di += 0.2;
    }
    di += (seen_sources.len() as f64 / 10.0).min(0.2);
    di.clamp(0.0, 1.0)
}

/// TN: positive means natural spread, negative means a suspicious burst.
pub fn temporal_naturalness(articles: &[Article]) -> f64 {
    if articles.len() < 2 {
        return 0.0;
    }
    let mut timestamps: Vec<DateTime<Utc>> = articles.iter().map(|a| a.published_at).collect();
    timestamps.sort();
    let first = *timestamps.first().unwrap();
    let last = *timestamps.last().unwrap();
    let span = (last - first).num_seconds() as f64;

    if span < 60.0 {
        return if is_clean_time(first) { 0.8 } else { -0.8 };
    }
    if span < 600.0 {
        let gaps: Vec<f64> = timestamps
            .windows(2)
            .map(|w| (w[1] - w[0]).num_seconds() as f64)
            .collect();
        return if gap_variance(&gaps) < 10.0 { -0.5 } else { 0.3 };
    }
    0.5
}

fn gap_variance(gaps: &[f64]) -> f64 {
    if gaps.is_empty() {
        return 0.0;
    }
    let mean = gaps.iter().sum::<f64>() / gaps.len() as f64;
    gaps.iter().map(|g| (g - mean).powi(2)).sum::<f64>() / gaps.len() as f64
}

/// NI: higher means more genuine content variety, lower means copy-paste reposting.
pub fn narrative_independence(articles: &[Article]) -> f64 {
    if articles.len() < 2 {
        return 0.5;
    }
    let token_sets: Vec<HashSet<String>> = articles.iter().map(tokenize).collect();
    let mut similarities = Vec::new();
    for i in 0..token_sets.len() {
        for j in (i + 1)..token_sets.len() {
            similarities.push(jaccard(&token_sets[i], &token_sets[j]));
        }
    }
    let avg = similarities.iter().sum::<f64>() / similarities.len() as f64;
    let mut ni = 1.0 - avg;
    if avg > 0.9 {
        ni *= 0.3;
    }
    ni
}

fn tokenize(article: &Article) -> HashSet<String> {
    format!("{} {}", article.title, article.body)
        .to_lowercase()
        .split_whitespace()
        .map(|s| s.to_string())
        .collect()
}

fn jaccard(a: &HashSet<String>, b: &HashSet<String>) -> f64 {
    if a.is_empty() && b.is_empty() {
        return 1.0;
    }
    let intersection = a.intersection(b).count() as f64;
    let union = a.union(b).count() as f64;
    if union == 0.0 {
        0.0
    } else {
        intersection / union
    }
}

/// EL: whether the cluster's first-seen timestamp and theme line up with a known
/// scheduled event family (earnings, FOMC, economic data releases).
pub fn event_legitimacy(
    first_seen: DateTime<Utc>,
    theme: &str,
    articles: &[Article],
) -> EventLegitimacy {
    let haystack = build_haystack(theme, articles);
    let is_fomc = FOMC_KEYWORDS.iter().any(|kw| haystack.contains(kw));
    let is_earnings = EARNINGS_KEYWORDS.iter().any(|kw| haystack.contains(kw));
    let is_econ = ECON_KEYWORDS.iter().any(|kw| haystack.contains(kw));

    if is_clean_time(first_seen) {
        if is_fomc {
            return EventLegitimacy {
                matched: true,
                confidence: 0.95,
                event_name: Some("FOMC Rate Decision".to_string()),
            };
        }
        if is_earnings {
            return EventLegitimacy {
                matched: true,
                confidence: 0.90,
                event_name: Some("Earnings Release".to_string()),
            };
        }
        if is_econ {
            return EventLegitimacy {
                matched: true,
                confidence: 0.85,
                event_name: Some("Economic Data Release".to_string()),
            };
        }
    }

    if is_earnings && matches!(first_seen.hour(), 8 | 9 | 16 | 17) {
        return EventLegitimacy {
            matched: true,
            confidence: 0.75,
            event_name: Some("Earnings Release".to_string()),
        };
    }

    EventLegitimacy::default()
}

fn build_haystack(theme: &str, articles: &[Article]) -> String {
    let mut haystack = theme.to_lowercase();
    for article in articles {
        haystack.push(' ');
        haystack.push_str(&article.title.to_lowercase());
    }
    haystack
}
