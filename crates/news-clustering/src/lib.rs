//! Clustering Engine (component C).
//!
//! Groups incoming Articles by content fingerprint within a sliding time window,
//! scoring each cluster via the Four-Signal Calculator and Verdict Classifier on
//! every addition that reaches the minimum cluster size.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use core_types::{Article, Cluster, Verdict};
use log::debug;

const STOPWORDS: &[&str] = &[
    "the", "a", "an", "and", "or", "but", "in", "on", "at", "to", "for", "of", "with", "by",
    "is", "are", "was", "were", "be", "been", "being", "have", "has", "had", "do", "does",
    "did", "will", "would", "could", "should", "may", "might", "must", "can", "this", "that",
    "these", "those", "it", "its", "as", "from", "into", "about", "after", "before",
];

/// Matches the theme-keyword families; first match wins, in this order.
const THEME_KEYWORDS: &[(&str, &[&str])] = &[
    ("earnings_report", &["earnings", "eps", "quarterly results", "revenue"]),
    ("fda_approval", &["fda", "approval", "clinical trial"]),
    ("executive_change", &["ceo", "cfo", "resign", "appoint", "executive"]),
    ("merger_acquisition", &["merger", "acquisition", "acquire", "takeover"]),
    ("product_launch", &["launch", "unveil", "new product", "release"]),
    ("legal_issue", &["lawsuit", "sec investigation", "fraud", "indictment"]),
    ("partnership", &["partnership", "collaborate", "joint venture"]),
    ("guidance", &["guidance", "outlook", "forecast"]),
    ("analyst_rating", &["upgrade", "downgrade", "price target", "analyst"]),
    ("insider_trading", &["insider", "form 4", "10b5-1"]),
];

fn extract_theme(title: &str, body: &str) -> String {
    let haystack = format!("{} {}", title, body).to_lowercase();
    for (theme, keywords) in THEME_KEYWORDS {
        if keywords.iter().any(|kw| haystack.contains(kw)) {
            return theme.to_string();
        }
    }
    "general_news".to_string()
}

/// Lowercase title+body, drop stopwords, keep words of length >= 3, take the
/// top-10 by frequency, prepend the lowercase ticker, sort lexically, MD5 hex.
fn generate_fingerprint(ticker: &str, title: &str, body: &str) -> String {
    let text = format!("{} {}", title, body).to_lowercase();
    let mut counts: HashMap<&str, usize> = HashMap::new();
    for word in text.split_whitespace() {
        let word = word.trim_matches(|c: char| !c.is_alphanumeric());
        if word.len() < 3 || STOPWORDS.contains(&word) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
    let mut by_count: Vec<(&str, usize)> = counts.into_iter().collect();
    by_count.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(b.0)));
    by_count.truncate(10);

    let mut keywords: Vec<String> = by_count.into_iter().map(|(w, _)| w.to_string()).collect();
    keywords.push(ticker.to_lowercase());
    keywords.sort();

    let joined = keywords.join("_");
    format!("{:x}", md5::compute(joined.as_bytes()))
}

/// Keeps each fingerprint's *current* (still-open) generation plus every closed
/// generation that preceded it, so an expired cluster remains retrievable instead
/// of being silently overwritten by the next article under the same fingerprint.
pub struct ClusteringEngine {
    window: Duration,
    min_cluster_size: usize,
    max_age: Duration,
    /// fingerprint -> index of its current open generation in `clusters`.
    open: HashMap<String, usize>,
    clusters: Vec<Cluster>,
}

impl ClusteringEngine {
    pub fn new(window_minutes: i64, min_cluster_size: usize, max_age_hours: i64) -> Self {
        Self {
            window: Duration::minutes(window_minutes),
            min_cluster_size,
            max_age: Duration::hours(max_age_hours),
            open: HashMap::new(),
            clusters: Vec::new(),
        }
    }

    /// Default windows: 60 minute clustering window, minimum cluster size 2,
    /// 48 hour eviction.
    pub fn with_defaults() -> Self {
        Self::new(60, 2, 48)
    }

    /// Add one Article. Returns the Cluster it joined once that cluster reaches
    /// `min_cluster_size`, re-scored via the Four-Signal Calculator and Verdict
    /// Classifier; returns `None` while the cluster is still below that size.
    pub fn add_article(&mut self, article: Article, now: DateTime<Utc>) -> Option<&Cluster> {
        let ticker = article.ticker.clone().unwrap_or_default();
        let fingerprint = generate_fingerprint(&ticker, &article.title, &article.body);

        let open_idx = self.open.get(&fingerprint).copied();
        let reuse = open_idx
            .map(|idx| (article.published_at - self.clusters[idx].last_seen).abs() <= self.window)
            .unwrap_or(false);

        let idx = if reuse {
            let idx = open_idx.unwrap();
            let cluster = &mut self.clusters[idx];
            cluster.last_seen = article.published_at.max(cluster.last_seen);
            cluster.articles.push(article);
            idx
        } else {
            // Either a brand-new fingerprint, or the prior generation's window has
            // expired: that generation stays in `clusters`, closed, and a fresh one
            // opens under the same fingerprint.
            let theme = extract_theme(&article.title, &article.body);
            let cluster = Cluster {
                fingerprint: fingerprint.clone(),
                ticker,
                theme,
                first_seen: article.published_at,
                last_seen: article.published_at,
                articles: vec![article],
                di: 0.0,
                tn: 0.0,
                ni: 0.0,
                el: Default::default(),
                verdict: Verdict::Pending,
                verdict_reason: String::new(),
                confidence_multiplier: 1.0,
                cooling_intensity: 0.0,
                cooling_until: None,
            };
            self.clusters.push(cluster);
            let idx = self.clusters.len() - 1;
            self.open.insert(fingerprint, idx);
            idx
        };

        if self.clusters[idx].articles.len() < self.min_cluster_size {
            return None;
        }

        self.rescore(idx, now);
        debug!(
            "cluster {} reached size {} (verdict {:?})",
            self.clusters[idx].fingerprint,
            self.clusters[idx].articles.len(),
            self.clusters[idx].verdict
        );
        Some(&self.clusters[idx])
    }

    fn rescore(&mut self, idx: usize, now: DateTime<Utc>) {
        let cluster = &self.clusters[idx];
        let result = four_signal::score(&cluster.articles, &cluster.theme, now);
        let cluster = &mut self.clusters[idx];
        cluster.di = result.di;
        cluster.tn = result.tn;
        cluster.ni = result.ni;
        cluster.el = result.el;
        cluster.verdict = result.verdict.verdict;
        cluster.verdict_reason = result.verdict.reason;
        cluster.confidence_multiplier = result.verdict.confidence_multiplier;
        cluster.cooling_intensity = result.verdict.cooling_intensity;
        cluster.cooling_until = result.verdict.cooling_until;
    }

    pub fn get_cluster(&self, fingerprint: &str) -> Option<&Cluster> {
        self.open
            .get(fingerprint)
            .map(|&idx| &self.clusters[idx])
    }

    pub fn get_ticker_clusters(&self, ticker: &str) -> Vec<&Cluster> {
        self.clusters
            .iter()
            .filter(|c| c.ticker.eq_ignore_ascii_case(ticker) && c.articles.len() >= self.min_cluster_size)
            .collect()
    }

    /// Clusters last seen within `max_age_hours`, newest first.
    pub fn get_active_clusters(&self, now: DateTime<Utc>, max_age_hours: i64) -> Vec<&Cluster> {
        let cutoff = now - Duration::hours(max_age_hours);
        let mut active: Vec<&Cluster> = self
            .clusters
            .iter()
            .filter(|c| c.last_seen >= cutoff && c.articles.len() >= self.min_cluster_size)
            .collect();
        active.sort_by(|a, b| b.last_seen.cmp(&a.last_seen));
        active
    }

    /// Removes clusters whose last-seen predates `now - max_age`. Closed
    /// generations are evicted the same as open ones; an evicted open generation
    /// is also dropped from `open` so a subsequent article starts fresh.
    pub fn cleanup_old_clusters(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - self.max_age;
        let before = self.clusters.len();
        let keep: Vec<bool> = self.clusters.iter().map(|c| c.last_seen >= cutoff).collect();

        let mut new_clusters = Vec::with_capacity(self.clusters.len());
        let mut remap: HashMap<usize, usize> = HashMap::new();
        for (old_idx, cluster) in self.clusters.drain(..).enumerate() {
            if keep[old_idx] {
                remap.insert(old_idx, new_clusters.len());
                new_clusters.push(cluster);
            }
        }
        self.clusters = new_clusters;
        self.open = self
            .open
            .iter()
            .filter_map(|(fp, &old_idx)| remap.get(&old_idx).map(|&new_idx| (fp.clone(), new_idx)))
            .collect();

        before - self.clusters.len()
    }

    pub fn get_cluster_stats(&self) -> ClusterStats {
        let total = self.clusters.len();
        let scored = self
            .clusters
            .iter()
            .filter(|c| c.articles.len() >= self.min_cluster_size)
            .count();
        let mut by_verdict: HashMap<String, usize> = HashMap::new();
        let mut total_articles = 0usize;
        for cluster in &self.clusters {
            *by_verdict.entry(format!("{:?}", cluster.verdict)).or_insert(0) += 1;
            total_articles += cluster.articles.len();
        }
        let avg_articles = if total == 0 {
            0.0
        } else {
            total_articles as f64 / total as f64
        };
        ClusterStats {
            total_clusters: total,
            scored_clusters: scored,
            verdict_distribution: by_verdict,
            avg_articles_per_cluster: avg_articles,
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClusterStats {
    pub total_clusters: usize,
    pub scored_clusters: usize,
    pub verdict_distribution: HashMap<String, usize>,
    pub avg_articles_per_cluster: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::SourceTier;

    fn article(id: &str, ticker: &str, title: &str, source: &str, ts: DateTime<Utc>) -> Article {
        Article {
            id: id.to_string(),
            ticker: Some(ticker.to_string()),
            title: title.to_string(),
            body: title.to_string(),
            source_name: source.to_string(),
            source_tier: SourceTier::Unknown,
            published_at: ts,
            url: None,
            sentiment: None,
        }
    }

    #[test]
    fn below_minimum_size_returns_none() {
        let mut engine = ClusteringEngine::with_defaults();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        let result = engine.add_article(article("a1", "TSLA", "TSLA to $5000! Buy now!", "site-1.com", now), now);
        assert!(result.is_none());
    }

    #[test]
    fn second_matching_article_joins_and_scores() {
        let mut engine = ClusteringEngine::with_defaults();
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        engine.add_article(article("a1", "TSLA", "TSLA to $5000! Buy now!", "site-1.com", now), now);
        let result = engine.add_article(
            article("a2", "TSLA", "TSLA to $5000! Buy now!", "site-2.com", now + Duration::seconds(1)),
            now + Duration::seconds(1),
        );
        assert!(result.is_some());
        assert_eq!(result.unwrap().articles.len(), 2);
    }

    #[test]
    fn expired_window_opens_new_generation_without_discarding_the_old_one() {
        let mut engine = ClusteringEngine::new(60, 2, 48);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        engine.add_article(article("a1", "TSLA", "TSLA to $5000! Buy now!", "site-1.com", now), now);
        engine.add_article(
            article("a2", "TSLA", "TSLA to $5000! Buy now!", "site-2.com", now + Duration::seconds(1)),
            now + Duration::seconds(1),
        );
        let first_generation_size = engine.get_ticker_clusters("TSLA")[0].articles.len();
        assert_eq!(first_generation_size, 2);

        let later = now + Duration::minutes(120);
        engine.add_article(article("a3", "TSLA", "TSLA to $5000! Buy now!", "site-3.com", later), later);
        engine.add_article(
            article("a4", "TSLA", "TSLA to $5000! Buy now!", "site-4.com", later + Duration::seconds(1)),
            later + Duration::seconds(1),
        );

        // Both generations (closed + open) must still be present, not overwritten.
        let clusters = engine.get_ticker_clusters("TSLA");
        assert_eq!(clusters.len(), 2);
        assert!(clusters.iter().any(|c| c.articles.len() == 2 && c.last_seen == now + Duration::seconds(1)));
    }

    #[test]
    fn cleanup_evicts_only_stale_clusters() {
        let mut engine = ClusteringEngine::new(60, 2, 48);
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 10, 0, 0).unwrap();
        engine.add_article(article("a1", "TSLA", "TSLA to $5000! Buy now!", "site-1.com", now), now);
        engine.add_article(
            article("a2", "TSLA", "TSLA to $5000! Buy now!", "site-2.com", now + Duration::seconds(1)),
            now + Duration::seconds(1),
        );
        let removed = engine.cleanup_old_clusters(now + Duration::hours(49));
        assert_eq!(removed, 1);
        assert!(engine.get_ticker_clusters("TSLA").is_empty());
    }

    #[test]
    fn theme_extraction_matches_first_family() {
        assert_eq!(extract_theme("Company announces merger with rival", ""), "merger_acquisition");
        assert_eq!(extract_theme("Random unrelated headline", ""), "general_news");
    }

    #[test]
    fn fingerprint_is_stable_for_identical_content() {
        let f1 = generate_fingerprint("TSLA", "TSLA to $5000! Buy now!", "TSLA to $5000! Buy now!");
        let f2 = generate_fingerprint("TSLA", "TSLA to $5000! Buy now!", "TSLA to $5000! Buy now!");
        assert_eq!(f1, f2);
        assert_eq!(f1.len(), 32);
    }
}
