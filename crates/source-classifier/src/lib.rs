//! Source Classifier (component A).
//!
//! Deterministic mapping `(source_name, url?) -> SourceInfo` used to weight the
//! Four-Signal Calculator's diversity-integrity score. Pure, in-memory, re-entrant.

use core_types::{SourceInfo, SourceTier};

struct MajorEntry {
    name: &'static str,
    credibility: f64,
    country: &'static str,
    category: &'static str,
}

/// Curated major-outlet table. Credibility and metadata mirror the newsroom's own
/// trust tiers, not a generic whitelist.
const MAJOR_SOURCES: &[MajorEntry] = &[
    MajorEntry { name: "Bloomberg", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Bloomberg News", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Bloomberg.com", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Reuters", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Reuters.com", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Wall Street Journal", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "WSJ", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "WSJ.com", credibility: 0.95, country: "US", category: "financial" },
    MajorEntry { name: "Financial Times", credibility: 0.95, country: "UK", category: "financial" },
    MajorEntry { name: "FT", credibility: 0.95, country: "UK", category: "financial" },
    MajorEntry { name: "FT.com", credibility: 0.95, country: "UK", category: "financial" },
    MajorEntry { name: "CNBC", credibility: 0.90, country: "US", category: "financial" },
    MajorEntry { name: "MarketWatch", credibility: 0.85, country: "US", category: "financial" },
    MajorEntry { name: "Barron's", credibility: 0.90, country: "US", category: "financial" },
    MajorEntry { name: "Investor's Business Daily", credibility: 0.85, country: "US", category: "financial" },
    MajorEntry { name: "The Economist", credibility: 0.90, country: "UK", category: "financial" },
    MajorEntry { name: "Associated Press", credibility: 0.95, country: "US", category: "general" },
    MajorEntry { name: "AP", credibility: 0.95, country: "US", category: "general" },
    MajorEntry { name: "AP News", credibility: 0.95, country: "US", category: "general" },
    MajorEntry { name: "New York Times", credibility: 0.90, country: "US", category: "general" },
    MajorEntry { name: "NYTimes", credibility: 0.90, country: "US", category: "general" },
    MajorEntry { name: "Washington Post", credibility: 0.90, country: "US", category: "general" },
    MajorEntry { name: "USA Today", credibility: 0.80, country: "US", category: "general" },
    MajorEntry { name: "CNN", credibility: 0.75, country: "US", category: "general" },
    MajorEntry { name: "Fox Business", credibility: 0.75, country: "US", category: "financial" },
    MajorEntry { name: "연합뉴스", credibility: 0.90, country: "KR", category: "general" },
    MajorEntry { name: "Yonhap", credibility: 0.90, country: "KR", category: "general" },
    MajorEntry { name: "조선일보", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "Chosun Ilbo", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "중앙일보", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "JoongAng Ilbo", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "동아일보", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "Donga Ilbo", credibility: 0.85, country: "KR", category: "general" },
    MajorEntry { name: "한국경제", credibility: 0.90, country: "KR", category: "financial" },
    MajorEntry { name: "Hankyung", credibility: 0.90, country: "KR", category: "financial" },
    MajorEntry { name: "매일경제", credibility: 0.90, country: "KR", category: "financial" },
    MajorEntry { name: "Maeil Business", credibility: 0.90, country: "KR", category: "financial" },
    MajorEntry { name: "서울경제", credibility: 0.85, country: "KR", category: "financial" },
    MajorEntry { name: "TechCrunch", credibility: 0.80, country: "US", category: "tech" },
    MajorEntry { name: "The Verge", credibility: 0.80, country: "US", category: "tech" },
    MajorEntry { name: "Ars Technica", credibility: 0.85, country: "US", category: "tech" },
    MajorEntry { name: "CNET", credibility: 0.75, country: "US", category: "tech" },
    MajorEntry { name: "BBC", credibility: 0.90, country: "UK", category: "general" },
    MajorEntry { name: "BBC News", credibility: 0.90, country: "UK", category: "general" },
    MajorEntry { name: "Guardian", credibility: 0.85, country: "UK", category: "general" },
    MajorEntry { name: "The Guardian", credibility: 0.85, country: "UK", category: "general" },
];

const SOCIAL_PLATFORMS: &[&str] = &[
    "Reddit", "Twitter", "X.com", "Facebook", "LinkedIn",
    "Medium", "Substack", "YouTube", "TikTok", "Instagram",
    "Discord", "Telegram", "WeChat", "KakaoTalk",
    "네이버 블로그", "다음 블로그", "티스토리",
];

const TRUSTED_DOMAINS: &[&str] = &[".gov", ".edu", ".mil", ".go.kr", ".ac.kr"];
const SOCIAL_DOMAINS: &[&str] = &["reddit.com", "twitter.com", "x.com", "facebook.com"];

/// Classifies news sources into credibility tiers. Stateless aside from its
/// curated tables, so a single instance can be shared across the pipeline.
#[derive(Debug, Default, Clone, Copy)]
pub struct SourceClassifier;

impl SourceClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify a source name, optionally backed by its article URL.
    pub fn classify(&self, source: &str, url: Option<&str>) -> SourceInfo {
        let source_lower = source.to_lowercase();

        // Step 1/2: exact then substring match against the curated MAJOR table.
        if let Some(info) = Self::major_match(&source_lower) {
            return info;
        }

        // Step 3: social platform substring match.
        if SOCIAL_PLATFORMS
            .iter()
            .any(|s| source_lower.contains(&s.to_lowercase()))
        {
            return SourceInfo {
                tier: SourceTier::Social,
                credibility: 0.2,
                country: None,
                category: Some("social".to_string()),
            };
        }

        // Step 4: URL domain heuristics.
        if let Some(url) = url {
            let url_lower = url.to_lowercase();
            if TRUSTED_DOMAINS.iter().any(|d| url_lower.contains(d)) {
                return SourceInfo {
                    tier: SourceTier::Major,
                    credibility: 0.90,
                    country: None,
                    category: Some("official".to_string()),
                };
            }
            if SOCIAL_DOMAINS.iter().any(|d| url_lower.contains(d)) {
                return SourceInfo {
                    tier: SourceTier::Social,
                    credibility: 0.2,
                    country: None,
                    category: Some("social".to_string()),
                };
            }
        }

        // Step 5: name-pattern heuristics.
        let (credibility, tier) = Self::apply_heuristics(source, &source_lower);
        SourceInfo {
            tier,
            credibility,
            country: None,
            category: Some("unknown".to_string()),
        }
    }

    fn major_match(source_lower: &str) -> Option<SourceInfo> {
        if let Some(entry) = MAJOR_SOURCES
            .iter()
            .find(|e| e.name.to_lowercase() == source_lower)
        {
            return Some(Self::info_from_entry(entry));
        }
        MAJOR_SOURCES
            .iter()
            .find(|e| {
                let major_lower = e.name.to_lowercase();
                major_lower.contains(source_lower) || source_lower.contains(major_lower.as_str())
            })
            .map(Self::info_from_entry)
    }

    fn info_from_entry(entry: &MajorEntry) -> SourceInfo {
        SourceInfo {
            tier: SourceTier::Major,
            credibility: entry.credibility,
            country: Some(entry.country.to_string()),
            category: Some(entry.category.to_string()),
        }
    }

    fn apply_heuristics(source: &str, source_lower: &str) -> (f64, SourceTier) {
        if ["blog", "blogger", "opinion", "analyst", "substack"]
            .iter()
            .any(|kw| source_lower.contains(kw))
        {
            return (0.3, SourceTier::Social);
        }
        if ["times", "post", "herald", "tribune", "journal"]
            .iter()
            .any(|kw| source_lower.contains(kw))
        {
            return (0.5, SourceTier::Minor);
        }
        if ["news", "today", "daily", "press", "gazette"]
            .iter()
            .any(|kw| source_lower.contains(kw))
        {
            return (0.5, SourceTier::Minor);
        }
        if ["finance", "economic", "market", "invest", "trade"]
            .iter()
            .any(|kw| source_lower.contains(kw))
        {
            return (0.5, SourceTier::Minor);
        }
        if source.chars().any(|c| c.is_ascii_digit()) {
            return (0.3, SourceTier::Unknown);
        }
        if source.chars().count() < 5 {
            return (0.3, SourceTier::Unknown);
        }
        (0.4, SourceTier::Unknown)
    }

    /// Quick check used by the Four-Signal Calculator's `+0.2 if any MAJOR` bonus.
    pub fn is_major_source(&self, source: &str) -> bool {
        self.classify(source, None).tier == SourceTier::Major
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exact_major_match() {
        let c = SourceClassifier::new();
        let info = c.classify("Bloomberg", None);
        assert_eq!(info.tier, SourceTier::Major);
        assert!((info.credibility - 0.95).abs() < 1e-9);
    }

    #[test]
    fn korean_major_match() {
        let c = SourceClassifier::new();
        assert_eq!(c.classify("연합뉴스", None).tier, SourceTier::Major);
    }

    #[test]
    fn social_platform_match() {
        let c = SourceClassifier::new();
        assert_eq!(c.classify("Reddit", None).tier, SourceTier::Social);
    }

    #[test]
    fn trusted_domain_without_known_name() {
        let c = SourceClassifier::new();
        let info = c.classify("randomsite123.com", Some("http://randomsite123.gov/article"));
        assert_eq!(info.tier, SourceTier::Major);
    }

    #[test]
    fn heuristic_blog_is_social() {
        let c = SourceClassifier::new();
        assert_eq!(c.classify("Some Finance Blog", None).tier, SourceTier::Social);
    }

    #[test]
    fn heuristic_digits_are_unknown() {
        let c = SourceClassifier::new();
        assert_eq!(c.classify("site123", None).tier, SourceTier::Unknown);
    }

    #[test]
    fn heuristic_short_name_is_unknown() {
        let c = SourceClassifier::new();
        assert_eq!(c.classify("ABC", None).tier, SourceTier::Unknown);
    }

    #[test]
    fn default_unknown_fallback() {
        let c = SourceClassifier::new();
        let info = c.classify("Some Random Site Network", None);
        assert_eq!(info.tier, SourceTier::Unknown);
        assert!((info.credibility - 0.4).abs() < 1e-9);
    }

    #[test]
    fn tier_weight_matches_di_table() {
        assert_eq!(SourceTier::Major.weight(), 2.0);
        assert_eq!(SourceTier::Minor.weight(), 0.5);
        assert_eq!(SourceTier::Social.weight(), 0.1);
        assert_eq!(SourceTier::Unknown.weight(), 0.3);
    }
}
