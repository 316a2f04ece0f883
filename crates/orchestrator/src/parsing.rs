//! Turns a Completer's raw text into an `Analysis`.
//!
//! The happy path expects a JSON object matching `Analysis`'s fields; when the
//! completion is malformed (`ParseFailure`, §7) a keyword heuristic parser
//! produces a lower-confidence Analysis instead of failing the cycle.

use core_types::{Analysis, Article, RelatedTicker, RiskCategory, SentimentLabel, Urgency};
use serde::Deserialize;

#[derive(Deserialize)]
struct RawAnalysis {
    sentiment_label: String,
    sentiment_score: f64,
    confidence: f64,
    urgency: String,
    impact_magnitude: f64,
    risk_category: String,
    trading_actionable: bool,
    #[serde(default)]
    related_tickers: Vec<RawRelatedTicker>,
}

#[derive(Deserialize)]
struct RawRelatedTicker {
    ticker: String,
    relevance: f64,
    sentiment: f64,
}

const POSITIVE_WORDS: &[&str] = &["beat", "surge", "soar", "upgrade", "record", "growth", "strong", "approval", "rally"];
const NEGATIVE_WORDS: &[&str] = &["miss", "plunge", "crash", "downgrade", "lawsuit", "recall", "fraud", "investigation", "slump"];

pub fn parse_analysis(article: &Article, text: &str) -> Analysis {
    match serde_json::from_str::<RawAnalysis>(text) {
        Ok(raw) => Analysis {
            article_id: article.id.clone(),
            sentiment_label: parse_sentiment_label(&raw.sentiment_label),
            sentiment_score: raw.sentiment_score.clamp(-1.0, 1.0),
            confidence: raw.confidence.clamp(0.0, 1.0),
            urgency: parse_urgency(&raw.urgency),
            impact_magnitude: raw.impact_magnitude.clamp(0.0, 1.0),
            risk_category: parse_risk(&raw.risk_category),
            trading_actionable: raw.trading_actionable,
            related_tickers: raw
                .related_tickers
                .into_iter()
                .map(|t| RelatedTicker { ticker: t.ticker, relevance: t.relevance, sentiment: t.sentiment })
                .collect(),
        },
        Err(_) => fallback_heuristic(article, text),
    }
}

/// Keyword-count heuristic. Always produces `confidence <= 0.5` per §7.
fn fallback_heuristic(article: &Article, text: &str) -> Analysis {
    let haystack = format!("{} {} {}", article.title, article.body, text).to_lowercase();
    let positives = POSITIVE_WORDS.iter().filter(|w| haystack.contains(*w)).count();
    let negatives = NEGATIVE_WORDS.iter().filter(|w| haystack.contains(*w)).count();

    let (label, score) = match positives.cmp(&negatives) {
        std::cmp::Ordering::Greater => (SentimentLabel::Positive, 0.4),
        std::cmp::Ordering::Less => (SentimentLabel::Negative, -0.4),
        std::cmp::Ordering::Equal => (SentimentLabel::Neutral, 0.0),
    };

    let related_tickers = article
        .ticker
        .clone()
        .map(|ticker| vec![RelatedTicker { ticker, relevance: 75.0, sentiment: score }])
        .unwrap_or_default();

    Analysis {
        article_id: article.id.clone(),
        sentiment_label: label,
        sentiment_score: score,
        confidence: 0.5,
        urgency: Urgency::Medium,
        impact_magnitude: 0.5,
        risk_category: RiskCategory::Medium,
        trading_actionable: !related_tickers.is_empty(),
        related_tickers,
    }
}

fn parse_sentiment_label(s: &str) -> SentimentLabel {
    match s.to_lowercase().as_str() {
        "positive" => SentimentLabel::Positive,
        "negative" => SentimentLabel::Negative,
        _ => SentimentLabel::Neutral,
    }
}

fn parse_urgency(s: &str) -> Urgency {
    match s.to_lowercase().as_str() {
        "immediate" => Urgency::Immediate,
        "high" => Urgency::High,
        "low" => Urgency::Low,
        _ => Urgency::Medium,
    }
}

fn parse_risk(s: &str) -> RiskCategory {
    match s.to_lowercase().as_str() {
        "low" => RiskCategory::Low,
        "high" => RiskCategory::High,
        "critical" => RiskCategory::Critical,
        _ => RiskCategory::Medium,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use core_types::SourceTier;

    fn article() -> Article {
        Article {
            id: "a1".to_string(),
            ticker: Some("AAPL".to_string()),
            title: "AAPL beats earnings expectations".to_string(),
            body: "Strong quarterly growth reported.".to_string(),
            source_name: "Reuters".to_string(),
            source_tier: SourceTier::Major,
            published_at: Utc::now(),
            url: None,
            sentiment: None,
        }
    }

    #[test]
    fn well_formed_json_parses_directly() {
        let text = r#"{"sentiment_label":"positive","sentiment_score":0.7,"confidence":0.9,"urgency":"high","impact_magnitude":0.8,"risk_category":"low","trading_actionable":true,"related_tickers":[{"ticker":"AAPL","relevance":90,"sentiment":0.7}]}"#;
        let analysis = parse_analysis(&article(), text);
        assert_eq!(analysis.sentiment_label, SentimentLabel::Positive);
        assert!((analysis.confidence - 0.9).abs() < 1e-9);
        assert_eq!(analysis.related_tickers[0].ticker, "AAPL");
    }

    #[test]
    fn malformed_completion_falls_back_to_heuristic_with_capped_confidence() {
        let analysis = parse_analysis(&article(), "not json at all");
        assert!(analysis.confidence <= 0.5);
        assert_eq!(analysis.sentiment_label, SentimentLabel::Positive); // "beat"/"growth"/"strong"
    }
}
