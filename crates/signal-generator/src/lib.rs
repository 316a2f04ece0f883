//! Signal Generator (component F).
//!
//! Turns one Analysis record into an actionable `TradingSignal`, or nothing.
//! Pure aside from a running statistics counter the operator can inspect.

use chrono::Utc;
use core_types::{
    Analysis, ExecutionType, RiskCategory, SentimentLabel, SignalAction, TradingSignal, Urgency,
};
use log::debug;

#[derive(Debug, Clone, Copy)]
pub struct GeneratorSettings {
    pub base_position_size: f64,
    pub max_position_size: f64,
    pub min_confidence_threshold: f64,
    pub sentiment_threshold: f64,
    pub impact_threshold: f64,
    pub enable_auto_execute: bool,
}

impl Default for GeneratorSettings {
    fn default() -> Self {
        Self {
            base_position_size: 0.05,
            max_position_size: 0.10,
            min_confidence_threshold: 0.60,
            sentiment_threshold: 0.30,
            impact_threshold: 0.50,
            enable_auto_execute: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct GeneratorStats {
    pub generated: u64,
    pub filtered_not_actionable: u64,
    pub filtered_low_impact: u64,
    pub filtered_hold: u64,
    pub filtered_no_ticker: u64,
    pub filtered_low_confidence: u64,
}

pub struct SignalGenerator {
    settings: GeneratorSettings,
    stats: GeneratorStats,
}

impl SignalGenerator {
    pub fn new(settings: GeneratorSettings) -> Self {
        Self { settings, stats: GeneratorStats::default() }
    }

    pub fn with_defaults() -> Self {
        Self::new(GeneratorSettings::default())
    }

    pub fn statistics(&self) -> GeneratorStats {
        self.stats
    }

    pub fn reset_statistics(&mut self) {
        self.stats = GeneratorStats::default();
    }

    pub fn update_settings(&mut self, settings: GeneratorSettings) {
        self.settings = settings;
    }

    pub fn generate_signal(&mut self, analysis: &Analysis) -> Option<TradingSignal> {
        if !analysis.trading_actionable {
            self.stats.filtered_not_actionable += 1;
            return None;
        }
        if analysis.impact_magnitude < self.settings.impact_threshold {
            self.stats.filtered_low_impact += 1;
            return None;
        }

        let action = determine_action(
            analysis.sentiment_label,
            analysis.sentiment_score,
            self.settings.sentiment_threshold,
        );
        if action == SignalAction::Hold {
            self.stats.filtered_hold += 1;
            return None;
        }

        let Some(ticker) = primary_ticker(analysis) else {
            self.stats.filtered_no_ticker += 1;
            return None;
        };

        let position_size = position_size(
            self.settings.base_position_size,
            self.settings.max_position_size,
            analysis.impact_magnitude,
            analysis.risk_category,
            analysis.urgency,
        );

        let confidence = confidence(
            analysis.confidence,
            analysis.impact_magnitude,
            analysis.risk_category,
            analysis.urgency,
        );
        if confidence < self.settings.min_confidence_threshold {
            self.stats.filtered_low_confidence += 1;
            return None;
        }

        let execution_type = match analysis.urgency {
            Urgency::Immediate | Urgency::High => ExecutionType::Market,
            Urgency::Medium | Urgency::Low => ExecutionType::Limit,
        };

        let reason = build_reason(analysis, action);
        let auto_execute = self.settings.enable_auto_execute && confidence >= 0.85;

        self.stats.generated += 1;
        debug!("generated {:?} signal for {ticker} at confidence {confidence:.3}", action);

        Some(TradingSignal {
            ticker,
            action,
            position_size,
            confidence,
            execution_type,
            reason,
            urgency: analysis.urgency,
            created_at: Utc::now(),
            source_article_id: Some(analysis.article_id.clone()),
            affected_sectors: Vec::new(),
            auto_execute,
        })
    }
}

fn determine_action(label: SentimentLabel, score: f64, threshold: f64) -> SignalAction {
    match label {
        SentimentLabel::Negative => {
            if score <= -threshold {
                SignalAction::Sell
            } else {
                SignalAction::Hold
            }
        }
        SentimentLabel::Positive => {
            if score >= threshold {
                SignalAction::Buy
            } else {
                SignalAction::Hold
            }
        }
        SentimentLabel::Neutral => {
            if score <= -threshold {
                SignalAction::Sell
            } else if score >= threshold {
                SignalAction::Buy
            } else {
                SignalAction::Hold
            }
        }
    }
}

fn primary_ticker(analysis: &Analysis) -> Option<String> {
    analysis
        .related_tickers
        .iter()
        .max_by(|a, b| a.relevance.partial_cmp(&b.relevance).unwrap())
        .filter(|t| t.relevance >= 70.0)
        .map(|t| t.ticker.clone())
}

fn risk_multiplier(risk: RiskCategory) -> f64 {
    match risk {
        RiskCategory::Low => 1.0,
        RiskCategory::Medium => 0.75,
        RiskCategory::High => 0.5,
        RiskCategory::Critical => 0.25,
    }
}

fn risk_inverse(risk: RiskCategory) -> f64 {
    match risk {
        RiskCategory::Low => 1.0,
        RiskCategory::Medium => 0.7,
        RiskCategory::High => 0.4,
        RiskCategory::Critical => 0.2,
    }
}

fn urgency_score(urgency: Urgency) -> f64 {
    match urgency {
        Urgency::Immediate => 0.9,
        Urgency::High => 0.8,
        Urgency::Medium => 0.6,
        Urgency::Low => 0.4,
    }
}

fn position_size(base: f64, max: f64, impact: f64, risk: RiskCategory, urgency: Urgency) -> f64 {
    let mut size = base * (0.5 + impact) * risk_multiplier(risk);
    if urgency == Urgency::Immediate {
        size *= 0.8;
    }
    (size.min(max) * 1000.0).round() / 1000.0
}

fn confidence(sentiment_confidence: f64, impact: f64, risk: RiskCategory, urgency: Urgency) -> f64 {
    let raw = 0.4 * sentiment_confidence
        + 0.3 * impact
        + 0.2 * risk_inverse(risk)
        + 0.1 * urgency_score(urgency);
    (raw * 1000.0).round() / 1000.0
}

fn build_reason(analysis: &Analysis, action: SignalAction) -> String {
    let verb = match action {
        SignalAction::Buy => "Bullish",
        SignalAction::Sell => "Bearish",
        SignalAction::Hold => "Neutral",
    };
    let mut reason = format!(
        "{verb} signal: sentiment {:?} ({:.2}), impact {:.2}, urgency {:?}, risk {:?}",
        analysis.sentiment_label,
        analysis.sentiment_score,
        analysis.impact_magnitude,
        analysis.urgency,
        analysis.risk_category,
    );
    reason.truncate(500);
    reason
}

#[cfg(test)]
mod tests {
    use super::*;
    use core_types::RelatedTicker;

    fn base_analysis() -> Analysis {
        Analysis {
            article_id: "a1".to_string(),
            sentiment_label: SentimentLabel::Positive,
            sentiment_score: 0.8,
            confidence: 0.9,
            urgency: Urgency::High,
            impact_magnitude: 0.8,
            risk_category: RiskCategory::Low,
            trading_actionable: true,
            related_tickers: vec![RelatedTicker { ticker: "AAPL".to_string(), relevance: 90.0, sentiment: 0.8 }],
        }
    }

    #[test]
    fn strong_positive_produces_buy_with_expected_size_and_confidence() {
        let mut gen = SignalGenerator::with_defaults();
        let signal = gen.generate_signal(&base_analysis()).expect("signal expected");
        assert_eq!(signal.action, SignalAction::Buy);
        assert_eq!(signal.ticker, "AAPL");
        assert!((signal.position_size - 0.065).abs() < 1e-9, "size={}", signal.position_size);
        assert!((signal.confidence - 0.88).abs() < 1e-9, "confidence={}", signal.confidence);
        assert_eq!(signal.execution_type, ExecutionType::Market);
    }

    #[test]
    fn not_actionable_yields_no_signal() {
        let mut gen = SignalGenerator::with_defaults();
        let mut analysis = base_analysis();
        analysis.trading_actionable = false;
        assert!(gen.generate_signal(&analysis).is_none());
        assert_eq!(gen.statistics().filtered_not_actionable, 1);
    }

    #[test]
    fn low_relevance_ticker_is_rejected() {
        let mut gen = SignalGenerator::with_defaults();
        let mut analysis = base_analysis();
        analysis.related_tickers = vec![RelatedTicker { ticker: "AAPL".to_string(), relevance: 50.0, sentiment: 0.8 }];
        assert!(gen.generate_signal(&analysis).is_none());
        assert_eq!(gen.statistics().filtered_no_ticker, 1);
    }

    #[test]
    fn position_size_clamps_to_max() {
        let size = position_size(0.05, 0.10, 1.0, RiskCategory::Low, Urgency::Low);
        assert!(size <= 0.10);
    }

    #[test]
    fn neutral_sentiment_with_extreme_score_trades() {
        assert_eq!(determine_action(SentimentLabel::Neutral, 0.5, 0.3), SignalAction::Buy);
        assert_eq!(determine_action(SentimentLabel::Neutral, -0.5, 0.3), SignalAction::Sell);
        assert_eq!(determine_action(SentimentLabel::Neutral, 0.1, 0.3), SignalAction::Hold);
    }
}
