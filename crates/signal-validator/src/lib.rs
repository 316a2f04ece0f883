//! Signal Validator (component G).
//!
//! A stateful gate pipeline sitting between the Signal Generator and the
//! Constitution: confidence/size sanity checks, a daily trade-count budget, a
//! cumulative daily-loss kill switch, and a market-hours check. All mutable state
//! (daily counters, kill switch) is owned by one `SignalValidator` instance; the
//! orchestrator serializes calls against it.

use chrono::{DateTime, Datelike, Duration, Timelike, Utc, Weekday};
use core_types::TradingSignal;

#[derive(Debug, Clone, Copy)]
pub struct ValidatorSettings {
    /// Reuses the Signal Generator's `min_confidence_threshold`; the configuration
    /// surface has no independent `validator.min_confidence` key.
    pub min_confidence: f64,
    pub max_position_size: f64,
    pub daily_trade_limit: usize,
    pub daily_loss_limit_pct: f64,
    pub max_consecutive_losses: u32,
    pub market_hours_only: bool,
}

impl Default for ValidatorSettings {
    fn default() -> Self {
        Self {
            min_confidence: 0.60,
            max_position_size: 0.10,
            daily_trade_limit: 20,
            daily_loss_limit_pct: 5.0,
            max_consecutive_losses: 5,
            market_hours_only: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ValidationOutcome {
    Approved { recommendation: String },
    Rejected { reason: String },
}

impl ValidationOutcome {
    pub fn is_approved(&self) -> bool {
        matches!(self, ValidationOutcome::Approved { .. })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatorStatus {
    pub kill_switch_active: bool,
    pub kill_switch_reason: Option<String>,
    pub daily_trade_count: usize,
    pub daily_pnl: f64,
    pub consecutive_losses: u32,
    pub market_open: bool,
}

pub struct SignalValidator {
    settings: ValidatorSettings,
    trade_timestamps: Vec<DateTime<Utc>>,
    daily_pnl: f64,
    consecutive_losses: u32,
    kill_switch: bool,
    kill_switch_reason: Option<String>,
}

impl SignalValidator {
    pub fn new(settings: ValidatorSettings) -> Self {
        Self {
            settings,
            trade_timestamps: Vec::new(),
            daily_pnl: 0.0,
            consecutive_losses: 0,
            kill_switch: false,
            kill_switch_reason: None,
        }
    }

    pub fn with_defaults() -> Self {
        Self::new(ValidatorSettings::default())
    }

    /// Gates applied in fixed order; first rejection wins. Rejections never
    /// mutate state; only an approval records a trade timestamp.
    pub fn validate_signal(
        &mut self,
        signal: &TradingSignal,
        current_portfolio_value: f64,
        now: DateTime<Utc>,
    ) -> ValidationOutcome {
        if self.kill_switch {
            return reject("Kill switch active");
        }
        if signal.confidence < self.settings.min_confidence {
            return reject(format!(
                "confidence {:.3} below minimum {:.3}",
                signal.confidence, self.settings.min_confidence
            ));
        }
        if signal.position_size > self.settings.max_position_size {
            return reject(format!(
                "position size {:.3} exceeds maximum {:.3}",
                signal.position_size, self.settings.max_position_size
            ));
        }

        self.expire_old_trades(now);
        if self.trade_timestamps.len() >= self.settings.daily_trade_limit {
            return reject(format!(
                "daily trade limit {} reached",
                self.settings.daily_trade_limit
            ));
        }

        if self.daily_pnl <= -self.settings.daily_loss_limit_pct {
            self.activate_kill_switch("daily loss limit breached");
            return reject("daily loss limit breached, kill switch activated");
        }

        if self.consecutive_losses >= self.settings.max_consecutive_losses {
            return reject(format!(
                "{} consecutive losses reached",
                self.settings.max_consecutive_losses
            ));
        }

        let market_open = is_market_open(now);
        if self.settings.market_hours_only && !market_open {
            return reject("outside market hours");
        }

        let position_value = signal.position_size * current_portfolio_value;
        if position_value > current_portfolio_value * self.settings.max_position_size {
            return reject("computed position value exceeds portfolio position limit");
        }

        self.trade_timestamps.push(now);
        tracing::info!(ticker = %signal.ticker, confidence = signal.confidence, "signal approved");
        ValidationOutcome::Approved {
            recommendation: format!("approved {:?} {} at {:.3} confidence", signal.action, signal.ticker, signal.confidence),
        }
    }

    fn expire_old_trades(&mut self, now: DateTime<Utc>) {
        let cutoff = now - Duration::hours(24);
        self.trade_timestamps.retain(|ts| *ts >= cutoff);
    }

    /// Updates `daily_pnl`, resets `consecutive_losses` on a non-negative result
    /// or increments it on a loss, and may trigger the kill switch.
    pub fn record_trade_result(&mut self, pnl_pct: f64) {
        self.daily_pnl += pnl_pct;
        if pnl_pct >= 0.0 {
            self.consecutive_losses = 0;
        } else {
            self.consecutive_losses += 1;
        }
        if self.daily_pnl <= -self.settings.daily_loss_limit_pct {
            self.activate_kill_switch("daily loss limit breached");
        }
    }

    fn activate_kill_switch(&mut self, reason: &str) {
        if !self.kill_switch {
            tracing::error!(reason, "kill switch activated");
        }
        self.kill_switch = true;
        self.kill_switch_reason = Some(reason.to_string());
    }

    pub fn reset_kill_switch(&mut self) {
        self.kill_switch = false;
        self.kill_switch_reason = None;
        self.consecutive_losses = 0;
    }

    pub fn reset_daily_stats(&mut self) {
        self.daily_pnl = 0.0;
        self.trade_timestamps.clear();
    }

    pub fn update_settings(&mut self, settings: ValidatorSettings) {
        self.settings = settings;
    }

    pub fn status(&self, now: DateTime<Utc>) -> ValidatorStatus {
        ValidatorStatus {
            kill_switch_active: self.kill_switch,
            kill_switch_reason: self.kill_switch_reason.clone(),
            daily_trade_count: self.trade_timestamps.len(),
            daily_pnl: self.daily_pnl,
            consecutive_losses: self.consecutive_losses,
            market_open: is_market_open(now),
        }
    }
}

fn reject(reason: impl Into<String>) -> ValidationOutcome {
    ValidationOutcome::Rejected { reason: reason.into() }
}

/// 09:30-16:00, Monday-Friday, simplified (no timezone handling beyond whatever
/// timezone `now` is already expressed in).
fn is_market_open(now: DateTime<Utc>) -> bool {
    if matches!(now.weekday(), Weekday::Sat | Weekday::Sun) {
        return false;
    }
    let minutes_since_midnight = now.hour() * 60 + now.minute();
    (9 * 60 + 30..16 * 60).contains(&minutes_since_midnight)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use core_types::{ExecutionType, SignalAction, Urgency};

    fn signal(confidence: f64, position_size: f64) -> TradingSignal {
        TradingSignal {
            ticker: "AAPL".to_string(),
            action: SignalAction::Buy,
            position_size,
            confidence,
            execution_type: ExecutionType::Market,
            reason: "test".to_string(),
            urgency: Urgency::Medium,
            created_at: Utc::now(),
            source_article_id: None,
            affected_sectors: Vec::new(),
            auto_execute: false,
        }
    }

    fn market_hours_monday() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 2, 15, 0, 0).unwrap() // a Monday
    }

    #[test]
    fn kill_switch_activates_after_cumulative_loss() {
        let mut validator = SignalValidator::with_defaults();
        validator.record_trade_result(-3.0);
        validator.record_trade_result(-2.5);
        let now = market_hours_monday();
        let outcome = validator.validate_signal(&signal(0.9, 0.05), 100_000.0, now);
        assert_eq!(outcome, ValidationOutcome::Rejected { reason: "Kill switch active".to_string() });
    }

    #[test]
    fn rejection_does_not_mutate_counters() {
        let mut validator = SignalValidator::with_defaults();
        let now = market_hours_monday();
        let before = validator.status(now).daily_trade_count;
        validator.validate_signal(&signal(0.1, 0.05), 100_000.0, now); // confidence too low
        let after = validator.status(now).daily_trade_count;
        assert_eq!(before, after);
    }

    #[test]
    fn approval_records_a_trade_and_respects_the_daily_limit() {
        let mut settings = ValidatorSettings::default();
        settings.daily_trade_limit = 1;
        let mut validator = SignalValidator::new(settings);
        let now = market_hours_monday();
        let first = validator.validate_signal(&signal(0.9, 0.05), 100_000.0, now);
        assert!(first.is_approved());
        let second = validator.validate_signal(&signal(0.9, 0.05), 100_000.0, now);
        assert!(!second.is_approved());
    }

    #[test]
    fn outside_market_hours_is_rejected_when_required() {
        let mut validator = SignalValidator::with_defaults();
        let weekend = Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).unwrap(); // a Sunday
        let outcome = validator.validate_signal(&signal(0.9, 0.05), 100_000.0, weekend);
        assert!(!outcome.is_approved());
    }

    #[test]
    fn daily_pnl_accumulates_exactly() {
        let mut validator = SignalValidator::with_defaults();
        validator.record_trade_result(1.2);
        validator.record_trade_result(-0.5);
        assert!((validator.status(market_hours_monday()).daily_pnl - 0.7).abs() < 1e-9);
    }
}
