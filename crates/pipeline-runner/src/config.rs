use anyhow::Result;
use std::env;

use core_types::MarketRegime;
use orchestrator::{ClusterSettings, OrchestratorSettings};
use shadow_tracker::ShadowTrackerSettings;
use signal_generator::GeneratorSettings;
use signal_validator::ValidatorSettings;

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    env::var(key).ok().and_then(|v| v.parse().ok()).unwrap_or(default)
}

/// Everything under §6's configuration surface, loaded from the environment
/// with the spec's stated defaults. Mirrors the teacher's `AgentConfig::from_env`
/// shape: one struct, one fallible constructor, every key documented inline.
#[derive(Debug, Clone)]
pub struct PipelineConfig {
    // pipeline.*
    pub max_per_cycle: usize,
    pub analysis_batch_size: usize,
    pub poll_interval_seconds: u64,
    pub dedup_window_minutes: i64,

    // cluster.*
    pub cluster_time_window_minutes: i64,
    pub cluster_min_size: usize,
    pub cluster_max_age_hours: i64,

    // signal.*
    pub signal_base_position_size: f64,
    pub signal_max_position_size: f64,
    pub signal_min_confidence: f64,
    pub signal_sentiment_threshold: f64,
    pub signal_impact_threshold: f64,
    pub signal_enable_auto_execute: bool,

    // validator.*
    pub validator_daily_trade_limit: usize,
    pub validator_daily_loss_limit_pct: f64,
    pub validator_max_consecutive_losses: u32,
    pub validator_market_hours_only: bool,

    // shadow.*
    pub shadow_tracking_days: i64,
    pub shadow_max_age_days: i64,

    // Bootstrap allocation hand-off (§9 open question, resolved as a one-way latch).
    pub bootstrap_skip_allocation: bool,

    // Nominal `MarketContext` snapshot. Real portfolio bookkeeping is out of
    // scope (spec.md §1 non-goals); these give the demonstration loop a
    // context to validate proposals against.
    pub total_capital: f64,
    pub daily_volume_usd: f64,
    pub vix: f64,
    pub market_regime: MarketRegime,

    // shield report cadence
    pub shield_report_window_days: i64,
}

impl PipelineConfig {
    pub fn from_env() -> Result<Self> {
        let market_regime = match env::var("MARKET_REGIME").unwrap_or_default().as_str() {
            "risk_off" => MarketRegime::RiskOff,
            "risk_on" => MarketRegime::RiskOn,
            _ => MarketRegime::Neutral,
        };

        Ok(Self {
            max_per_cycle: env_or("PIPELINE_MAX_PER_CYCLE", 10),
            analysis_batch_size: env_or("PIPELINE_ANALYSIS_BATCH_SIZE", 5),
            poll_interval_seconds: env_or("PIPELINE_POLL_INTERVAL_SECONDS", 300),
            dedup_window_minutes: env_or("PIPELINE_DEDUP_WINDOW_MINUTES", 30),

            cluster_time_window_minutes: env_or("CLUSTER_TIME_WINDOW_MINUTES", 60),
            cluster_min_size: env_or("CLUSTER_MIN_SIZE", 2),
            cluster_max_age_hours: env_or("CLUSTER_MAX_AGE_HOURS", 48),

            signal_base_position_size: env_or("SIGNAL_BASE_POSITION_SIZE", 0.05),
            signal_max_position_size: env_or("SIGNAL_MAX_POSITION_SIZE", 0.10),
            signal_min_confidence: env_or("SIGNAL_MIN_CONFIDENCE", 0.60),
            signal_sentiment_threshold: env_or("SIGNAL_SENTIMENT_THRESHOLD", 0.30),
            signal_impact_threshold: env_or("SIGNAL_IMPACT_THRESHOLD", 0.50),
            signal_enable_auto_execute: env_or("SIGNAL_ENABLE_AUTO_EXECUTE", false),

            validator_daily_trade_limit: env_or("VALIDATOR_DAILY_TRADE_LIMIT", 20),
            validator_daily_loss_limit_pct: env_or("VALIDATOR_DAILY_LOSS_LIMIT_PCT", 5.0),
            validator_max_consecutive_losses: env_or("VALIDATOR_MAX_CONSECUTIVE_LOSSES", 5),
            validator_market_hours_only: env_or("VALIDATOR_MARKET_HOURS_ONLY", true),

            shadow_tracking_days: env_or("SHADOW_TRACKING_DAYS", 7),
            shadow_max_age_days: env_or("SHADOW_MAX_AGE_DAYS", 30),

            bootstrap_skip_allocation: env_or("BOOTSTRAP_SKIP_ALLOCATION", false),

            total_capital: env_or("MARKET_TOTAL_CAPITAL", 100_000.0),
            daily_volume_usd: env_or("MARKET_DAILY_VOLUME_USD", 10_000_000.0),
            vix: env_or("MARKET_VIX", 16.0),
            market_regime,

            shield_report_window_days: env_or("SHIELD_REPORT_WINDOW_DAYS", 7),
        })
    }

    pub fn orchestrator_settings(&self) -> OrchestratorSettings {
        OrchestratorSettings {
            max_per_cycle: self.max_per_cycle,
            analysis_concurrency: self.analysis_batch_size,
            dedup_window_minutes: self.dedup_window_minutes,
            bootstrap_skip_allocation: self.bootstrap_skip_allocation,
            cluster: ClusterSettings {
                time_window_minutes: self.cluster_time_window_minutes,
                min_size: self.cluster_min_size,
                max_age_hours: self.cluster_max_age_hours,
            },
            generator: GeneratorSettings {
                base_position_size: self.signal_base_position_size,
                max_position_size: self.signal_max_position_size,
                min_confidence_threshold: self.signal_min_confidence,
                sentiment_threshold: self.signal_sentiment_threshold,
                impact_threshold: self.signal_impact_threshold,
                enable_auto_execute: self.signal_enable_auto_execute,
            },
            validator: ValidatorSettings {
                min_confidence: self.signal_min_confidence,
                max_position_size: self.signal_max_position_size,
                daily_trade_limit: self.validator_daily_trade_limit,
                daily_loss_limit_pct: self.validator_daily_loss_limit_pct,
                max_consecutive_losses: self.validator_max_consecutive_losses,
                market_hours_only: self.validator_market_hours_only,
            },
            shadow: ShadowTrackerSettings {
                default_tracking_days: self.shadow_tracking_days,
                max_age_days: self.shadow_max_age_days,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_the_configuration_surface() {
        // Reading from a clean environment should reproduce every default in §6.
        for key in [
            "PIPELINE_MAX_PER_CYCLE",
            "PIPELINE_ANALYSIS_BATCH_SIZE",
            "PIPELINE_POLL_INTERVAL_SECONDS",
            "PIPELINE_DEDUP_WINDOW_MINUTES",
            "CLUSTER_TIME_WINDOW_MINUTES",
            "CLUSTER_MIN_SIZE",
            "CLUSTER_MAX_AGE_HOURS",
            "SIGNAL_BASE_POSITION_SIZE",
            "SIGNAL_MAX_POSITION_SIZE",
            "SIGNAL_MIN_CONFIDENCE",
            "VALIDATOR_DAILY_TRADE_LIMIT",
            "VALIDATOR_DAILY_LOSS_LIMIT_PCT",
            "SHADOW_TRACKING_DAYS",
            "SHADOW_MAX_AGE_DAYS",
        ] {
            env::remove_var(key);
        }

        let config = PipelineConfig::from_env().unwrap();
        assert_eq!(config.max_per_cycle, 10);
        assert_eq!(config.analysis_batch_size, 5);
        assert_eq!(config.poll_interval_seconds, 300);
        assert_eq!(config.dedup_window_minutes, 30);
        assert_eq!(config.cluster_time_window_minutes, 60);
        assert_eq!(config.cluster_min_size, 2);
        assert_eq!(config.cluster_max_age_hours, 48);
        assert!((config.signal_base_position_size - 0.05).abs() < 1e-9);
        assert!((config.signal_max_position_size - 0.10).abs() < 1e-9);
        assert_eq!(config.validator_daily_trade_limit, 20);
        assert_eq!(config.shadow_tracking_days, 7);
        assert_eq!(config.shadow_max_age_days, 30);
    }
}
