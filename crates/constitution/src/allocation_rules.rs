//! Allocation Rules (rule block 2). Per-regime stock/cash bounds.

use core_types::MarketRegime;

pub const MIN_CASH_RESERVE: f64 = 0.10;
pub const MAX_STOCK_ALLOCATION: f64 = 0.90;
pub const TARGET_CASH_RESERVE: f64 = 0.15;
pub const REBALANCE_THRESHOLD: f64 = 0.05;

pub struct RegimeBounds {
    pub stock_min: f64,
    pub stock_max: f64,
    pub cash_min: f64,
}

pub fn regime_bounds(regime: MarketRegime) -> RegimeBounds {
    match regime {
        MarketRegime::RiskOn => RegimeBounds { stock_min: 0.70, stock_max: 0.90, cash_min: 0.10 },
        MarketRegime::Neutral => RegimeBounds { stock_min: 0.40, stock_max: 0.60, cash_min: 0.40 },
        MarketRegime::RiskOff => RegimeBounds { stock_min: 0.10, stock_max: 0.30, cash_min: 0.70 },
    }
}

/// Base cash/stock bounds plus the active regime's stock_min/stock_max window.
pub fn validate_allocation(stock_pct: f64, cash_pct: f64, regime: MarketRegime) -> Vec<String> {
    let mut violations = Vec::new();
    if cash_pct < MIN_CASH_RESERVE {
        violations.push(format!(
            "현금 보유 부족: {:.2}% < {:.2}%",
            cash_pct * 100.0,
            MIN_CASH_RESERVE * 100.0
        ));
    }
    if stock_pct > MAX_STOCK_ALLOCATION {
        violations.push(format!(
            "주식 배분 초과: {:.2}% > {:.2}%",
            stock_pct * 100.0,
            MAX_STOCK_ALLOCATION * 100.0
        ));
    }
    let bounds = regime_bounds(regime);
    if stock_pct < bounds.stock_min || stock_pct > bounds.stock_max {
        violations.push(format!(
            "배분이 {regime:?} 체제 범위를 벗어남: {:.2}% (허용 {:.2}%-{:.2}%)",
            stock_pct * 100.0,
            bounds.stock_min * 100.0,
            bounds.stock_max * 100.0
        ));
    }
    violations
}

/// Per-asset drift beyond `REBALANCE_THRESHOLD` against a target allocation.
pub fn needs_rebalancing(current: &[(String, f64)], target: &[(String, f64)]) -> bool {
    target.iter().any(|(asset, target_pct)| {
        current
            .iter()
            .find(|(a, _)| a == asset)
            .map(|(_, current_pct)| (current_pct - target_pct).abs() > REBALANCE_THRESHOLD)
            .unwrap_or(true)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn risk_on_allocation_within_bounds_passes() {
        assert!(validate_allocation(0.75, 0.25, MarketRegime::RiskOn).is_empty());
    }

    #[test]
    fn neutral_allocation_outside_regime_bounds_is_flagged() {
        let violations = validate_allocation(0.75, 0.25, MarketRegime::Neutral);
        assert!(!violations.is_empty());
    }

    #[test]
    fn rebalancing_triggers_past_threshold() {
        let current = vec![("stocks".to_string(), 0.80)];
        let target = vec![("stocks".to_string(), 0.70)];
        assert!(needs_rebalancing(&current, &target));
    }
}
