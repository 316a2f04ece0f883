//! Trading Constraints (rule block 3). Order-size, frequency, and timing limits.

pub const MAX_DAILY_TRADES: i64 = 5;
pub const MAX_WEEKLY_TRADES: i64 = 15;
pub const MIN_HOLD_PERIOD_HOURS: i64 = 24;
pub const COOLDOWN_PERIOD_HOURS: i64 = 4;
pub const MAX_ORDER_SIZE_USD: f64 = 50_000.0;
pub const MIN_ORDER_SIZE_USD: f64 = 1_000.0;
pub const MAX_ORDER_PERCENTAGE: f64 = 0.10;
pub const MIN_DAILY_VOLUME_USD: f64 = 1_000_000.0;
pub const MAX_VOLUME_PARTICIPATION: f64 = 0.05;
pub const REQUIRE_HUMAN_APPROVAL: bool = true;
pub const ALLOW_PREMARKET_TRADING: bool = false;
pub const ALLOW_AFTERHOURS_TRADING: bool = false;
pub const ALLOW_SHORT_SELLING: bool = false;
pub const ALLOW_LEVERAGE: bool = false;
pub const ALLOW_OPTIONS: bool = false;
pub const ALLOW_FUTURES: bool = false;
/// The absolute `MAX_ORDER_SIZE_USD` cap only binds below this capital level;
/// larger portfolios are governed solely by the percentage/volume checks.
pub const ABSOLUTE_CAP_CAPITAL_THRESHOLD: f64 = 100_000.0;

pub fn validate_trade_frequency(daily_trades: i64, weekly_trades: i64) -> Vec<String> {
    let mut violations = Vec::new();
    if daily_trades >= MAX_DAILY_TRADES {
        violations.push(format!("일일 거래 횟수 초과: {daily_trades} >= {MAX_DAILY_TRADES}"));
    }
    if weekly_trades >= MAX_WEEKLY_TRADES {
        violations.push(format!("주간 거래 횟수 초과: {weekly_trades} >= {MAX_WEEKLY_TRADES}"));
    }
    violations
}

/// Absolute cap (only below `ABSOLUTE_CAP_CAPITAL_THRESHOLD`), minimum size,
/// capital-percentage cap, minimum liquidity, and volume-participation cap.
pub fn validate_order_size(order_value_usd: f64, total_capital_usd: f64, daily_volume_usd: f64) -> Vec<String> {
    let mut violations = Vec::new();

    if total_capital_usd < ABSOLUTE_CAP_CAPITAL_THRESHOLD && order_value_usd > MAX_ORDER_SIZE_USD {
        violations.push(format!(
            "주문 크기 초과: ${order_value_usd:.0} > ${MAX_ORDER_SIZE_USD:.0}"
        ));
    }
    if order_value_usd < MIN_ORDER_SIZE_USD {
        violations.push(format!(
            "주문 크기 미달: ${order_value_usd:.0} < ${MIN_ORDER_SIZE_USD:.0}"
        ));
    }
    if total_capital_usd > 0.0 {
        let pct = order_value_usd / total_capital_usd;
        if pct > MAX_ORDER_PERCENTAGE {
            violations.push(format!(
                "주문이 자본 대비 초과: {:.2}% > {:.2}%",
                pct * 100.0,
                MAX_ORDER_PERCENTAGE * 100.0
            ));
        }
    }
    if daily_volume_usd < MIN_DAILY_VOLUME_USD {
        violations.push(format!(
            "일일 거래량 부족: ${daily_volume_usd:.0} < ${MIN_DAILY_VOLUME_USD:.0}"
        ));
    } else {
        let participation = order_value_usd / daily_volume_usd;
        if participation > MAX_VOLUME_PARTICIPATION {
            violations.push(format!(
                "거래량 참여율 초과: {:.2}% > {:.2}%",
                participation * 100.0,
                MAX_VOLUME_PARTICIPATION * 100.0
            ));
        }
    }
    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn order_within_all_limits_passes() {
        assert!(validate_order_size(5_000.0, 100_000.0, 5_000_000.0).is_empty());
    }

    #[test]
    fn absolute_cap_only_binds_for_small_portfolios() {
        // $60k order against $2M capital: 3% of capital, fine on pct/volume, and
        // the absolute cap does not apply above the threshold.
        assert!(validate_order_size(60_000.0, 2_000_000.0, 5_000_000.0).is_empty());
    }

    #[test]
    fn absolute_cap_binds_for_small_portfolio() {
        let violations = validate_order_size(60_000.0, 50_000.0, 5_000_000.0);
        assert!(violations.iter().any(|v| v.contains("주문 크기 초과")));
    }

    #[test]
    fn frequency_limit_uses_greater_or_equal() {
        assert!(validate_trade_frequency(4, 10).is_empty());
        assert!(!validate_trade_frequency(5, 10).is_empty());
    }
}
