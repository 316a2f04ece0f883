//! Risk Limits (rule block 1). Immutable constants plus pure validators; no
//! mutable state lives here.

pub const MAX_DAILY_LOSS: f64 = 0.05;
pub const MAX_DRAWDOWN: f64 = 0.10;
pub const MAX_CONSECUTIVE_LOSSES: u32 = 3;
pub const DAILY_LOSS_CIRCUIT_BREAKER: f64 = 0.03;
pub const MAX_POSITION_SIZE: f64 = 0.20;
pub const MAX_SECTOR_EXPOSURE: f64 = 0.40;
pub const MAX_TOTAL_POSITIONS: u32 = 10;
pub const MIN_POSITION_SIZE_USD: f64 = 1_000.0;
pub const VIX_CAUTION_THRESHOLD: f64 = 20.0;
pub const VIX_DANGER_THRESHOLD: f64 = 25.0;
pub const MAX_PORTFOLIO_VOLATILITY: f64 = 0.30;
pub const MAX_LEVERAGE: f64 = 1.0;
pub const ALLOW_OPTIONS: bool = false;
pub const ALLOW_SHORT_SELLING: bool = false;
pub const ALLOW_MARGIN_TRADING: bool = false;
pub const MAX_CORRELATION_THRESHOLD: f64 = 0.70;
pub const DIVERSIFICATION_MIN_STOCKS: u32 = 3;

/// Single-position sizing check against total capital.
pub fn validate_position_size(position_value: f64, total_capital: f64) -> Option<String> {
    if total_capital <= 0.0 {
        return None;
    }
    let pct = position_value / total_capital;
    if pct > MAX_POSITION_SIZE {
        return Some(format!(
            "포지션 크기 초과: {:.2}% > {:.2}%",
            pct * 100.0,
            MAX_POSITION_SIZE * 100.0
        ));
    }
    if position_value < MIN_POSITION_SIZE_USD {
        return Some(format!(
            "포지션 크기 미달: ${:.0} < ${:.0}",
            position_value, MIN_POSITION_SIZE_USD
        ));
    }
    None
}

/// Daily loss and drawdown checks against capital-preservation limits.
pub fn validate_loss(daily_loss_pct: f64, total_drawdown_pct: f64) -> Vec<String> {
    let mut violations = Vec::new();
    if daily_loss_pct.abs() > MAX_DAILY_LOSS {
        violations.push(format!(
            "일 손실 한도 초과: {:.2}% > {:.2}%",
            daily_loss_pct.abs() * 100.0,
            MAX_DAILY_LOSS * 100.0
        ));
    }
    if total_drawdown_pct.abs() > MAX_DRAWDOWN {
        violations.push(format!(
            "최대 낙폭 초과: {:.2}% > {:.2}%",
            total_drawdown_pct.abs() * 100.0,
            MAX_DRAWDOWN * 100.0
        ));
    }
    violations
}
