//! Constitution (component H).
//!
//! Three immutable rule blocks plus a pure `validate_proposal` gate sitting
//! between the Signal Validator and trade execution. Every violation is cited
//! by Korean "Article" identifier so a rejection is auditable, not just a
//! boolean. The rule source text is hashed at startup against a pinned
//! digest; a mismatch means the rules were tampered with and the process must
//! refuse to start.

pub mod allocation_rules;
pub mod risk_limits;
pub mod trading_constraints;

use core_types::{MarketContext, PipelineError, PipelineResult, Proposal};
use sha2::{Digest, Sha256};
use std::collections::HashMap;

pub const VERSION: &str = "1.0.0";
pub const ENACTED_DATE: &str = "2025-12-15";

/// Korean Article identifiers cited in `violated_articles`.
pub struct Articles;

impl Articles {
    pub const CAPITAL_PRESERVATION: &'static str = "제1조 (자본 보존 우선)";
    pub const EXPLAINABILITY: &'static str = "제2조 (설명 가능성)";
    pub const HUMAN_FINAL_AUTHORITY: &'static str = "제3조 (인간 최종 결정권)";
    pub const FORCED_INTERVENTION: &'static str = "제4조 (강제 개입)";
    pub const AMENDMENT: &'static str = "제5조 (헌법 개정)";

    pub fn summary(article: &str) -> &'static str {
        match article {
            a if a == Self::CAPITAL_PRESERVATION => {
                "자본 보존이 수익 추구보다 우선한다. 포지션 크기, 손실 한도, 배분 한도를 위반할 수 없다."
            }
            a if a == Self::EXPLAINABILITY => {
                "모든 거래는 설명 가능해야 한다. 근거 없는 제안은 기각된다."
            }
            a if a == Self::HUMAN_FINAL_AUTHORITY => {
                "모든 거래는 인간의 최종 승인을 요구한다. 자동 실행은 제안에 불과하다."
            }
            a if a == Self::FORCED_INTERVENTION => {
                "손실 한도, 낙폭, 또는 VIX 임계값 초과 시 시스템은 강제로 개입하여 신규 진입을 차단한다."
            }
            a if a == Self::AMENDMENT => {
                "헌법 개정은 별도 절차를 통해서만 가능하며 런타임 중 변경될 수 없다."
            }
            _ => "알 수 없는 조항",
        }
    }
}

/// Result of `validate_proposal`: validity, the violations found, and the
/// deduplicated set of cited Article identifiers.
#[derive(Debug, Clone)]
pub struct ConstitutionVerdict {
    pub is_valid: bool,
    pub violations: Vec<String>,
    pub cited_articles: Vec<String>,
}

pub struct Constitution {
    rule_source_digest: String,
}

impl Constitution {
    pub fn new() -> Self {
        Self { rule_source_digest: Self::compute_digest() }
    }

    /// SHA-256 over the textual source of the three rule blocks. Any edit to
    /// the constants in `risk_limits`, `allocation_rules`, or
    /// `trading_constraints` changes this digest.
    fn compute_digest() -> String {
        let source = format!(
            "{:?}|{:?}|{:?}",
            (
                risk_limits::MAX_DAILY_LOSS,
                risk_limits::MAX_DRAWDOWN,
                risk_limits::DAILY_LOSS_CIRCUIT_BREAKER,
                risk_limits::MAX_POSITION_SIZE,
                risk_limits::MIN_POSITION_SIZE_USD,
                risk_limits::MAX_SECTOR_EXPOSURE,
                risk_limits::MAX_PORTFOLIO_VOLATILITY,
                risk_limits::VIX_CAUTION_THRESHOLD,
                risk_limits::VIX_DANGER_THRESHOLD,
                risk_limits::MAX_LEVERAGE,
                risk_limits::ALLOW_OPTIONS,
                risk_limits::ALLOW_SHORT_SELLING,
                risk_limits::ALLOW_MARGIN_TRADING,
            ),
            (
                allocation_rules::MIN_CASH_RESERVE,
                allocation_rules::MAX_STOCK_ALLOCATION,
                allocation_rules::TARGET_CASH_RESERVE,
                allocation_rules::REBALANCE_THRESHOLD,
            ),
            (
                trading_constraints::MAX_DAILY_TRADES,
                trading_constraints::MAX_WEEKLY_TRADES,
                trading_constraints::MIN_HOLD_PERIOD_HOURS,
                trading_constraints::MIN_ORDER_SIZE_USD,
                trading_constraints::MAX_ORDER_SIZE_USD,
                trading_constraints::MAX_ORDER_PERCENTAGE,
                trading_constraints::MIN_DAILY_VOLUME_USD,
                trading_constraints::MAX_VOLUME_PARTICIPATION,
                trading_constraints::ALLOW_PREMARKET_TRADING,
                trading_constraints::ALLOW_AFTERHOURS_TRADING,
                trading_constraints::ALLOW_SHORT_SELLING,
                trading_constraints::ALLOW_LEVERAGE,
            ),
        );
        let digest = Sha256::digest(source.as_bytes());
        hex::encode(digest)
    }

    /// Compares the live digest against a pinned one supplied by the deployment.
    /// Mismatch is `IntegrityFailure`; callers must treat this as fatal and
    /// refuse to start.
    pub fn verify_integrity(&self, pinned_digest: &str) -> PipelineResult<()> {
        if self.rule_source_digest != pinned_digest {
            return Err(PipelineError::IntegrityFailure(format!(
                "constitution rule digest mismatch: expected {pinned_digest}, computed {}",
                self.rule_source_digest
            )));
        }
        Ok(())
    }

    pub fn rule_source_digest(&self) -> &str {
        &self.rule_source_digest
    }

    /// 5-step validation. `skip_allocation_rules` bypasses step 2 for
    /// bootstrap portfolios (see the BOOTSTRAP decision in DESIGN.md: once the
    /// exit conditions fire, the caller must stop passing `true` for the rest
    /// of the portfolio's life — this function itself does not latch state).
    pub fn validate_proposal(
        &self,
        proposal: &Proposal,
        context: &MarketContext,
        skip_allocation_rules: bool,
    ) -> ConstitutionVerdict {
        let mut violations = Vec::new();
        let mut cited: Vec<String> = Vec::new();
        let mut cite = |article: &str, violation: String| {
            violations.push(violation);
            if !cited.iter().any(|a| a == article) {
                cited.push(article.to_string());
            }
        };

        // 1. position size vs total capital
        if let Some(v) = risk_limits::validate_position_size(proposal.position_value, context.total_capital) {
            cite(Articles::CAPITAL_PRESERVATION, v);
        }

        // 2. allocation bounds, unless bootstrap exempts this cycle
        if !skip_allocation_rules {
            let (stock_pct, cash_pct) = current_allocation_fractions(&context.current_allocation);
            for v in allocation_rules::validate_allocation(stock_pct, cash_pct, context.market_regime) {
                cite(Articles::CAPITAL_PRESERVATION, v);
            }
        }

        // 3. trade frequency
        for v in trading_constraints::validate_trade_frequency(context.daily_trades, context.weekly_trades) {
            cite(Articles::FORCED_INTERVENTION, v);
        }

        // 4. order size: absolute cap, capital %, volume participation, min liquidity
        for v in trading_constraints::validate_order_size(
            proposal.order_value,
            context.total_capital,
            context.daily_volume_usd,
        ) {
            cite(Articles::CAPITAL_PRESERVATION, v);
        }

        // 5. human approval
        if trading_constraints::REQUIRE_HUMAN_APPROVAL && !proposal.is_approved {
            cite(
                Articles::HUMAN_FINAL_AUTHORITY,
                "인간 승인 누락: 제안이 승인되지 않음".to_string(),
            );
        }

        ConstitutionVerdict { is_valid: violations.is_empty(), violations, cited_articles: cited }
    }

    /// Circuit-breaker trigger: daily loss, drawdown, or VIX past danger.
    /// A trigger forbids new entries for 24h at the caller's discretion; this
    /// function only reports whether the condition holds.
    pub fn validate_circuit_breaker_trigger(&self, daily_loss_pct: f64, total_drawdown_pct: f64, vix: f64) -> bool {
        daily_loss_pct.abs() >= risk_limits::DAILY_LOSS_CIRCUIT_BREAKER
            || total_drawdown_pct.abs() >= risk_limits::MAX_DRAWDOWN
            || vix >= risk_limits::VIX_DANGER_THRESHOLD
    }

    pub fn get_constitution_summary(&self) -> String {
        format!(
            "헌법 v{VERSION} (제정 {ENACTED_DATE})\n\
             리스크 한도: 일 손실 {:.0}%, 최대 낙폭 {:.0}%, 포지션당 {:.0}%\n\
             배분 규칙: 최소 현금 {:.0}%, 최대 주식 {:.0}%\n\
             거래 제약: 일 {}회, 주 {}회, 주문 ${:.0}-${:.0}\n\
             무결성 다이제스트: {}",
            risk_limits::MAX_DAILY_LOSS * 100.0,
            risk_limits::MAX_DRAWDOWN * 100.0,
            risk_limits::MAX_POSITION_SIZE * 100.0,
            allocation_rules::MIN_CASH_RESERVE * 100.0,
            allocation_rules::MAX_STOCK_ALLOCATION * 100.0,
            trading_constraints::MAX_DAILY_TRADES,
            trading_constraints::MAX_WEEKLY_TRADES,
            trading_constraints::MIN_ORDER_SIZE_USD,
            trading_constraints::MAX_ORDER_SIZE_USD,
            self.rule_source_digest,
        )
    }

    pub fn get_violated_articles_summary(&self, cited_articles: &[String]) -> String {
        cited_articles
            .iter()
            .map(|a| format!("{a}: {}", Articles::summary(a)))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Default for Constitution {
    fn default() -> Self {
        Self::new()
    }
}

fn current_allocation_fractions(allocation: &HashMap<String, f64>) -> (f64, f64) {
    let cash = allocation.get("cash").copied().unwrap_or(0.0);
    let stock: f64 = allocation.iter().filter(|(k, _)| k.as_str() != "cash").map(|(_, v)| v).sum();
    (stock, cash)
}
