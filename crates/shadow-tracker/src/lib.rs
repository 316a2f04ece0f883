//! Shadow Tracker (component I).
//!
//! When a Proposal is rejected — by the Signal Validator, the Constitution, or
//! a human — it is worth knowing whether the rejection was right. The Shadow
//! Tracker opens a hypothetical position at the rejected price and follows it
//! with fresh market data over a `tracking_days` window, so a defensive
//! rejection that avoided a loss is measurable rather than just asserted.

use chrono::{DateTime, Duration, Utc};
use core_types::{ShadowStatus, ShadowTrade, ShieldHighlight, ShieldReport, SignalAction};

#[derive(Debug, Clone, Copy)]
pub struct ShadowTrackerSettings {
    pub default_tracking_days: i64,
    pub max_age_days: i64,
}

impl Default for ShadowTrackerSettings {
    fn default() -> Self {
        Self { default_tracking_days: 7, max_age_days: 30 }
    }
}

pub struct ShadowTracker {
    settings: ShadowTrackerSettings,
    shadows: Vec<ShadowTrade>,
}

impl ShadowTracker {
    pub fn new(settings: ShadowTrackerSettings) -> Self {
        Self { settings, shadows: Vec::new() }
    }

    pub fn with_defaults() -> Self {
        Self::new(ShadowTrackerSettings::default())
    }

    pub fn active_shadows(&self) -> impl Iterator<Item = &ShadowTrade> {
        self.shadows.iter().filter(|s| s.status == ShadowStatus::Tracking)
    }

    pub fn all_shadows(&self) -> &[ShadowTrade] {
        &self.shadows
    }

    /// Opens a hypothetical position at `entry_price`, in TRACKING state.
    #[allow(clippy::too_many_arguments)]
    pub fn create(
        &mut self,
        id: impl Into<String>,
        proposal_id: Option<String>,
        ticker: impl Into<String>,
        action: SignalAction,
        entry_price: f64,
        shares: i64,
        rejection_reason: impl Into<String>,
        violated_articles: Vec<String>,
        tracking_days: Option<i64>,
        now: DateTime<Utc>,
    ) -> ShadowTrade {
        let shadow = ShadowTrade {
            id: id.into(),
            proposal_id,
            ticker: ticker.into(),
            action,
            entry_price,
            entry_date: now,
            exit_price: None,
            shares,
            rejection_reason: rejection_reason.into(),
            violated_articles,
            tracking_days: tracking_days.unwrap_or(self.settings.default_tracking_days),
            status: ShadowStatus::Tracking,
            virtual_pnl: 0.0,
            virtual_pnl_pct: 0.0,
            closed_at: None,
        };
        self.shadows.push(shadow.clone());
        shadow
    }

    /// Recomputes virtual P&L against `current_price`. Applied in place to the
    /// tracker's copy; the caller is responsible for persisting the result
    /// through a `ShadowRepository`.
    pub fn update(&mut self, shadow_id: &str, current_price: f64) -> Option<&ShadowTrade> {
        let shadow = self.shadows.iter_mut().find(|s| s.id == shadow_id)?;
        apply_pnl(shadow, current_price);
        Some(shadow)
    }

    /// One final update against `final_price`, then transitions to CLOSED and
    /// stamps `closed_at`.
    pub fn close(&mut self, shadow_id: &str, final_price: f64, now: DateTime<Utc>) -> Option<&ShadowTrade> {
        let shadow = self.shadows.iter_mut().find(|s| s.id == shadow_id)?;
        apply_pnl(shadow, final_price);
        shadow.exit_price = Some(final_price);
        shadow.status = ShadowStatus::Closed;
        shadow.closed_at = Some(now);
        Some(shadow)
    }

    /// Walks every TRACKING shadow: those whose age has reached their
    /// `tracking_days` window are closed at `current_price`; the rest are
    /// updated in place. `current_price` is looked up per-ticker.
    pub fn update_all<F>(&mut self, now: DateTime<Utc>, mut current_price: F)
    where
        F: FnMut(&str) -> Option<f64>,
    {
        for shadow in self.shadows.iter_mut() {
            if shadow.status != ShadowStatus::Tracking {
                continue;
            }
            let Some(price) = current_price(&shadow.ticker) else { continue };
            let age_days = (now - shadow.entry_date).num_days();
            apply_pnl(shadow, price);
            if age_days >= shadow.tracking_days {
                shadow.exit_price = Some(price);
                shadow.status = ShadowStatus::Closed;
                shadow.closed_at = Some(now);
            }
        }
    }

    /// GC pass distinct from tracking-window expiry: any shadow (tracking or
    /// closed) older than `max_age_days` since entry is force-expired.
    pub fn close_expired_shadows(&mut self, now: DateTime<Utc>) -> usize {
        let cutoff = now - Duration::days(self.settings.max_age_days);
        let mut expired = 0;
        for shadow in self.shadows.iter_mut() {
            if shadow.status == ShadowStatus::Tracking && shadow.entry_date < cutoff {
                shadow.status = ShadowStatus::Expired;
                shadow.closed_at = Some(now);
                expired += 1;
            }
        }
        expired
    }

    /// Shadows within `window_days` whose P&L sign proves the rejection
    /// prevented a loss: a rejected BUY whose price fell, or a rejected SELL
    /// whose price rose.
    pub fn defensive_wins(&self, window_days: i64, now: DateTime<Utc>) -> Vec<&ShadowTrade> {
        let cutoff = now - Duration::days(window_days);
        self.shadows
            .iter()
            .filter(|s| s.entry_date >= cutoff && s.status != ShadowStatus::Tracking)
            .filter(|s| is_defensive_win(s))
            .collect()
    }

    pub fn get_shadow_by_ticker(&self, ticker: &str) -> Vec<&ShadowTrade> {
        self.shadows.iter().filter(|s| s.ticker == ticker).collect()
    }

    /// Summary of rejected Proposals within `window_days` and the loss they
    /// hypothetically avoided, with the top-3 highlights by avoided loss.
    pub fn shield_report(&self, window_days: i64, now: DateTime<Utc>) -> ShieldReport {
        let cutoff = now - Duration::days(window_days);
        let considered: Vec<&ShadowTrade> = self
            .shadows
            .iter()
            .filter(|s| s.entry_date >= cutoff && s.status != ShadowStatus::Tracking)
            .collect();

        let rejected = considered.len() as i64;
        let wins: Vec<&&ShadowTrade> = considered.iter().filter(|s| is_defensive_win(s)).collect();
        let defensive_wins = wins.len() as i64;
        let defensive_win_rate = if rejected > 0 { defensive_wins as f64 / rejected as f64 } else { 0.0 };
        let total_avoided_loss: f64 = wins.iter().map(|s| avoided_loss(s)).sum();

        let mut highlights: Vec<ShieldHighlight> = wins
            .iter()
            .map(|s| ShieldHighlight {
                ticker: s.ticker.clone(),
                action: s.action,
                rejection_reason: s.rejection_reason.clone(),
                entry_price: s.entry_price,
                exit_price: s.exit_price,
                avoided_loss: avoided_loss(s),
                pnl_pct: s.virtual_pnl_pct,
                date: s.entry_date,
            })
            .collect();
        highlights.sort_by(|a, b| b.avoided_loss.partial_cmp(&a.avoided_loss).unwrap());
        highlights.truncate(3);

        ShieldReport {
            period_days: window_days,
            rejected,
            defensive_wins,
            defensive_win_rate,
            total_avoided_loss,
            highlights,
        }
    }
}

/// §4.I P&L formula. BUY: `(current - entry) / entry`, `(current - entry) *
/// shares`. SELL: `(entry - current) / entry`, `(entry - current) * shares`.
/// HOLD: always zero — the literal HOLD branch only, never substituted for a
/// rejected SELL.
fn apply_pnl(shadow: &mut ShadowTrade, current_price: f64) {
    let (pnl_pct, pnl_dollars) = match shadow.action {
        SignalAction::Buy => (
            (current_price - shadow.entry_price) / shadow.entry_price,
            (current_price - shadow.entry_price) * shadow.shares as f64,
        ),
        SignalAction::Sell => (
            (shadow.entry_price - current_price) / shadow.entry_price,
            (shadow.entry_price - current_price) * shadow.shares as f64,
        ),
        SignalAction::Hold => (0.0, 0.0),
    };
    shadow.virtual_pnl_pct = pnl_pct;
    shadow.virtual_pnl = pnl_dollars;
}

fn is_defensive_win(shadow: &ShadowTrade) -> bool {
    match shadow.action {
        SignalAction::Buy => shadow.virtual_pnl_pct < 0.0,
        SignalAction::Sell => shadow.virtual_pnl_pct > 0.0,
        SignalAction::Hold => false,
    }
}

fn avoided_loss(shadow: &ShadowTrade) -> f64 {
    if is_defensive_win(shadow) {
        shadow.virtual_pnl.abs()
    } else {
        0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn day(n: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(n)
    }

    #[test]
    fn scenario_5_shadow_defensive_win() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create(
            "s1",
            Some("p1".to_string()),
            "NVDA",
            SignalAction::Buy,
            200.0,
            100,
            "position size exceeded",
            vec!["제1조 (자본 보존 우선)".to_string()],
            Some(7),
            day(0),
        );
        let shadow = tracker.close("s1", 188.0, day(7)).unwrap();
        assert!((shadow.virtual_pnl - (-1200.0)).abs() < 1e-9);
        assert!((shadow.virtual_pnl_pct - (-0.06)).abs() < 1e-9);
        assert_eq!(shadow.status, ShadowStatus::Closed);
        assert!(is_defensive_win(shadow));
        assert!((avoided_loss(shadow) - 1200.0).abs() < 1e-9);
    }

    #[test]
    fn rejected_sell_that_rises_is_a_defensive_win() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create(
            "s2",
            None,
            "TSLA",
            SignalAction::Sell,
            100.0,
            50,
            "constitutional violation",
            vec![],
            Some(7),
            day(0),
        );
        let shadow = tracker.close("s2", 120.0, day(7)).unwrap();
        assert!((shadow.virtual_pnl - 1000.0).abs() < 1e-9);
        assert!(is_defensive_win(shadow));
    }

    #[test]
    fn hold_shadow_always_zero_pnl() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create("s3", None, "AAPL", SignalAction::Hold, 150.0, 10, "hold", vec![], Some(7), day(0));
        let shadow = tracker.close("s3", 200.0, day(7)).unwrap();
        assert_eq!(shadow.virtual_pnl, 0.0);
        assert_eq!(shadow.virtual_pnl_pct, 0.0);
        assert!(!is_defensive_win(shadow));
    }

    #[test]
    fn update_all_closes_shadows_past_their_tracking_window() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create("s4", None, "MSFT", SignalAction::Buy, 300.0, 10, "r", vec![], Some(7), day(0));
        tracker.update_all(day(8), |_| Some(280.0));
        let shadow = tracker.get_shadow_by_ticker("MSFT")[0];
        assert_eq!(shadow.status, ShadowStatus::Closed);
        assert!(shadow.virtual_pnl < 0.0);
    }

    #[test]
    fn update_all_leaves_unexpired_shadows_tracking() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create("s5", None, "MSFT", SignalAction::Buy, 300.0, 10, "r", vec![], Some(7), day(0));
        tracker.update_all(day(3), |_| Some(310.0));
        let shadow = tracker.get_shadow_by_ticker("MSFT")[0];
        assert_eq!(shadow.status, ShadowStatus::Tracking);
        assert!(shadow.virtual_pnl > 0.0);
    }

    #[test]
    fn close_expired_shadows_reaps_past_max_age_regardless_of_tracking_days() {
        let mut tracker = ShadowTracker::new(ShadowTrackerSettings { default_tracking_days: 90, max_age_days: 30 });
        tracker.create("s6", None, "AMD", SignalAction::Buy, 50.0, 20, "r", vec![], None, day(0));
        let expired = tracker.close_expired_shadows(day(45));
        assert_eq!(expired, 1);
        let shadow = tracker.get_shadow_by_ticker("AMD")[0];
        assert_eq!(shadow.status, ShadowStatus::Expired);
    }

    #[test]
    fn shield_report_ranks_top_three_by_avoided_loss() {
        let mut tracker = ShadowTracker::with_defaults();
        tracker.create("a", None, "A", SignalAction::Buy, 100.0, 10, "r", vec![], Some(1), day(0));
        tracker.create("b", None, "B", SignalAction::Buy, 100.0, 10, "r", vec![], Some(1), day(0));
        tracker.create("c", None, "C", SignalAction::Buy, 100.0, 10, "r", vec![], Some(1), day(0));
        tracker.create("d", None, "D", SignalAction::Buy, 100.0, 10, "r", vec![], Some(1), day(0));
        tracker.close("a", 90.0, day(1));
        tracker.close("b", 80.0, day(1));
        tracker.close("c", 95.0, day(1));
        tracker.close("d", 110.0, day(1)); // not a win

        let report = tracker.shield_report(7, day(1));
        assert_eq!(report.rejected, 4);
        assert_eq!(report.defensive_wins, 3);
        assert_eq!(report.highlights.len(), 3);
        assert_eq!(report.highlights[0].ticker, "B");
    }

    #[test]
    fn defensive_win_rate_is_zero_when_nothing_rejected() {
        let tracker = ShadowTracker::with_defaults();
        let report = tracker.shield_report(7, day(0));
        assert_eq!(report.defensive_win_rate, 0.0);
        assert_eq!(report.rejected, 0);
    }
}
