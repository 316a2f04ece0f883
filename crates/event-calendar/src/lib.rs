//! Event Calendar (component B).
//!
//! Answers `find_matching(timestamp, ticker?, keywords?, window) -> Event?` against a
//! fixed set of recurring event families plus manually added events. Pure in-memory,
//! re-entrant reads; no global singleton — the orchestrator owns one instance created
//! once at start-up.

use chrono::{DateTime, Datelike, Duration, TimeZone, Timelike, Utc};
use log::debug;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Earnings,
    Fomc,
    Cpi,
    Nfp,
    Gdp,
    RetailSales,
    Unemployment,
    Ppi,
    Housing,
    Pmi,
    CentralBank,
    Fda,
    ProductLaunch,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventImportance {
    High,
    Medium,
    Low,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EconomicEvent {
    pub event_type: EventType,
    pub event_name: String,
    pub ticker: Option<String>,
    pub scheduled_time: DateTime<Utc>,
    pub importance: EventImportance,
    pub description: String,
    pub country: String,
    pub source: String,
}

const MONTH_NAMES: [&str; 12] = [
    "January", "February", "March", "April", "May", "June",
    "July", "August", "September", "October", "November", "December",
];

/// Scheduled-event lookup for the EL (Event Legitimacy) signal.
pub struct EconomicCalendar {
    events: Vec<EconomicEvent>,
}

impl EconomicCalendar {
    /// Build the calendar anchored at `now`: FOMC decision days, monthly CPI and
    /// NFP releases for the next 12 months, filtered to strictly-future events.
    pub fn new(now: DateTime<Utc>) -> Self {
        let mut events = Vec::new();
        Self::load_fomc(&mut events, now);
        Self::load_cpi(&mut events, now);
        Self::load_nfp(&mut events, now);
        debug!("EconomicCalendar initialized with {} events", events.len());
        Self { events }
    }

    fn load_fomc(events: &mut Vec<EconomicEvent>, now: DateTime<Utc>) {
        let current_year = now.year();
        let next_year = current_year + 1;
        let candidates = [
            (current_year, 12, 18),
            (next_year, 1, 29),
            (next_year, 3, 19),
            (next_year, 5, 7),
            (next_year, 6, 18),
            (next_year, 7, 30),
            (next_year, 9, 17),
            (next_year, 11, 5),
            (next_year, 12, 17),
        ];
        for (year, month, day) in candidates {
            if let Some(date) = Utc.with_ymd_and_hms(year, month, day, 14, 0, 0).single() {
                if date > now {
                    events.push(EconomicEvent {
                        event_type: EventType::Fomc,
                        event_name: "FOMC Meeting Decision".to_string(),
                        ticker: None,
                        scheduled_time: date,
                        importance: EventImportance::High,
                        description: "Federal Reserve interest rate decision".to_string(),
                        country: "US".to_string(),
                        source: "FED".to_string(),
                    });
                }
            }
        }
    }

    fn load_cpi(events: &mut Vec<EconomicEvent>, now: DateTime<Utc>) {
        for i in 0..12 {
            let (year, month) = shift_month(now.year(), now.month(), i);
            if let Some(date) = Utc.with_ymd_and_hms(year, month, 13, 8, 30, 0).single() {
                if date > now {
                    events.push(EconomicEvent {
                        event_type: EventType::Cpi,
                        event_name: format!("CPI {} {}", MONTH_NAMES[(month - 1) as usize], year),
                        ticker: None,
                        scheduled_time: date,
                        importance: EventImportance::High,
                        description: "Consumer Price Index (inflation data)".to_string(),
                        country: "US".to_string(),
                        source: "BLS".to_string(),
                    });
                }
            }
        }
    }

    fn load_nfp(events: &mut Vec<EconomicEvent>, now: DateTime<Utc>) {
        for i in 0..12 {
            let (year, month) = shift_month(now.year(), now.month(), i);
            if let Some(first_day) = Utc.with_ymd_and_hms(year, month, 1, 8, 30, 0).single() {
                let days_until_friday =
                    (4 - first_day.weekday().num_days_from_monday() as i64).rem_euclid(7);
                let nfp_date = first_day + Duration::days(days_until_friday);
                if nfp_date > now {
                    events.push(EconomicEvent {
                        event_type: EventType::Nfp,
                        event_name: format!(
                            "Non-Farm Payrolls {} {}",
                            MONTH_NAMES[(month - 1) as usize],
                            year
                        ),
                        ticker: None,
                        scheduled_time: nfp_date,
                        importance: EventImportance::High,
                        description: "Monthly jobs report".to_string(),
                        country: "US".to_string(),
                        source: "BLS".to_string(),
                    });
                }
            }
        }
    }

    pub fn add_event(&mut self, event: EconomicEvent) {
        debug!("added event: {} at {}", event.event_name, event.scheduled_time);
        self.events.push(event);
    }

    /// First event within `window` of `timestamp` whose ticker matches (when both
    /// present) or any keyword is a substring of its name+description.
    pub fn find_matching_event(
        &self,
        timestamp: DateTime<Utc>,
        ticker: Option<&str>,
        keywords: Option<&[&str]>,
        window: Duration,
    ) -> Option<&EconomicEvent> {
        self.events.iter().find(|event| {
            let diff = (timestamp - event.scheduled_time).abs();
            if diff > window {
                return false;
            }
            if let (Some(t), Some(event_ticker)) = (ticker, event.ticker.as_deref()) {
                if t.eq_ignore_ascii_case(event_ticker) {
                    return true;
                }
            }
            if let Some(kws) = keywords {
                let haystack =
                    format!("{} {}", event.event_name, event.description).to_lowercase();
                return kws.iter().any(|kw| haystack.contains(&kw.to_lowercase()));
            }
            false
        })
    }

    pub fn get_upcoming_events(
        &self,
        now: DateTime<Utc>,
        hours: i64,
        ticker: Option<&str>,
        event_type: Option<EventType>,
    ) -> Vec<&EconomicEvent> {
        let cutoff = now + Duration::hours(hours);
        let mut upcoming: Vec<&EconomicEvent> = self
            .events
            .iter()
            .filter(|e| e.scheduled_time >= now && e.scheduled_time <= cutoff)
            .filter(|e| ticker.map(|t| e.ticker.as_deref() == Some(t)).unwrap_or(true))
            .filter(|e| event_type.map(|et| e.event_type == et).unwrap_or(true))
            .collect();
        upcoming.sort_by_key(|e| e.scheduled_time);
        upcoming
    }
}

fn shift_month(year: i32, month: u32, offset: i32) -> (i32, u32) {
    let zero_based = month as i32 - 1 + offset;
    let target_year = year + zero_based.div_euclid(12);
    let target_month = zero_based.rem_euclid(12) as u32 + 1;
    (target_year, target_month)
}

/// `second == 0 && minute % 30 == 0` — used by the Four-Signal Calculator's
/// clean-time check for TN and EL.
pub fn is_clean_time(t: DateTime<Utc>) -> bool {
    t.second() == 0 && t.minute() % 30 == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn dt(y: i32, m: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, m, d, h, mi, 0).unwrap()
    }

    #[test]
    fn fomc_matches_within_window() {
        let now = dt(2025, 1, 1, 0, 0);
        let cal = EconomicCalendar::new(now);
        let fomc_time = dt(2025, 1, 29, 14, 0);
        let m = cal.find_matching_event(fomc_time, None, Some(&["fomc", "fed"]), Duration::minutes(30));
        assert!(m.is_some());
        assert_eq!(m.unwrap().event_type, EventType::Fomc);
    }

    #[test]
    fn cpi_matches_within_smaller_window() {
        let now = dt(2025, 1, 1, 0, 0);
        let cal = EconomicCalendar::new(now);
        let cpi_time = dt(2025, 1, 13, 8, 35);
        let m = cal.find_matching_event(cpi_time, None, Some(&["cpi", "inflation"]), Duration::minutes(10));
        assert!(m.is_some());
    }

    #[test]
    fn no_match_for_unrelated_keywords() {
        let now = dt(2025, 1, 1, 0, 0);
        let cal = EconomicCalendar::new(now);
        let random_time = dt(2025, 1, 15, 14, 23);
        let m = cal.find_matching_event(random_time, None, Some(&["random", "test"]), Duration::minutes(30));
        assert!(m.is_none());
    }

    #[test]
    fn custom_earnings_event_matches_by_ticker() {
        let now = dt(2025, 1, 1, 0, 0);
        let mut cal = EconomicCalendar::new(now);
        cal.add_event(EconomicEvent {
            event_type: EventType::Earnings,
            event_name: "Apple Q1 2025 Earnings".to_string(),
            ticker: Some("AAPL".to_string()),
            scheduled_time: dt(2025, 1, 30, 16, 0),
            importance: EventImportance::High,
            description: "Apple quarterly earnings report".to_string(),
            country: "US".to_string(),
            source: "manual".to_string(),
        });
        let m = cal.find_matching_event(dt(2025, 1, 30, 16, 2), Some("AAPL"), None, Duration::minutes(10));
        assert!(m.is_some());
        assert_eq!(m.unwrap().event_type, EventType::Earnings);
    }

    #[test]
    fn is_clean_time_detects_half_hour_marks() {
        assert!(is_clean_time(dt(2025, 1, 1, 9, 30)));
        assert!(!is_clean_time(dt(2025, 1, 1, 9, 31)));
    }
}
