//! Selection criteria and best-effort free-text parsing.
//!
//! The parser is a narrow heuristic layer: phrase matching for statuses,
//! relative and explicit date ranges, and pattern extraction for emails,
//! totals, and countries. Text it cannot interpret leaves the corresponding
//! dimension empty; parsing never fails.

use std::sync::OnceLock;

use chrono::{Datelike, Duration, NaiveDate};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::order::{Order, OrderStatus};
use crate::types::Timestamp;

// ---------------------------------------------------------------------------
// Criteria
// ---------------------------------------------------------------------------

/// Structured order selection criteria. All dimensions are optional; an
/// empty dimension matches everything.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SelectionCriteria {
    #[serde(default)]
    pub statuses: Vec<OrderStatus>,
    pub date_from: Option<Timestamp>,
    pub date_to: Option<Timestamp>,
    pub customer_email: Option<String>,
    pub min_total: Option<f64>,
    pub max_total: Option<f64>,
    /// ISO 3166-1 alpha-2 billing country code.
    pub country: Option<String>,
}

impl SelectionCriteria {
    /// Whether no dimension is set at all.
    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
            && self.date_from.is_none()
            && self.date_to.is_none()
            && self.customer_email.is_none()
            && self.min_total.is_none()
            && self.max_total.is_none()
            && self.country.is_none()
    }

    /// Whether an order satisfies every set dimension.
    pub fn matches(&self, order: &Order) -> bool {
        if !self.statuses.is_empty() && !self.statuses.contains(&order.status) {
            return false;
        }
        if let Some(from) = self.date_from {
            if order.date_created < from {
                return false;
            }
        }
        if let Some(to) = self.date_to {
            if order.date_created > to {
                return false;
            }
        }
        if let Some(email) = &self.customer_email {
            match &order.customer_email {
                Some(e) if e.eq_ignore_ascii_case(email) => {}
                _ => return false,
            }
        }
        if let Some(min) = self.min_total {
            if order.total < min {
                return false;
            }
        }
        if let Some(max) = self.max_total {
            if order.total > max {
                return false;
            }
        }
        if let Some(country) = &self.country {
            match &order.country {
                Some(c) if c.eq_ignore_ascii_case(country) => {}
                _ => return false,
            }
        }
        true
    }
}

// ---------------------------------------------------------------------------
// Free-text parsing
// ---------------------------------------------------------------------------

/// Status phrases checked against the lowercased text. Longer phrases first
/// so "pending payment" does not double-match via "pending".
const STATUS_PHRASES: &[(&str, OrderStatus)] = &[
    ("pending payment", OrderStatus::Pending),
    ("on hold", OrderStatus::OnHold),
    ("on-hold", OrderStatus::OnHold),
    ("processing", OrderStatus::Processing),
    ("completed", OrderStatus::Completed),
    ("complete", OrderStatus::Completed),
    ("cancelled", OrderStatus::Cancelled),
    ("canceled", OrderStatus::Cancelled),
    ("refunded", OrderStatus::Refunded),
    ("failed", OrderStatus::Failed),
    ("pending", OrderStatus::Pending),
];

/// Country names recognized in free text, mapped to alpha-2 codes.
const COUNTRY_NAMES: &[(&str, &str)] = &[
    ("united states", "US"),
    ("usa", "US"),
    ("united kingdom", "GB"),
    ("uk", "GB"),
    ("germany", "DE"),
    ("france", "FR"),
    ("canada", "CA"),
    ("australia", "AU"),
    ("spain", "ES"),
    ("italy", "IT"),
    ("netherlands", "NL"),
];

fn email_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}").expect("static regex")
    })
}

fn explicit_range_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"from\s+(\d{4}-\d{2}-\d{2})\s+to\s+(\d{4}-\d{2}-\d{2})")
            .expect("static regex")
    })
}

fn since_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:since|after)\s+(\d{4}-\d{2}-\d{2})").expect("static regex"))
}

fn before_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?:before|until)\s+(\d{4}-\d{2}-\d{2})").expect("static regex"))
}

fn last_days_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"last\s+(\d{1,3})\s+days").expect("static regex"))
}

fn between_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"between\s+\$?(\d+(?:\.\d+)?)\s+and\s+\$?(\d+(?:\.\d+)?)")
            .expect("static regex")
    })
}

fn min_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:over|above|more than|at least)\s+\$?(\d+(?:\.\d+)?)")
            .expect("static regex")
    })
}

fn max_total_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?:under|below|less than|at most)\s+\$?(\d+(?:\.\d+)?)")
            .expect("static regex")
    })
}

fn country_code_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"country\s*:?\s*([a-z]{2})\b").expect("static regex"))
}

/// Parse free text into criteria relative to `now` (passed in so parsing
/// stays deterministic under test).
pub fn parse_text(text: &str, now: Timestamp) -> SelectionCriteria {
    let lower = text.to_lowercase();
    let mut criteria = SelectionCriteria::default();

    parse_statuses(&lower, &mut criteria);
    parse_dates(&lower, now, &mut criteria);
    parse_email(text, &mut criteria);
    parse_totals(&lower, &mut criteria);
    parse_country(&lower, &mut criteria);

    criteria
}

fn parse_statuses(lower: &str, criteria: &mut SelectionCriteria) {
    let mut consumed = lower.to_string();
    for (phrase, status) in STATUS_PHRASES {
        if consumed.contains(phrase) {
            if !criteria.statuses.contains(status) {
                criteria.statuses.push(*status);
            }
            // Remove the phrase so a shorter phrase cannot re-match inside it.
            consumed = consumed.replace(phrase, " ");
        }
    }
}

fn parse_dates(lower: &str, now: Timestamp, criteria: &mut SelectionCriteria) {
    let start_of = |date: NaiveDate| -> Option<Timestamp> {
        date.and_hms_opt(0, 0, 0).map(|dt| dt.and_utc())
    };
    let end_of = |date: NaiveDate| -> Option<Timestamp> {
        date.and_hms_opt(23, 59, 59).map(|dt| dt.and_utc())
    };
    let today = now.date_naive();

    if let Some(caps) = explicit_range_re().captures(lower) {
        let from = caps[1].parse::<NaiveDate>().ok().and_then(start_of);
        let to = caps[2].parse::<NaiveDate>().ok().and_then(end_of);
        if from.is_some() && to.is_some() {
            criteria.date_from = from;
            criteria.date_to = to;
            return;
        }
    }
    if let Some(caps) = since_re().captures(lower) {
        criteria.date_from = caps[1].parse::<NaiveDate>().ok().and_then(start_of);
    }
    if let Some(caps) = before_re().captures(lower) {
        criteria.date_to = caps[1].parse::<NaiveDate>().ok().and_then(end_of);
    }
    if criteria.date_from.is_some() || criteria.date_to.is_some() {
        return;
    }

    if let Some(caps) = last_days_re().captures(lower) {
        if let Ok(days) = caps[1].parse::<i64>() {
            criteria.date_from = Some(now - Duration::days(days));
            criteria.date_to = Some(now);
            return;
        }
    }
    if lower.contains("today") {
        criteria.date_from = start_of(today);
        criteria.date_to = Some(now);
    } else if lower.contains("yesterday") {
        let yesterday = today - Duration::days(1);
        criteria.date_from = start_of(yesterday);
        criteria.date_to = end_of(yesterday);
    } else if lower.contains("last week") {
        criteria.date_from = Some(now - Duration::days(7));
        criteria.date_to = Some(now);
    } else if lower.contains("this month") {
        criteria.date_from = today.with_day(1).and_then(start_of);
        criteria.date_to = Some(now);
    } else if lower.contains("last month") {
        let first_of_this = match today.with_day(1) {
            Some(d) => d,
            None => return,
        };
        let last_of_prev = first_of_this - Duration::days(1);
        criteria.date_from = last_of_prev.with_day(1).and_then(start_of);
        criteria.date_to = end_of(last_of_prev);
    }
}

fn parse_email(text: &str, criteria: &mut SelectionCriteria) {
    if let Some(m) = email_re().find(text) {
        criteria.customer_email = Some(m.as_str().to_lowercase());
    }
}

fn parse_totals(lower: &str, criteria: &mut SelectionCriteria) {
    if let Some(caps) = between_re().captures(lower) {
        criteria.min_total = caps[1].parse().ok();
        criteria.max_total = caps[2].parse().ok();
        return;
    }
    if let Some(caps) = min_total_re().captures(lower) {
        criteria.min_total = caps[1].parse().ok();
    }
    if let Some(caps) = max_total_re().captures(lower) {
        criteria.max_total = caps[1].parse().ok();
    }
}

fn parse_country(lower: &str, criteria: &mut SelectionCriteria) {
    if let Some(caps) = country_code_re().captures(lower) {
        criteria.country = Some(caps[1].to_uppercase());
        return;
    }
    for (name, code) in COUNTRY_NAMES {
        if lower.contains(name) {
            criteria.country = Some((*code).to_string());
            return;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> Timestamp {
        chrono::Utc.with_ymd_and_hms(2025, 3, 15, 14, 30, 0).unwrap()
    }

    // -- statuses -------------------------------------------------------------

    #[test]
    fn detects_single_status() {
        let c = parse_text("show me all pending orders", now());
        assert_eq!(c.statuses, vec![OrderStatus::Pending]);
    }

    #[test]
    fn detects_hyphenless_on_hold() {
        let c = parse_text("orders on hold from last week", now());
        assert!(c.statuses.contains(&OrderStatus::OnHold));
    }

    #[test]
    fn pending_payment_does_not_duplicate_pending() {
        let c = parse_text("pending payment orders", now());
        assert_eq!(c.statuses, vec![OrderStatus::Pending]);
    }

    #[test]
    fn detects_multiple_statuses() {
        let c = parse_text("cancelled and refunded orders", now());
        assert_eq!(
            c.statuses,
            vec![OrderStatus::Cancelled, OrderStatus::Refunded]
        );
    }

    // -- dates ----------------------------------------------------------------

    #[test]
    fn explicit_range_wins_over_relative() {
        let c = parse_text("orders from 2025-01-01 to 2025-01-31 today", now());
        assert_eq!(
            c.date_from.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            c.date_to.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 1, 31, 23, 59, 59).unwrap()
        );
    }

    #[test]
    fn since_sets_only_lower_bound() {
        let c = parse_text("orders since 2025-02-10", now());
        assert_eq!(
            c.date_from.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 2, 10, 0, 0, 0).unwrap()
        );
        assert!(c.date_to.is_none());
    }

    #[test]
    fn today_spans_midnight_to_now() {
        let c = parse_text("orders from today", now());
        assert_eq!(
            c.date_from.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 3, 15, 0, 0, 0).unwrap()
        );
        assert_eq!(c.date_to.unwrap(), now());
    }

    #[test]
    fn yesterday_is_a_closed_day() {
        let c = parse_text("yesterday's orders", now());
        assert_eq!(
            c.date_from.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 3, 14, 0, 0, 0).unwrap()
        );
        assert_eq!(
            c.date_to.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 3, 14, 23, 59, 59).unwrap()
        );
    }

    #[test]
    fn last_n_days() {
        let c = parse_text("orders in the last 30 days", now());
        assert_eq!(c.date_from.unwrap(), now() - Duration::days(30));
        assert_eq!(c.date_to.unwrap(), now());
    }

    #[test]
    fn last_month_is_previous_calendar_month() {
        let c = parse_text("last month orders", now());
        assert_eq!(
            c.date_from.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 2, 1, 0, 0, 0).unwrap()
        );
        assert_eq!(
            c.date_to.unwrap(),
            chrono::Utc.with_ymd_and_hms(2025, 2, 28, 23, 59, 59).unwrap()
        );
    }

    // -- email / totals / country ---------------------------------------------

    #[test]
    fn extracts_email_lowercased() {
        let c = parse_text("orders by Jo.Smith@Example.COM", now());
        assert_eq!(c.customer_email.unwrap(), "jo.smith@example.com");
    }

    #[test]
    fn over_sets_min_total() {
        let c = parse_text("orders over $150", now());
        assert_eq!(c.min_total, Some(150.0));
        assert!(c.max_total.is_none());
    }

    #[test]
    fn between_sets_both_bounds() {
        let c = parse_text("orders between $50 and $99.99", now());
        assert_eq!(c.min_total, Some(50.0));
        assert_eq!(c.max_total, Some(99.99));
    }

    #[test]
    fn country_name_maps_to_code() {
        let c = parse_text("orders from germany over $20", now());
        assert_eq!(c.country.as_deref(), Some("DE"));
    }

    #[test]
    fn explicit_country_code() {
        let c = parse_text("orders country: fr", now());
        assert_eq!(c.country.as_deref(), Some("FR"));
    }

    #[test]
    fn unmatched_text_yields_empty_criteria() {
        let c = parse_text("do something nice", now());
        assert!(c.is_empty());
    }

    // -- matches --------------------------------------------------------------

    fn order(status: OrderStatus, total: f64) -> Order {
        Order {
            id: 1,
            number: "1".into(),
            status,
            total,
            currency: "USD".into(),
            customer_email: Some("jo@example.com".into()),
            country: Some("DE".into()),
            tags: vec![],
            date_created: now(),
        }
    }

    #[test]
    fn matches_applies_every_set_dimension() {
        let c = parse_text("completed orders over $50 from germany", now());
        assert!(c.matches(&order(OrderStatus::Completed, 75.0)));
        assert!(!c.matches(&order(OrderStatus::Pending, 75.0)));
        assert!(!c.matches(&order(OrderStatus::Completed, 25.0)));
    }

    #[test]
    fn empty_criteria_match_everything() {
        let c = SelectionCriteria::default();
        assert!(c.matches(&order(OrderStatus::Failed, 0.0)));
    }
}
