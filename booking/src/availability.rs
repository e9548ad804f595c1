//! Time slots offered for a reservation date.
//!
//! Availability is a pure function of the day of the month: each catalog
//! slot is dropped when `(day + index) % 3 == 0`, so the offer repeats every
//! month.

use chrono::{Datelike, NaiveDate};

/// Slots the restaurant can ever offer, in display order
pub const BASE_TIMES: [&str; 6] = ["17:00", "18:00", "19:00", "20:00", "21:00", "22:00"];

/// Slot offered when the filter leaves nothing
pub const FALLBACK_TIME: &str = "19:00";

/// Date format used by the draft and the date control
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Slots available on `date`
#[must_use]
pub fn compute_available_times(date: NaiveDate) -> Vec<String> {
    select_times(&BASE_TIMES, date.day())
}

/// Filter `catalog` with `seed`, falling back to [`FALLBACK_TIME`]
///
/// Keeps catalog order. The slot at index `i` is kept unless
/// `(seed + i) % 3 == 0`.
#[must_use]
pub fn select_times(catalog: &[&str], seed: u32) -> Vec<String> {
    let times: Vec<String> = catalog
        .iter()
        .zip(0_u64..)
        .filter(|&(_, i)| (u64::from(seed) + i) % 3 != 0)
        .map(|(time, _)| (*time).to_string())
        .collect();

    if times.is_empty() {
        vec![FALLBACK_TIME.to_string()]
    } else {
        times
    }
}

/// Parse the ISO date held by the draft
///
/// Returns `None` for empty or malformed input.
#[must_use]
pub fn parse_calendar_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), DATE_FORMAT).ok()
}
