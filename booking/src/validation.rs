//! Form validation.
//!
//! Validation always recomputes the whole [`ErrorSet`]; nothing from an
//! earlier pass survives into the next one.

use crate::availability::parse_calendar_date;
use crate::types::{BookingDraft, Field};
use chrono::NaiveDate;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::LazyLock;

/// Smallest accepted party size
pub const MIN_GUESTS: i64 = 1;
/// Largest accepted party size
pub const MAX_GUESTS: i64 = 10;

// Literal patterns, so compilation cannot fail at runtime.
#[allow(clippy::expect_used)]
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\S+@\S+\.\S+").expect("email pattern is valid"));

#[allow(clippy::expect_used)]
static PHONE_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\+?[0-9\s\-()]+$").expect("phone pattern is valid"));

/// Field name to message; an absent key means the field is valid
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ErrorSet(BTreeMap<Field, String>);

impl ErrorSet {
    /// Empty set
    #[must_use]
    pub const fn new() -> Self {
        Self(BTreeMap::new())
    }

    fn insert(&mut self, field: Field, message: &str) {
        self.0.insert(field, message.to_string());
    }

    /// Message for `field`, if it failed
    #[must_use]
    pub fn get(&self, field: Field) -> Option<&str> {
        self.0.get(&field).map(String::as_str)
    }

    /// Whether `field` failed
    #[must_use]
    pub fn contains(&self, field: Field) -> bool {
        self.0.contains_key(&field)
    }

    /// True when the draft is fully valid
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of failing fields
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Failing fields and their messages, in form order
    pub fn iter(&self) -> impl Iterator<Item = (Field, &str)> {
        self.0.iter().map(|(field, message)| (*field, message.as_str()))
    }
}

/// Validate a draft without reference to the current date
#[must_use]
pub fn validate(draft: &BookingDraft) -> ErrorSet {
    let mut errors = ErrorSet::new();

    if draft.date.is_empty() {
        errors.insert(Field::Date, "Date is required");
    } else if parse_calendar_date(&draft.date).is_none() {
        errors.insert(Field::Date, "Date is invalid");
    }

    if draft.time.is_empty() {
        errors.insert(Field::Time, "Time is required");
    } else if !draft.available_times.iter().any(|t| *t == draft.time) {
        errors.insert(Field::Time, "Time is not available for the selected date");
    }

    if !(MIN_GUESTS..=MAX_GUESTS).contains(&draft.guests) {
        errors.insert(Field::Guests, "Guests must be between 1 and 10");
    }

    if draft.name.trim().is_empty() {
        errors.insert(Field::Name, "Name is required");
    }

    if draft.email.trim().is_empty() {
        errors.insert(Field::Email, "Email is required");
    } else if !EMAIL_PATTERN.is_match(&draft.email) {
        errors.insert(Field::Email, "Email is invalid");
    }

    if draft.phone.trim().is_empty() {
        errors.insert(Field::Phone, "Phone is required");
    } else if !PHONE_PATTERN.is_match(&draft.phone) {
        errors.insert(Field::Phone, "Phone number is invalid");
    }

    errors
}

/// Validate a draft, also refusing dates before `today`
#[must_use]
pub fn validate_as_of(draft: &BookingDraft, today: NaiveDate) -> ErrorSet {
    let mut errors = validate(draft);

    if !errors.contains(Field::Date)
        && parse_calendar_date(&draft.date).is_some_and(|date| date < today)
    {
        errors.insert(Field::Date, "Date cannot be in the past");
    }

    errors
}
