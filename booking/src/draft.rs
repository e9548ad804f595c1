//! The draft state machine.
//!
//! [`BookingDraft::apply`] is the only way a draft changes. Every call
//! returns a whole new draft, so a caller never observes one half-applied.

use crate::availability::{compute_available_times, parse_calendar_date};
use crate::types::{BookingDraft, Field, FieldUpdate, FieldValue};

/// Transitions of the draft
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum DraftAction {
    /// Set exactly one field
    UpdateField(FieldUpdate),
    /// Replace the offered slots
    SetAvailableTimes(Vec<String>),
    /// Back to the initial draft
    ResetForm,
    /// Mark the booking as accepted
    SubmitBooking,
}

impl BookingDraft {
    /// Apply one action and return the resulting draft
    ///
    /// A submitted draft only responds to [`DraftAction::ResetForm`].
    #[must_use]
    pub fn apply(self, action: DraftAction) -> Self {
        match action {
            DraftAction::ResetForm => Self::default(),
            _ if self.is_submitted => self,
            DraftAction::SubmitBooking => Self {
                is_submitted: true,
                ..self
            },
            DraftAction::SetAvailableTimes(available_times) => Self {
                available_times,
                ..self
            },
            DraftAction::UpdateField(update) => self.with_field(update),
        }
    }

    fn with_field(mut self, update: FieldUpdate) -> Self {
        match update.into_parts() {
            (Field::Guests, FieldValue::Count(guests)) => self.guests = guests,
            (Field::Date, FieldValue::Text(value)) => self.date = value,
            (Field::Time, FieldValue::Text(value)) => self.time = value,
            (Field::Occasion, FieldValue::Text(value)) => self.occasion = value,
            (Field::Name, FieldValue::Text(value)) => self.name = value,
            (Field::Email, FieldValue::Text(value)) => self.email = value,
            (Field::Phone, FieldValue::Text(value)) => self.phone = value,
            // FieldUpdate only pairs fields with their own value kind
            (field, value) => {
                tracing::warn!(%field, ?value, "Ignoring mismatched field update");
            },
        }
        self
    }
}

/// Move the draft to a new date
///
/// Sets the date, recomputes the offered slots, then clears the selected
/// time. An empty or unparseable date offers no slots.
#[must_use]
pub fn change_date(draft: BookingDraft, date: &str) -> BookingDraft {
    let times = parse_calendar_date(date)
        .map(compute_available_times)
        .unwrap_or_default();

    [
        DraftAction::UpdateField(FieldUpdate::date(date)),
        DraftAction::SetAvailableTimes(times),
        DraftAction::UpdateField(FieldUpdate::time("")),
    ]
    .into_iter()
    .fold(draft, BookingDraft::apply)
}
