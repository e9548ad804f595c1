//! Domain types for the reservation form.
//!
//! The draft is the single record the form edits. Field updates are typed:
//! each [`Field`] accepts exactly one kind of [`FieldValue`], so a party size
//! can never be written into the email slot.

use crate::availability::BASE_TIMES;
use crate::error::BookingError;
use serde::{Deserialize, Serialize};

/// The editable fields of a booking draft
///
/// The order of the variants is the order the form presents them in, and
/// also the iteration order of an [`ErrorSet`](crate::validation::ErrorSet).
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Field {
    /// Reservation date (ISO `YYYY-MM-DD`)
    Date,
    /// Reservation time, one of the available slots
    Time,
    /// Party size
    Guests,
    /// Optional occasion
    Occasion,
    /// Contact name
    Name,
    /// Contact email
    Email,
    /// Contact phone number
    Phone,
}

impl Field {
    /// All fields in form order
    pub const ALL: [Self; 7] = [
        Self::Date,
        Self::Time,
        Self::Guests,
        Self::Occasion,
        Self::Name,
        Self::Email,
        Self::Phone,
    ];

    /// Stable lowercase name, used as the error-set key
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Date => "date",
            Self::Time => "time",
            Self::Guests => "guests",
            Self::Occasion => "occasion",
            Self::Name => "name",
            Self::Email => "email",
            Self::Phone => "phone",
        }
    }

    /// Whether this field carries a count rather than text
    #[must_use]
    pub const fn is_numeric(self) -> bool {
        matches!(self, Self::Guests)
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Field {
    type Err = BookingError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or_else(|| BookingError::UnknownField(s.to_string()))
    }
}

/// Value carried by a field update
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// Text value (every field except guests)
    Text(String),
    /// Integer value (guests)
    Count(i64),
}

/// A single typed field assignment
///
/// Built through the per-field constructors, [`FieldUpdate::new`], or
/// [`FieldUpdate::from_input`] for raw view input.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FieldUpdate {
    field: Field,
    value: FieldValue,
}

impl FieldUpdate {
    /// Pair a field with a value, checking that the value kind fits the field
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::FieldTypeMismatch`] when a count is given for a
    /// text field or text for the guests field.
    pub fn new(field: Field, value: FieldValue) -> Result<Self, BookingError> {
        let fits = match &value {
            FieldValue::Count(_) => field.is_numeric(),
            FieldValue::Text(_) => !field.is_numeric(),
        };
        if fits {
            Ok(Self { field, value })
        } else {
            Err(BookingError::FieldTypeMismatch { field })
        }
    }

    /// Parse raw text coming from a form control
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidGuestCount`] if the guests input is not
    /// an integer.
    pub fn from_input(field: Field, raw: &str) -> Result<Self, BookingError> {
        if field.is_numeric() {
            let count = raw
                .trim()
                .parse::<i64>()
                .map_err(|_| BookingError::InvalidGuestCount(raw.to_string()))?;
            Ok(Self::guests(count))
        } else {
            Ok(Self {
                field,
                value: FieldValue::Text(raw.to_string()),
            })
        }
    }

    fn text(field: Field, value: impl Into<String>) -> Self {
        Self {
            field,
            value: FieldValue::Text(value.into()),
        }
    }

    /// Set the date
    #[must_use]
    pub fn date(value: impl Into<String>) -> Self {
        Self::text(Field::Date, value)
    }

    /// Set the time
    #[must_use]
    pub fn time(value: impl Into<String>) -> Self {
        Self::text(Field::Time, value)
    }

    /// Set the party size
    #[must_use]
    pub const fn guests(count: i64) -> Self {
        Self {
            field: Field::Guests,
            value: FieldValue::Count(count),
        }
    }

    /// Set the occasion
    #[must_use]
    pub fn occasion(value: impl Into<String>) -> Self {
        Self::text(Field::Occasion, value)
    }

    /// Set the contact name
    #[must_use]
    pub fn name(value: impl Into<String>) -> Self {
        Self::text(Field::Name, value)
    }

    /// Set the contact email
    #[must_use]
    pub fn email(value: impl Into<String>) -> Self {
        Self::text(Field::Email, value)
    }

    /// Set the contact phone
    #[must_use]
    pub fn phone(value: impl Into<String>) -> Self {
        Self::text(Field::Phone, value)
    }

    /// The field being set
    #[must_use]
    pub const fn field(&self) -> Field {
        self.field
    }

    /// The value being assigned
    #[must_use]
    pub const fn value(&self) -> &FieldValue {
        &self.value
    }

    /// Split into the field and its value
    #[must_use]
    pub fn into_parts(self) -> (Field, FieldValue) {
        (self.field, self.value)
    }
}

/// The in-progress reservation record
///
/// Owned by the store and only changed through
/// [`DraftAction`](crate::draft::DraftAction)s.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingDraft {
    /// ISO date or empty
    pub date: String,
    /// Selected slot or empty
    pub time: String,
    /// Party size
    pub guests: i64,
    /// Free-form occasion
    pub occasion: String,
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
    /// Slots offered for `date`, in catalog order
    pub available_times: Vec<String>,
    /// Set once the gateway accepted the booking
    pub is_submitted: bool,
}

impl Default for BookingDraft {
    fn default() -> Self {
        Self {
            date: String::new(),
            time: String::new(),
            guests: 1,
            occasion: String::new(),
            name: String::new(),
            email: String::new(),
            phone: String::new(),
            available_times: BASE_TIMES.iter().map(ToString::to_string).collect(),
            is_submitted: false,
        }
    }
}

impl BookingDraft {
    /// Payload handed to the submission gateway
    #[must_use]
    pub fn to_request(&self) -> BookingRequest {
        BookingRequest {
            date: self.date.clone(),
            time: self.time.clone(),
            guests: self.guests,
            occasion: self.occasion.clone(),
            name: self.name.clone(),
            email: self.email.clone(),
            phone: self.phone.clone(),
        }
    }
}

/// What crosses the gateway boundary
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingRequest {
    /// ISO date
    pub date: String,
    /// Slot
    pub time: String,
    /// Party size
    pub guests: i64,
    /// Occasion, possibly empty
    pub occasion: String,
    /// Contact name
    pub name: String,
    /// Contact email
    pub email: String,
    /// Contact phone
    pub phone: String,
}

/// Occasions the form offers in its picker
///
/// The draft stores the occasion as free text; this catalog is what the
/// view lists.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Occasion {
    /// Birthday
    Birthday,
    /// Anniversary
    Anniversary,
    /// Date night
    DateNight,
    /// Business dinner
    Business,
    /// Celebration
    Celebration,
    /// Anything else
    Other,
}

impl Occasion {
    /// Catalog in display order
    pub const ALL: [Self; 6] = [
        Self::Birthday,
        Self::Anniversary,
        Self::DateNight,
        Self::Business,
        Self::Celebration,
        Self::Other,
    ];

    /// Value stored in the draft
    #[must_use]
    pub const fn value(self) -> &'static str {
        match self {
            Self::Birthday => "birthday",
            Self::Anniversary => "anniversary",
            Self::DateNight => "date-night",
            Self::Business => "business",
            Self::Celebration => "celebration",
            Self::Other => "other",
        }
    }

    /// Label shown to the guest
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Birthday => "Birthday",
            Self::Anniversary => "Anniversary",
            Self::DateNight => "Date Night",
            Self::Business => "Business Dinner",
            Self::Celebration => "Celebration",
            Self::Other => "Other",
        }
    }

    /// Look up a catalog entry by its stored value
    #[must_use]
    pub fn from_value(value: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|o| o.value() == value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_draft_matches_initial_form() {
        let draft = BookingDraft::default();
        assert!(draft.date.is_empty());
        assert!(draft.time.is_empty());
        assert_eq!(draft.guests, 1);
        assert_eq!(
            draft.available_times,
            vec!["17:00", "18:00", "19:00", "20:00", "21:00", "22:00"]
        );
        assert!(!draft.is_submitted);
    }

    #[test]
    fn field_update_rejects_mismatched_value() {
        let err = FieldUpdate::new(Field::Email, FieldValue::Count(3));
        assert!(matches!(
            err,
            Err(BookingError::FieldTypeMismatch { field: Field::Email })
        ));

        let err = FieldUpdate::new(Field::Guests, FieldValue::Text("4".into()));
        assert!(err.is_err());

        assert!(FieldUpdate::new(Field::Guests, FieldValue::Count(4)).is_ok());
    }

    #[test]
    fn from_input_parses_guests() {
        let update = FieldUpdate::from_input(Field::Guests, " 4 ");
        assert_eq!(update.ok(), Some(FieldUpdate::guests(4)));

        let err = FieldUpdate::from_input(Field::Guests, "four");
        assert!(matches!(err, Err(BookingError::InvalidGuestCount(ref raw)) if raw == "four"));

        let update = FieldUpdate::from_input(Field::Name, "  Ada ");
        assert_eq!(update.ok(), Some(FieldUpdate::name("  Ada ")));
    }

    #[test]
    fn field_names_round_trip() {
        for field in Field::ALL {
            assert_eq!(field.as_str().parse::<Field>().ok(), Some(field));
        }
        assert!("table".parse::<Field>().is_err());
    }

    #[test]
    fn request_carries_only_gateway_fields() -> Result<(), serde_json::Error> {
        let draft = BookingDraft {
            date: "2025-01-05".into(),
            time: "19:00".into(),
            guests: 4,
            name: "John Doe".into(),
            email: "john@example.com".into(),
            phone: "+1234567890".into(),
            ..BookingDraft::default()
        };

        let json = serde_json::to_value(draft.to_request())?;
        let keys: Vec<&str> = json
            .as_object()
            .map(|o| o.keys().map(String::as_str).collect())
            .unwrap_or_default();

        assert_eq!(keys.len(), 7);
        for key in ["date", "time", "guests", "occasion", "name", "email", "phone"] {
            assert!(keys.contains(&key), "missing {key}");
        }
        assert_eq!(json["guests"], 4);
        Ok(())
    }

    #[test]
    fn occasion_catalog_matches_picker() {
        let labels: Vec<&str> = Occasion::ALL.iter().map(|o| o.label()).collect();
        assert_eq!(
            labels,
            vec!["Birthday", "Anniversary", "Date Night", "Business Dinner", "Celebration", "Other"]
        );
        assert_eq!(Occasion::from_value("date-night"), Some(Occasion::DateNight));
        assert_eq!(Occasion::from_value("wedding"), None);
    }
}
