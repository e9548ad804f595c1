//! Error types for the booking crate.

use crate::types::Field;
use std::time::Duration;
use tablebook_runtime::StoreError;
use thiserror::Error;

/// Errors raised while turning view input into actions or driving the store
#[derive(Error, Debug)]
pub enum BookingError {
    /// Guests input was not an integer
    #[error("Guest count must be a whole number, got {0:?}")]
    InvalidGuestCount(String),

    /// A value of the wrong kind was supplied for a field
    #[error("Value does not fit field {field}")]
    FieldTypeMismatch {
        /// The field that was targeted
        field: Field,
    },

    /// Field name not recognised
    #[error("Unknown field {0:?}")]
    UnknownField(String),

    /// The store rejected or lost the action
    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Gateway result
pub type GatewayResult<T> = Result<T, GatewayError>;

/// Failures of the submission gateway
///
/// A gateway that answers but declines the booking is not an error; it
/// resolves to `Ok(false)`.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Network or protocol failure
    #[error("Transport failure: {0}")]
    Transport(String),

    /// No answer within the submission timeout
    #[error("No response within {0:?}")]
    Timeout(Duration),

    /// Gateway is not able to take bookings right now
    #[error("Booking service unavailable: {0}")]
    Unavailable(String),
}
