//! Restaurant reservation form core.
//!
//! The form is a reducer over [`BookingState`]: the view sends intents
//! (field updates, date changes, submit, reset) and renders the draft, the
//! validation errors and the loading flag. Submitting calls a
//! [`SubmissionGateway`] through an effect; the result comes back as an
//! action.
//!
//! - [`availability`]: slots offered for a date
//! - [`validation`]: the form rules and [`ErrorSet`]
//! - [`draft`]: the draft state machine and the date-change choreography
//! - [`reducer`]: intents, submission and settlement
//! - [`gateway`]: simulated, HTTP and scripted gateways
//! - [`session`]: the facade a view talks to
//!
//! # Quick Start
//!
//! ```no_run
//! use std::sync::Arc;
//! use tablebook::{BookingEnvironment, BookingSession, FieldUpdate, SimulatedGateway, SubmitResult};
//! use tablebook_core::environment::SystemClock;
//!
//! # async fn example() -> Result<(), tablebook::BookingError> {
//! let session = BookingSession::new(BookingEnvironment::new(
//!     Arc::new(SystemClock),
//!     Arc::new(SimulatedGateway::default()),
//! ));
//!
//! session.change_date("2030-06-14").await?;
//! session.update_field(FieldUpdate::time("19:00")).await?;
//! session.update_field(FieldUpdate::name("Ada Lovelace")).await?;
//! session.update_field(FieldUpdate::email("ada@example.com")).await?;
//! session.update_field(FieldUpdate::phone("+44 20 7946 0000")).await?;
//!
//! if let SubmitResult::Invalid(errors) = session.submit().await? {
//!     for (field, message) in errors.iter() {
//!         println!("{field}: {message}");
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod availability;
pub mod config;
pub mod draft;
pub mod error;
pub mod gateway;
pub mod reducer;
pub mod session;
pub mod types;
pub mod validation;

pub use availability::{compute_available_times, BASE_TIMES, FALLBACK_TIME};
pub use config::BookingConfig;
pub use draft::{change_date, DraftAction};
pub use error::{BookingError, GatewayError, GatewayResult};
pub use gateway::{HttpGateway, ScriptedGateway, SimulatedGateway, SubmissionGateway};
pub use reducer::{
    BookingAction, BookingEnvironment, BookingReducer, BookingState, SubmissionId, SubmissionOutcome,
};
pub use session::{BookingSession, SubmitResult};
pub use types::{BookingDraft, BookingRequest, Field, FieldUpdate, FieldValue, Occasion};
pub use validation::{validate, validate_as_of, ErrorSet};
