//! View-facing facade over the booking store.

use crate::config::BookingConfig;
use crate::error::BookingError;
use crate::reducer::{
    BookingAction, BookingEnvironment, BookingReducer, BookingState, SubmissionId, SubmissionOutcome,
};
use crate::types::{Field, FieldUpdate, Occasion};
use crate::validation::ErrorSet;
use chrono::NaiveDate;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tablebook_core::environment::Clock;
use tablebook_runtime::{Store, StoreConfig};
use tokio::sync::broadcast::error::TryRecvError;

type BookingStore = Store<BookingReducer>;

/// What a submit intent led to
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmitResult {
    /// The gateway was called and answered (or failed)
    Settled(SubmissionOutcome),
    /// Validation failed; the gateway was not called
    Invalid(ErrorSet),
    /// A submission was already in flight, or the booking is already confirmed
    Ignored,
}

/// One guest's booking session
///
/// Owns a store running [`BookingReducer`]. Every method sends one intent
/// and returns once the store has reduced it.
#[derive(Clone)]
pub struct BookingSession {
    store: BookingStore,
    clock: Arc<dyn Clock>,
    shutdown_timeout: Duration,
    next_submission: Arc<AtomicU64>,
}

impl BookingSession {
    /// Start a session with the default store settings
    #[must_use]
    pub fn new(environment: BookingEnvironment) -> Self {
        Self::with_store_config(environment, &StoreConfig::default())
    }

    /// Start a session with explicit store settings
    #[must_use]
    pub fn with_store_config(environment: BookingEnvironment, config: &StoreConfig) -> Self {
        let clock = Arc::clone(&environment.clock);
        Self {
            store: Store::with_config(BookingState::default(), BookingReducer::new(), environment, config),
            clock,
            shutdown_timeout: config.default_shutdown_timeout,
            next_submission: Arc::new(AtomicU64::new(1)),
        }
    }

    /// Start a session from loaded configuration
    #[must_use]
    pub fn from_config(config: &BookingConfig, clock: Arc<dyn Clock>) -> Self {
        let environment = BookingEnvironment::new(clock, config.gateway())
            .with_submission_timeout(config.submit_timeout());
        Self::with_store_config(environment, &config.store_config())
    }

    async fn dispatch(&self, action: BookingAction) -> Result<(), BookingError> {
        self.store.send(action).await?.wait().await;
        Ok(())
    }

    /// Apply a typed field update
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the session is shutting down.
    pub async fn update_field(&self, update: FieldUpdate) -> Result<(), BookingError> {
        self.dispatch(BookingAction::UpdateField(update)).await
    }

    /// Apply raw text from a form control
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::InvalidGuestCount`] for non-numeric guests
    /// input, or [`BookingError::Store`] if the session is shutting down.
    pub async fn set_field(&self, field: Field, raw: &str) -> Result<(), BookingError> {
        self.update_field(FieldUpdate::from_input(field, raw)?).await
    }

    /// Move the reservation to another date
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the session is shutting down.
    pub async fn change_date(&self, date: impl Into<String>) -> Result<(), BookingError> {
        self.dispatch(BookingAction::ChangeDate { date: date.into() }).await
    }

    /// Validate and, if valid, submit the booking
    ///
    /// Waits until the gateway call has settled and its outcome is reflected
    /// in the state. Only the settlement of this call's own submission is
    /// reported; another one in flight makes this call `Ignored`.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the session is shutting down.
    pub async fn submit(&self) -> Result<SubmitResult, BookingError> {
        let id = SubmissionId(self.next_submission.fetch_add(1, Ordering::Relaxed));
        let mut feedback = self.store.subscribe_actions();
        self.dispatch(BookingAction::Submit { id }).await?;

        loop {
            match feedback.try_recv() {
                Ok(BookingAction::SubmissionSettled { id: settled, outcome }) if settled == id => {
                    return Ok(SubmitResult::Settled(outcome));
                },
                Ok(_) | Err(TryRecvError::Lagged(_)) => {},
                Err(TryRecvError::Empty | TryRecvError::Closed) => break,
            }
        }

        let errors = self.store.state(|s| s.errors.clone()).await;
        if errors.is_empty() {
            Ok(SubmitResult::Ignored)
        } else {
            Ok(SubmitResult::Invalid(errors))
        }
    }

    /// Start over with an empty draft
    ///
    /// Has no effect while a submission is in flight.
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the session is shutting down.
    pub async fn reset(&self) -> Result<(), BookingError> {
        self.dispatch(BookingAction::Reset).await
    }

    /// Copy of the current state
    pub async fn snapshot(&self) -> BookingState {
        self.store.state(Clone::clone).await
    }

    /// Read part of the current state
    pub async fn read<F, T>(&self, f: F) -> T
    where
        F: FnOnce(&BookingState) -> T,
    {
        self.store.state(f).await
    }

    /// Earliest date the date control offers
    #[must_use]
    pub fn min_date(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Occasions for the picker
    #[must_use]
    pub const fn occasions(&self) -> &'static [Occasion] {
        &Occasion::ALL
    }

    /// Whether [`shutdown`](Self::shutdown) has been called
    #[must_use]
    pub fn is_shutting_down(&self) -> bool {
        self.store.is_shutting_down()
    }

    /// Stop accepting intents and wait for an in-flight submission
    ///
    /// # Errors
    ///
    /// Returns [`BookingError::Store`] if the submission did not settle in time.
    pub async fn shutdown(&self) -> Result<(), BookingError> {
        self.store.shutdown(self.shutdown_timeout).await?;
        Ok(())
    }
}
