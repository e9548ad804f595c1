//! Reducer for the booking form.
//!
//! Intents from the view arrive as [`BookingAction`]s. Everything except the
//! gateway call is decided here synchronously; the gateway call is returned
//! as an [`Effect::Future`] whose result comes back as
//! [`BookingAction::SubmissionSettled`].

use crate::draft::{change_date, DraftAction};
use crate::error::GatewayError;
use crate::gateway::SubmissionGateway;
use crate::types::{BookingDraft, Field, FieldUpdate, FieldValue};
use crate::validation::{validate_as_of, ErrorSet};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tablebook_core::{effect::Effect, environment::Clock, reducer::Reducer, smallvec, SmallVec};

/// Default upper bound on a gateway round trip
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Prefix of every surfaced submission failure
pub const SUBMISSION_FAILED_PREFIX: &str = "Booking could not be completed";

/// Identifies one submission attempt
///
/// A settlement is only applied when it carries the id of the submission
/// currently in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize)]
pub struct SubmissionId(pub u64);

/// Everything the view renders
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BookingState {
    /// The reservation being edited
    pub draft: BookingDraft,
    /// Result of the last validation pass
    pub errors: ErrorSet,
    /// A submission is in flight
    pub is_loading: bool,
    /// Id of the submission in flight; set exactly while `is_loading`
    pub pending_submission: Option<SubmissionId>,
    /// Message for the last failed submission
    pub submission_error: Option<String>,
}

impl BookingState {
    /// Whether the submit control should be enabled
    #[must_use]
    pub const fn can_submit(&self) -> bool {
        !self.is_loading && !self.draft.is_submitted
    }

    /// Whether the confirmation view should be shown
    #[must_use]
    pub const fn is_confirmed(&self) -> bool {
        self.draft.is_submitted
    }
}

/// How a submission ended
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SubmissionOutcome {
    /// The gateway accepted the booking
    Confirmed,
    /// The gateway answered but declined
    Rejected,
    /// The gateway failed or timed out
    Failed(GatewayError),
}

impl SubmissionOutcome {
    /// Label used for logs and metrics
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Confirmed => "confirmed",
            Self::Rejected => "rejected",
            Self::Failed(GatewayError::Timeout(_)) => "timeout",
            Self::Failed(_) => "failed",
        }
    }

    fn failure_message(&self) -> Option<String> {
        match self {
            Self::Confirmed => None,
            Self::Rejected => Some(format!(
                "{SUBMISSION_FAILED_PREFIX}: the reservation was declined"
            )),
            Self::Failed(error) => Some(format!("{SUBMISSION_FAILED_PREFIX}: {error}")),
        }
    }
}

/// Actions accepted by [`BookingReducer`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BookingAction {
    /// A field changed in the view; date changes go through [`change_date`]
    UpdateField(FieldUpdate),
    /// The date control changed
    ChangeDate {
        /// New ISO date, possibly empty
        date: String,
    },
    /// The guest pressed submit
    Submit {
        /// Id the settlement will carry
        id: SubmissionId,
    },
    /// Start over; ignored while a submission is in flight
    Reset,
    /// The gateway call finished
    SubmissionSettled {
        /// The submission this settles
        id: SubmissionId,
        /// What happened
        outcome: SubmissionOutcome,
    },
}

/// Dependencies of [`BookingReducer`]
#[derive(Clone)]
pub struct BookingEnvironment {
    /// Source of "today" for the minimum date
    pub clock: Arc<dyn Clock>,
    /// Where bookings are sent
    pub gateway: Arc<dyn SubmissionGateway>,
    /// Upper bound on one gateway call
    pub submission_timeout: Duration,
}

impl BookingEnvironment {
    /// Creates an environment with the default submission timeout
    #[must_use]
    pub fn new(clock: Arc<dyn Clock>, gateway: Arc<dyn SubmissionGateway>) -> Self {
        Self {
            clock,
            gateway,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }

    /// Override the submission timeout
    #[must_use]
    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }
}

/// Reducer for the booking form
#[derive(Clone, Debug, Default)]
pub struct BookingReducer;

impl BookingReducer {
    /// Creates a new `BookingReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn apply_draft(state: &mut BookingState, action: DraftAction) {
        state.draft = std::mem::take(&mut state.draft).apply(action);
    }

    fn update_field(state: &mut BookingState, update: FieldUpdate) {
        match update.into_parts() {
            (Field::Date, FieldValue::Text(date)) => Self::change_date(state, &date),
            (field, value) => match FieldUpdate::new(field, value) {
                Ok(update) => Self::apply_draft(state, DraftAction::UpdateField(update)),
                Err(error) => tracing::warn!(%error, "Ignoring field update"),
            },
        }
    }

    fn change_date(state: &mut BookingState, date: &str) {
        state.draft = change_date(std::mem::take(&mut state.draft), date);
        tracing::debug!(
            date,
            available = ?state.draft.available_times,
            "Date changed"
        );
    }

    fn submit(
        state: &mut BookingState,
        id: SubmissionId,
        env: &BookingEnvironment,
    ) -> Option<Effect<BookingAction>> {
        if state.is_loading {
            tracing::warn!("Submit ignored: a submission is already in flight");
            return None;
        }
        if state.draft.is_submitted {
            tracing::warn!("Submit ignored: booking already confirmed");
            return None;
        }

        state.submission_error = None;
        state.errors = validate_as_of(&state.draft, env.clock.today());

        if !state.errors.is_empty() {
            tracing::debug!(errors = state.errors.len(), "Submit blocked by validation");
            metrics::counter!("booking.submissions", "outcome" => "invalid").increment(1);
            return None;
        }

        state.is_loading = true;
        state.pending_submission = Some(id);

        let request = state.draft.to_request();
        let gateway = Arc::clone(&env.gateway);
        let timeout = env.submission_timeout;

        tracing::info!(id = id.0, date = %request.date, time = %request.time, guests = request.guests, "Submitting booking");

        Some(Effect::future(async move {
            let outcome = match tokio::time::timeout(timeout, gateway.submit(request)).await {
                Ok(Ok(true)) => SubmissionOutcome::Confirmed,
                Ok(Ok(false)) => SubmissionOutcome::Rejected,
                Ok(Err(error)) => SubmissionOutcome::Failed(error),
                Err(_) => SubmissionOutcome::Failed(GatewayError::Timeout(timeout)),
            };
            Some(BookingAction::SubmissionSettled { id, outcome })
        }))
    }

    fn settle(state: &mut BookingState, id: SubmissionId, outcome: &SubmissionOutcome) {
        if state.pending_submission != Some(id) {
            tracing::warn!(
                id = id.0,
                pending = ?state.pending_submission,
                outcome = outcome.label(),
                "Dropping settlement for a submission that is not in flight"
            );
            return;
        }

        state.is_loading = false;
        state.pending_submission = None;
        metrics::counter!("booking.submissions", "outcome" => outcome.label()).increment(1);

        match outcome.failure_message() {
            None => {
                Self::apply_draft(state, DraftAction::SubmitBooking);
                tracing::info!("Booking confirmed");
            },
            Some(message) => {
                tracing::warn!(outcome = outcome.label(), %message, "Booking failed");
                state.submission_error = Some(message);
            },
        }
    }
}

impl Reducer for BookingReducer {
    type State = BookingState;
    type Action = BookingAction;
    type Environment = BookingEnvironment;

    fn reduce(
        &self,
        state: &mut Self::State,
        action: Self::Action,
        env: &Self::Environment,
    ) -> SmallVec<[Effect<Self::Action>; 4]> {
        match action {
            BookingAction::UpdateField(update) => Self::update_field(state, update),
            BookingAction::ChangeDate { date } => Self::change_date(state, &date),
            BookingAction::Submit { id } => {
                if let Some(effect) = Self::submit(state, id, env) {
                    return smallvec![effect];
                }
            },
            BookingAction::Reset if state.is_loading => {
                tracing::warn!("Reset ignored: a submission is in flight");
            },
            BookingAction::Reset => {
                *state = BookingState::default();
                tracing::debug!("Form reset");
            },
            BookingAction::SubmissionSettled { id, outcome } => Self::settle(state, id, &outcome),
        }

        SmallVec::new()
    }
}
