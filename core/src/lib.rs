//! # Tablebook Core
//!
//! The pieces every tablebook feature is built from.
//!
//! A feature owns a piece of state and accepts a closed set of actions. A
//! [`Reducer`](reducer::Reducer) decides, synchronously, how an action
//! changes the state and which asynchronous work should follow. That work
//! is returned as [`Effect`](effect::Effect) values; the runtime runs them
//! and hands whatever action they produce back to the reducer. External
//! services reach the reducer only through its environment.
//!
//! ## Example
//!
//! ```
//! use tablebook_core::{effect::Effect, reducer::Reducer, smallvec, SmallVec};
//!
//! #[derive(Debug, Default)]
//! struct Party {
//!     guests: u8,
//!     confirmed: bool,
//! }
//!
//! enum PartyAction {
//!     AddGuest,
//!     Confirm,
//!     Confirmed,
//! }
//!
//! struct PartyReducer;
//!
//! impl Reducer for PartyReducer {
//!     type State = Party;
//!     type Action = PartyAction;
//!     type Environment = ();
//!
//!     fn reduce(&self, party: &mut Party, action: PartyAction, _env: &()) -> SmallVec<[Effect<PartyAction>; 4]> {
//!         match action {
//!             PartyAction::AddGuest => party.guests += 1,
//!             PartyAction::Confirm => {
//!                 return smallvec![Effect::future(async { Some(PartyAction::Confirmed) })];
//!             },
//!             PartyAction::Confirmed => party.confirmed = true,
//!         }
//!         SmallVec::new()
//!     }
//! }
//!
//! let mut party = Party::default();
//! let effects = PartyReducer.reduce(&mut party, PartyAction::AddGuest, &());
//! assert_eq!(party.guests, 1);
//! assert!(effects.is_empty());
//! ```

pub use chrono::{DateTime, NaiveDate, Utc};
pub use smallvec::{smallvec, SmallVec};

/// The reducer abstraction
pub mod reducer {
    use super::effect::Effect;
    use smallvec::SmallVec;

    /// Decision logic of a feature
    ///
    /// `reduce` must not block or perform I/O. Anything slow is returned as
    /// an effect. A reducer that returns no effects leaves nothing running.
    pub trait Reducer {
        /// State owned by the feature
        type State;

        /// Everything the feature reacts to: intents and effect results
        type Action;

        /// Injected services
        type Environment;

        /// Apply `action` to `state` and describe the follow-up work
        ///
        /// Effects are collected in a `SmallVec`, so the common zero- or
        /// one-effect case does not allocate.
        fn reduce(
            &self,
            state: &mut Self::State,
            action: Self::Action,
            env: &Self::Environment,
        ) -> SmallVec<[Effect<Self::Action>; 4]>;
    }
}

/// Descriptions of follow-up work
pub mod effect {
    use std::future::Future;
    use std::pin::Pin;

    /// Boxed future an effect runs to completion
    pub type EffectFuture<Action> = Pin<Box<dyn Future<Output = Option<Action>> + Send>>;

    /// Work for the runtime to carry out after a reducer call
    pub enum Effect<Action> {
        /// Nothing to do
        None,

        /// Run a future; a `Some` result is reduced as the next action
        Future(EffectFuture<Action>),
    }

    impl<Action> Effect<Action> {
        /// Box `fut` into a [`Effect::Future`]
        #[must_use]
        pub fn future<F>(fut: F) -> Self
        where
            F: Future<Output = Option<Action>> + Send + 'static,
        {
            Self::Future(Box::pin(fut))
        }
    }

    // Futures have no useful Debug output
    impl<Action> std::fmt::Debug for Effect<Action> {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            match self {
                Self::None => f.write_str("Effect::None"),
                Self::Future(_) => f.write_str("Effect::Future(..)"),
            }
        }
    }
}

/// Services injected into reducers
pub mod environment {
    use chrono::{DateTime, NaiveDate, Utc};

    /// Source of the current time
    ///
    /// The booking form asks it for "today", the earliest date a guest may
    /// reserve. Tests substitute a fixed clock.
    pub trait Clock: Send + Sync {
        /// Current instant
        fn now(&self) -> DateTime<Utc>;

        /// Current calendar date in UTC
        fn today(&self) -> NaiveDate {
            self.now().date_naive()
        }
    }

    /// Wall clock
    #[derive(Debug, Clone, Copy, Default)]
    pub struct SystemClock;

    impl Clock for SystemClock {
        fn now(&self) -> DateTime<Utc> {
            Utc::now()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::effect::Effect;
    use super::environment::{Clock, SystemClock};

    #[test]
    fn system_clock_today_follows_now() {
        let clock = SystemClock;
        let before = clock.now().date_naive();
        let today = clock.today();
        // Only a midnight rollover between the two reads separates them
        assert!(today == before || before.succ_opt() == Some(today));
    }

    #[test]
    fn effect_debug_skips_future_body() {
        let effect: Effect<u8> = Effect::future(async { Some(1) });
        assert_eq!(format!("{effect:?}"), "Effect::Future(..)");
        assert_eq!(format!("{:?}", Effect::<u8>::None), "Effect::None");
    }
}
