//! Given-When-Then harness for reducers

#![allow(clippy::module_name_repetitions)] // ReducerTest is the natural name

use tablebook_core::{effect::Effect, reducer::Reducer};

type StateCheck<S> = Box<dyn FnOnce(&S)>;
type EffectCheck<A> = Box<dyn FnOnce(&[Effect<A>])>;

/// Runs a reducer over a starting state and checks what comes out
///
/// Several `when_action` calls are reduced in order. State checks see the
/// final state; effect checks see the effects of the last action only.
///
/// ```ignore
/// use tablebook_testing::{ReducerTest, assertions};
///
/// ReducerTest::new(BookingReducer::new())
///     .with_env(test_environment())
///     .given_state(BookingState::default())
///     .when_action(BookingAction::ChangeDate { date: "2025-01-05".into() })
///     .then_state(|state| assert!(state.draft.time.is_empty()))
///     .then_effects(assertions::assert_no_effects)
///     .run();
/// ```
pub struct ReducerTest<R: Reducer> {
    reducer: R,
    environment: Option<R::Environment>,
    state: Option<R::State>,
    actions: Vec<R::Action>,
    state_checks: Vec<StateCheck<R::State>>,
    effect_checks: Vec<EffectCheck<R::Action>>,
}

impl<R: Reducer> ReducerTest<R> {
    /// Start a test for `reducer`
    #[must_use]
    pub const fn new(reducer: R) -> Self {
        Self {
            reducer,
            environment: None,
            state: None,
            actions: Vec::new(),
            state_checks: Vec::new(),
            effect_checks: Vec::new(),
        }
    }

    /// Environment passed to every reduce call
    #[must_use]
    pub fn with_env(mut self, env: R::Environment) -> Self {
        self.environment = Some(env);
        self
    }

    /// Starting state (Given)
    #[must_use]
    pub fn given_state(mut self, state: R::State) -> Self {
        self.state = Some(state);
        self
    }

    /// Queue an action (When)
    #[must_use]
    pub fn when_action(mut self, action: R::Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Check the final state (Then)
    #[must_use]
    pub fn then_state<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&R::State) + 'static,
    {
        self.state_checks.push(Box::new(check));
        self
    }

    /// Check the effects of the last action (Then)
    #[must_use]
    pub fn then_effects<F>(mut self, check: F) -> Self
    where
        F: FnOnce(&[Effect<R::Action>]) + 'static,
    {
        self.effect_checks.push(Box::new(check));
        self
    }

    /// Reduce every queued action and run the checks
    ///
    /// # Panics
    ///
    /// Panics if the state, the environment or any action is missing, or if
    /// a check fails.
    #[allow(clippy::expect_used)] // Test harness
    pub fn run(self) {
        let mut state = self.state.expect("given_state() was not called");
        let env = self.environment.expect("with_env() was not called");
        assert!(!self.actions.is_empty(), "when_action() was not called");

        let mut effects = Vec::new();
        for action in self.actions {
            effects = self.reducer.reduce(&mut state, action, &env).into_vec();
        }

        for check in self.state_checks {
            check(&state);
        }
        for check in self.effect_checks {
            check(effects.as_slice());
        }
    }
}

/// Effect checks for [`ReducerTest::then_effects`]
pub mod assertions {
    use tablebook_core::effect::Effect;

    /// The reducer asked for no follow-up work
    ///
    /// # Panics
    ///
    /// Panics if any effect other than `Effect::None` was returned.
    pub fn assert_no_effects<A>(effects: &[Effect<A>]) {
        assert!(
            effects.iter().all(|effect| matches!(effect, Effect::None)),
            "expected no effects, found {effects:?}"
        );
    }

    /// The reducer returned exactly one future
    ///
    /// # Panics
    ///
    /// Panics otherwise.
    pub fn assert_single_future_effect<A>(effects: &[Effect<A>]) {
        assert!(
            matches!(effects, [Effect::Future(_)]),
            "expected a single future effect, found {effects:?}"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tablebook_core::{SmallVec, smallvec};

    enum Step {
        Forward,
        Back,
        Ping,
    }

    struct Walker;

    impl Reducer for Walker {
        type State = i32;
        type Action = Step;
        type Environment = ();

        fn reduce(&self, position: &mut i32, step: Step, (): &()) -> SmallVec<[Effect<Step>; 4]> {
            match step {
                Step::Forward => *position += 1,
                Step::Back => *position -= 1,
                Step::Ping => return smallvec![Effect::future(async { Some(Step::Forward) })],
            }
            smallvec![Effect::None]
        }
    }

    #[test]
    fn actions_are_reduced_in_order() {
        ReducerTest::new(Walker)
            .with_env(())
            .given_state(0)
            .when_action(Step::Forward)
            .when_action(Step::Forward)
            .when_action(Step::Back)
            .then_state(|position| assert_eq!(*position, 1))
            .then_effects(assertions::assert_no_effects)
            .run();
    }

    #[test]
    fn effects_come_from_the_last_action() {
        ReducerTest::new(Walker)
            .with_env(())
            .given_state(3)
            .when_action(Step::Back)
            .when_action(Step::Ping)
            .then_state(|position| assert_eq!(*position, 2))
            .then_effects(assertions::assert_single_future_effect)
            .run();
    }

    #[test]
    #[should_panic(expected = "expected no effects")]
    fn future_is_not_mistaken_for_no_effects() {
        assertions::assert_no_effects(&[Effect::future(async { Some(Step::Back) })]);
    }

    #[test]
    #[should_panic(expected = "when_action() was not called")]
    fn run_without_action_fails() {
        ReducerTest::new(Walker).with_env(()).given_state(0).run();
    }
}
