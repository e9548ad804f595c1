//! # Tablebook Runtime
//!
//! The [`Store`] owns a reducer's state, serialises reducer calls and runs
//! the effects they return on the tokio runtime. An action produced by an
//! effect is broadcast to observers and then reduced like any other action.
//!
//! ```ignore
//! use tablebook_runtime::Store;
//!
//! let store = Store::new(BookingState::default(), BookingReducer::new(), environment);
//!
//! let handle = store.send(BookingAction::Submit { id }).await?;
//! handle.wait().await;
//!
//! let loading = store.state(|s| s.is_loading).await;
//! ```

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tokio::sync::watch;

/// Error types for the Store runtime
pub mod error {
    use thiserror::Error;

    /// Errors that can occur during Store operations
    #[derive(Error, Debug)]
    pub enum StoreError {
        /// `send()` was called after shutdown started
        #[error("Store is shutting down")]
        ShutdownInProgress,

        /// Shutdown gave up with effects still running
        #[error("Shutdown timed out with {0} effects still running")]
        ShutdownTimeout(usize),
    }
}

pub use error::StoreError;

/// Store tuning
///
/// ```
/// use std::time::Duration;
/// use tablebook_runtime::StoreConfig;
///
/// let config = StoreConfig::new(64, Duration::from_secs(2));
/// assert_eq!(config.broadcast_capacity, 64);
/// ```
#[derive(Debug, Clone)]
pub struct StoreConfig {
    /// Number of feedback actions buffered for slow observers
    pub broadcast_capacity: usize,
    /// How long a session's shutdown waits for running effects
    pub default_shutdown_timeout: Duration,
}

impl StoreConfig {
    /// Create a configuration
    #[must_use]
    pub const fn new(broadcast_capacity: usize, default_shutdown_timeout: Duration) -> Self {
        Self {
            broadcast_capacity,
            default_shutdown_timeout,
        }
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self::new(16, Duration::from_secs(30))
    }
}

/// Count of running effects that can be awaited until it reaches zero
struct EffectCounter {
    running: AtomicUsize,
    idle: watch::Sender<()>,
}

impl EffectCounter {
    fn new() -> Arc<Self> {
        let (idle, _) = watch::channel(());
        Arc::new(Self {
            running: AtomicUsize::new(0),
            idle,
        })
    }

    fn running(&self) -> usize {
        self.running.load(Ordering::SeqCst)
    }

    /// Register one running effect until the returned guard drops
    fn enter(self: &Arc<Self>) -> RunningEffect {
        self.running.fetch_add(1, Ordering::SeqCst);
        RunningEffect(Arc::clone(self))
    }

    async fn wait_idle(&self) {
        // Subscribe before reading the count so a zero signal is not missed
        let mut idle = self.idle.subscribe();
        while self.running() > 0 {
            if idle.changed().await.is_err() {
                break;
            }
        }
    }
}

/// Released on drop, including when the effect panics
struct RunningEffect(Arc<EffectCounter>);

impl Drop for RunningEffect {
    fn drop(&mut self) {
        if self.0.running.fetch_sub(1, Ordering::SeqCst) == 1 {
            self.0.idle.send_replace(());
        }
    }
}

/// Completion of the effects started by one [`Store::send`]
///
/// Feedback actions count as part of the effect that produced them, so
/// once [`wait`](Self::wait) returns their reduction is visible in state.
#[derive(Clone)]
pub struct EffectHandle {
    counter: Arc<EffectCounter>,
}

impl EffectHandle {
    /// Number of effects still running
    #[must_use]
    pub fn pending(&self) -> usize {
        self.counter.running()
    }

    /// Wait until every tracked effect has finished
    pub async fn wait(&self) {
        self.counter.wait_idle().await;
    }
}

impl std::fmt::Debug for EffectHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EffectHandle")
            .field("pending", &self.pending())
            .finish()
    }
}

/// Store runtime for coordinating reducer execution and effect handling.
pub mod store {
    use super::{Arc, Duration, EffectCounter, EffectHandle, StoreConfig, StoreError};
    use std::sync::atomic::{AtomicBool, Ordering};
    use tablebook_core::{SmallVec, effect::Effect, reducer::Reducer};
    use tokio::sync::{RwLock, broadcast};

    struct Shared<R: Reducer> {
        state: RwLock<R::State>,
        reducer: R,
        environment: R::Environment,
        shutting_down: AtomicBool,
        in_flight: Arc<EffectCounter>,
        feedback: broadcast::Sender<R::Action>,
    }

    /// Owner of a reducer's state
    ///
    /// Clones share the same state, so a session and the tasks running its
    /// effects all see one form.
    pub struct Store<R: Reducer> {
        shared: Arc<Shared<R>>,
    }

    impl<R> Store<R>
    where
        R: Reducer + Send + Sync + 'static,
        R::State: Send + Sync + 'static,
        R::Action: Clone + Send + 'static,
        R::Environment: Send + Sync + 'static,
    {
        /// Create a store with [`StoreConfig::default()`]
        #[must_use]
        pub fn new(initial_state: R::State, reducer: R, environment: R::Environment) -> Self {
            Self::with_config(initial_state, reducer, environment, &StoreConfig::default())
        }

        /// Create a store with custom configuration
        #[must_use]
        pub fn with_config(
            initial_state: R::State,
            reducer: R,
            environment: R::Environment,
            config: &StoreConfig,
        ) -> Self {
            let (feedback, _) = broadcast::channel(config.broadcast_capacity.max(1));
            Self {
                shared: Arc::new(Shared {
                    state: RwLock::new(initial_state),
                    reducer,
                    environment,
                    shutting_down: AtomicBool::new(false),
                    in_flight: EffectCounter::new(),
                    feedback,
                }),
            }
        }

        /// Stop accepting actions and wait for running effects
        ///
        /// Effects already running still have their feedback reduced, so a
        /// submission in flight settles before this returns.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownTimeout`] if effects are still
        /// running when `timeout` expires.
        pub async fn shutdown(&self, timeout: Duration) -> Result<(), StoreError> {
            tracing::info!("Initiating graceful shutdown");
            metrics::counter!("store.shutdown.initiated").increment(1);

            self.shared.shutting_down.store(true, Ordering::Release);

            if tokio::time::timeout(timeout, self.shared.in_flight.wait_idle())
                .await
                .is_ok()
            {
                tracing::info!("All effects completed, shutdown successful");
                metrics::counter!("store.shutdown.completed").increment(1);
                Ok(())
            } else {
                let running = self.shared.in_flight.running();
                tracing::error!(running, "Shutdown timed out");
                metrics::counter!("store.shutdown.timeout").increment(1);
                Err(StoreError::ShutdownTimeout(running))
            }
        }

        /// Whether [`shutdown`](Self::shutdown) has been called
        #[must_use]
        pub fn is_shutting_down(&self) -> bool {
            self.shared.shutting_down.load(Ordering::Acquire)
        }

        /// Reduce an action and start its effects
        ///
        /// Returns once the effects are spawned; the [`EffectHandle`] waits
        /// for them.
        ///
        /// # Errors
        ///
        /// Returns [`StoreError::ShutdownInProgress`] once shutdown started.
        #[tracing::instrument(skip(self, action), name = "store_send")]
        pub async fn send(&self, action: R::Action) -> Result<EffectHandle, StoreError> {
            if self.is_shutting_down() {
                tracing::warn!("Rejected action: store is shutting down");
                metrics::counter!("store.shutdown.rejected_actions").increment(1);
                return Err(StoreError::ShutdownInProgress);
            }

            metrics::counter!("store.commands.total").increment(1);
            let counter = EffectCounter::new();
            self.dispatch(action, &counter).await;
            Ok(EffectHandle { counter })
        }

        /// Subscribe to every action produced by an effect
        #[must_use]
        pub fn subscribe_actions(&self) -> broadcast::Receiver<R::Action> {
            self.shared.feedback.subscribe()
        }

        /// Read state through a closure
        pub async fn state<F, T>(&self, f: F) -> T
        where
            F: FnOnce(&R::State) -> T,
        {
            let state = self.shared.state.read().await;
            f(&*state)
        }

        /// Run the reducer without the shutdown check
        async fn dispatch(&self, action: R::Action, counter: &Arc<EffectCounter>) {
            let effects: SmallVec<[Effect<R::Action>; 4]> = {
                let mut state = self.shared.state.write().await;
                let start = std::time::Instant::now();
                let effects = self
                    .shared
                    .reducer
                    .reduce(&mut *state, action, &self.shared.environment);
                metrics::histogram!("store.reducer.duration_seconds")
                    .record(start.elapsed().as_secs_f64());
                effects
            };
            tracing::trace!(effects = effects.len(), "Reducer completed");
            self.run_effects(effects, counter);
        }

        // Sync so the spawned futures do not contain `dispatch` recursively
        fn run_effects(&self, effects: SmallVec<[Effect<R::Action>; 4]>, counter: &Arc<EffectCounter>) {
            for effect in effects {
                let Effect::Future(fut) = effect else {
                    continue;
                };
                metrics::counter!("store.effects.executed").increment(1);

                let running = (counter.enter(), self.shared.in_flight.enter());
                let store = self.clone();
                let counter = Arc::clone(counter);

                tokio::spawn(async move {
                    let _running = running;
                    if let Some(action) = fut.await {
                        // Feedback of a running effect is reduced even during shutdown
                        let _ = store.shared.feedback.send(action.clone());
                        store.dispatch(action, &counter).await;
                    }
                });
            }
        }
    }

    impl<R: Reducer> Clone for Store<R> {
        fn clone(&self) -> Self {
            Self {
                shared: Arc::clone(&self.shared),
            }
        }
    }
}

pub use store::Store;

#[cfg(test)]
mod tests {
    use super::*;
    use tablebook_core::{SmallVec, effect::Effect, reducer::Reducer, smallvec};
    use tokio::sync::Notify;

    #[derive(Debug, Clone, PartialEq)]
    enum TallyAction {
        Add(i32),
        AddLater(i32),
        AddWhenReleased(i32),
        Explode,
    }

    struct TallyEnv {
        release: Arc<Notify>,
    }

    struct TallyReducer;

    impl Reducer for TallyReducer {
        type State = i32;
        type Action = TallyAction;
        type Environment = TallyEnv;

        fn reduce(&self, tally: &mut i32, action: TallyAction, env: &TallyEnv) -> SmallVec<[Effect<TallyAction>; 4]> {
            match action {
                TallyAction::Add(n) => {
                    *tally += n;
                    SmallVec::new()
                },
                TallyAction::AddLater(n) => smallvec![Effect::future(async move { Some(TallyAction::Add(n)) })],
                TallyAction::AddWhenReleased(n) => {
                    let release = Arc::clone(&env.release);
                    smallvec![Effect::future(async move {
                        release.notified().await;
                        Some(TallyAction::Add(n))
                    })]
                },
                #[allow(clippy::panic)] // The store must survive a panicking effect
                TallyAction::Explode => smallvec![Effect::future(async { panic!("effect failed") })],
            }
        }
    }

    fn tally_store() -> (Store<TallyReducer>, Arc<Notify>) {
        let release = Arc::new(Notify::new());
        let store = Store::new(
            0,
            TallyReducer,
            TallyEnv {
                release: Arc::clone(&release),
            },
        );
        (store, release)
    }

    #[tokio::test]
    async fn send_reduces_in_order() -> Result<(), StoreError> {
        let (store, _) = tally_store();

        store.send(TallyAction::Add(2)).await?;
        store.send(TallyAction::Add(-5)).await?;

        assert_eq!(store.state(|t| *t).await, -3);
        Ok(())
    }

    #[tokio::test]
    async fn handle_waits_for_feedback_reduction() -> Result<(), StoreError> {
        let (store, _) = tally_store();

        let handle = store.send(TallyAction::AddLater(4)).await?;
        handle.wait().await;

        assert_eq!(handle.pending(), 0);
        assert_eq!(store.state(|t| *t).await, 4);
        Ok(())
    }

    #[tokio::test]
    async fn handle_without_effects_is_already_idle() -> Result<(), StoreError> {
        let (store, _) = tally_store();
        let handle = store.send(TallyAction::Add(1)).await?;
        assert_eq!(handle.pending(), 0);
        handle.wait().await;
        Ok(())
    }

    #[tokio::test]
    async fn observers_see_only_feedback() -> Result<(), StoreError> {
        let (store, _) = tally_store();
        let mut observed = store.subscribe_actions();

        store.send(TallyAction::Add(1)).await?;
        store.send(TallyAction::AddLater(2)).await?.wait().await;

        assert_eq!(observed.try_recv().ok(), Some(TallyAction::Add(2)));
        assert!(observed.try_recv().is_err());
        Ok(())
    }

    #[tokio::test]
    async fn panicking_effect_releases_its_handle() -> Result<(), StoreError> {
        let (store, _) = tally_store();

        store.send(TallyAction::Explode).await?.wait().await;

        store.send(TallyAction::Add(1)).await?;
        assert_eq!(store.state(|t| *t).await, 1);
        Ok(())
    }

    #[tokio::test]
    async fn clones_share_state() -> Result<(), StoreError> {
        let (store, _) = tally_store();
        let other = store.clone();

        store.send(TallyAction::Add(7)).await?;
        assert_eq!(other.state(|t| *t).await, 7);
        Ok(())
    }

    mod shutdown {
        use super::*;

        #[tokio::test]
        async fn idle_store_shuts_down_at_once() {
            let (store, _) = tally_store();
            assert!(store.shutdown(Duration::from_secs(1)).await.is_ok());
            assert!(store.is_shutting_down());
        }

        #[tokio::test]
        async fn new_actions_are_rejected() -> Result<(), StoreError> {
            let (store, _) = tally_store();
            store.shutdown(Duration::from_secs(1)).await?;

            let result = store.send(TallyAction::Add(1)).await;
            assert!(matches!(result, Err(StoreError::ShutdownInProgress)));
            Ok(())
        }

        #[tokio::test]
        async fn running_effect_feedback_is_still_reduced() -> Result<(), StoreError> {
            let (store, release) = tally_store();
            store.send(TallyAction::AddWhenReleased(5)).await?;

            let closing = {
                let store = store.clone();
                tokio::spawn(async move { store.shutdown(Duration::from_secs(5)).await })
            };
            while !store.is_shutting_down() {
                tokio::task::yield_now().await;
            }
            release.notify_one();

            assert!(closing.await.is_ok_and(|result| result.is_ok()));
            assert_eq!(store.state(|t| *t).await, 5);
            Ok(())
        }

        #[tokio::test]
        async fn held_effect_times_out() -> Result<(), StoreError> {
            let (store, _release) = tally_store();
            store.send(TallyAction::AddWhenReleased(1)).await?;

            let result = store.shutdown(Duration::from_millis(50)).await;
            assert!(matches!(result, Err(StoreError::ShutdownTimeout(1))));
            assert_eq!(store.state(|t| *t).await, 0);
            Ok(())
        }
    }

    #[test]
    fn default_config() {
        let config = StoreConfig::default();
        assert_eq!(config.broadcast_capacity, 16);
        assert_eq!(config.default_shutdown_timeout, Duration::from_secs(30));
    }
}
