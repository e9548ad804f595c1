//! Configuration for a booking session.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::gateway::{HttpGateway, SimulatedGateway, SubmissionGateway};
use serde::{Deserialize, Serialize};
use std::env;
use std::sync::Arc;
use std::time::Duration;
use tablebook_runtime::StoreConfig;

/// Session configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookingConfig {
    /// Booking endpoint; the simulated gateway is used when unset
    pub endpoint: Option<String>,
    /// Gateway timeout in seconds
    pub submit_timeout_secs: u64,
    /// Delay of the simulated gateway in milliseconds
    pub simulated_delay_ms: u64,
    /// Capacity of the store's action broadcast
    pub broadcast_capacity: usize,
    /// How long shutdown waits for in-flight submissions, in seconds
    pub shutdown_timeout_secs: u64,
}

impl Default for BookingConfig {
    fn default() -> Self {
        Self {
            endpoint: None,
            submit_timeout_secs: 10,
            simulated_delay_ms: 1000,
            broadcast_capacity: 16,
            shutdown_timeout_secs: 5,
        }
    }
}

impl BookingConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparseable variables keep their default.
    #[must_use]
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            endpoint: env::var("BOOKING_ENDPOINT")
                .ok()
                .filter(|s| !s.trim().is_empty()),
            submit_timeout_secs: env::var("BOOKING_SUBMIT_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.submit_timeout_secs),
            simulated_delay_ms: env::var("BOOKING_SIMULATED_DELAY_MS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.simulated_delay_ms),
            broadcast_capacity: env::var("BOOKING_BROADCAST_CAPACITY")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.broadcast_capacity),
            shutdown_timeout_secs: env::var("BOOKING_SHUTDOWN_TIMEOUT_SECS")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(defaults.shutdown_timeout_secs),
        }
    }

    /// Gateway timeout
    #[must_use]
    pub const fn submit_timeout(&self) -> Duration {
        Duration::from_secs(self.submit_timeout_secs)
    }

    /// Simulated gateway delay
    #[must_use]
    pub const fn simulated_delay(&self) -> Duration {
        Duration::from_millis(self.simulated_delay_ms)
    }

    /// Shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout_secs)
    }

    /// Runtime settings for the session's store
    #[must_use]
    pub fn store_config(&self) -> StoreConfig {
        StoreConfig::new(self.broadcast_capacity, self.shutdown_timeout())
    }

    /// Gateway selected by this configuration
    #[must_use]
    pub fn gateway(&self) -> Arc<dyn SubmissionGateway> {
        match &self.endpoint {
            Some(endpoint) => Arc::new(HttpGateway::new(endpoint.clone())),
            None => SimulatedGateway::shared(self.simulated_delay()),
        }
    }
}
