//! Submission gateways.
//!
//! The reducer only sees [`SubmissionGateway`]. Three implementations ship
//! with the crate:
//!
//! - [`SimulatedGateway`]: waits a fixed delay, then accepts
//! - [`HttpGateway`]: POSTs the request as JSON to a booking endpoint
//! - [`ScriptedGateway`]: replays queued outcomes, optionally held until released

use crate::error::{GatewayError, GatewayResult};
use crate::types::BookingRequest;
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::Notify;

/// Boxed future returned by gateways
pub type GatewayFuture = Pin<Box<dyn Future<Output = GatewayResult<bool>> + Send>>;

/// Boundary that finalizes a booking
///
/// Resolves to `Ok(true)` when the booking was accepted and `Ok(false)` when
/// the service answered but declined it.
pub trait SubmissionGateway: Send + Sync {
    /// Submit a completed draft
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the service could not be reached or
    /// refused to process the request.
    fn submit(&self, request: BookingRequest) -> GatewayFuture;
}

/// Default delay of the simulated gateway
pub const DEFAULT_SIMULATED_DELAY: Duration = Duration::from_millis(1000);

/// Gateway that accepts every booking after a fixed delay
#[derive(Clone, Debug)]
pub struct SimulatedGateway {
    delay: Duration,
}

impl SimulatedGateway {
    /// Creates a gateway with the given response delay
    #[must_use]
    pub const fn new(delay: Duration) -> Self {
        Self { delay }
    }

    /// Creates an Arc-wrapped instance for sharing
    #[must_use]
    pub fn shared(delay: Duration) -> Arc<dyn SubmissionGateway> {
        Arc::new(Self::new(delay))
    }
}

impl Default for SimulatedGateway {
    fn default() -> Self {
        Self::new(DEFAULT_SIMULATED_DELAY)
    }
}

impl SubmissionGateway for SimulatedGateway {
    fn submit(&self, request: BookingRequest) -> GatewayFuture {
        let delay = self.delay;
        Box::pin(async move {
            tokio::time::sleep(delay).await;

            tracing::info!(
                date = %request.date,
                time = %request.time,
                guests = request.guests,
                "Simulated booking accepted"
            );

            Ok(true)
        })
    }
}

/// Gateway backed by an HTTP booking endpoint
#[derive(Clone, Debug)]
pub struct HttpGateway {
    http_client: reqwest::Client,
    endpoint: String,
}

impl HttpGateway {
    /// Creates a gateway posting to `endpoint`
    #[must_use]
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self::with_client(reqwest::Client::new(), endpoint)
    }

    /// Creates a gateway reusing an existing client
    #[must_use]
    pub fn with_client(http_client: reqwest::Client, endpoint: impl Into<String>) -> Self {
        Self {
            http_client,
            endpoint: endpoint.into(),
        }
    }

    /// Target URL
    #[must_use]
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

impl SubmissionGateway for HttpGateway {
    fn submit(&self, request: BookingRequest) -> GatewayFuture {
        let client = self.http_client.clone();
        let endpoint = self.endpoint.clone();
        Box::pin(async move {
            let response = client
                .post(&endpoint)
                .json(&request)
                .send()
                .await
                .map_err(|e| GatewayError::Transport(e.to_string()))?;

            let status = response.status();
            if status.is_success() {
                tracing::info!(%endpoint, %status, "Booking accepted");
                Ok(true)
            } else {
                let body = response.text().await.unwrap_or_default();
                tracing::warn!(%endpoint, %status, body = %body, "Booking declined");
                Ok(false)
            }
        })
    }
}

/// Deterministic gateway for tests and demos
///
/// Outcomes are replayed in queue order; once the queue is empty every
/// submission is accepted. With a release gate, each submission waits for
/// one [`Notify::notify_one`] before resolving.
#[derive(Clone, Debug, Default)]
pub struct ScriptedGateway {
    outcomes: Arc<Mutex<VecDeque<GatewayResult<bool>>>>,
    requests: Arc<Mutex<Vec<BookingRequest>>>,
    release: Option<Arc<Notify>>,
}

impl ScriptedGateway {
    /// Gateway that accepts everything immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Gateway replaying `outcomes` in order
    #[must_use]
    pub fn with_outcomes(outcomes: impl IntoIterator<Item = GatewayResult<bool>>) -> Self {
        Self {
            outcomes: Arc::new(Mutex::new(outcomes.into_iter().collect())),
            ..Self::default()
        }
    }

    /// Hold every submission until `release` is notified
    #[must_use]
    pub fn gated(mut self, release: Arc<Notify>) -> Self {
        self.release = Some(release);
        self
    }

    /// Queue another outcome
    pub fn push_outcome(&self, outcome: GatewayResult<bool>) {
        self.outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(outcome);
    }

    /// Requests received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<BookingRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

impl SubmissionGateway for ScriptedGateway {
    fn submit(&self, request: BookingRequest) -> GatewayFuture {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let outcome = self
            .outcomes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front()
            .unwrap_or(Ok(true));
        let release = self.release.clone();

        Box::pin(async move {
            if let Some(release) = release {
                release.notified().await;
            }
            tracing::debug!(?outcome, "Scripted gateway resolved");
            outcome
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> BookingRequest {
        BookingRequest {
            date: "2025-01-05".into(),
            time: "19:00".into(),
            guests: 2,
            occasion: String::new(),
            name: "Ada".into(),
            email: "ada@example.com".into(),
            phone: "555 0100".into(),
        }
    }

    #[tokio::test]
    async fn simulated_gateway_accepts() {
        let gateway = SimulatedGateway::new(Duration::from_millis(5));
        assert_eq!(gateway.submit(request()).await, Ok(true));
    }

    #[tokio::test]
    async fn scripted_gateway_replays_then_accepts() {
        let gateway = ScriptedGateway::with_outcomes([
            Ok(false),
            Err(GatewayError::Transport("connection reset".into())),
        ]);

        assert_eq!(gateway.submit(request()).await, Ok(false));
        assert!(matches!(
            gateway.submit(request()).await,
            Err(GatewayError::Transport(_))
        ));
        assert_eq!(gateway.submit(request()).await, Ok(true));
        assert_eq!(gateway.requests().len(), 3);
    }

    #[tokio::test]
    async fn gated_submission_waits_for_release() {
        let release = Arc::new(Notify::new());
        let gateway = ScriptedGateway::new().gated(Arc::clone(&release));

        let pending = tokio::spawn(gateway.submit(request()));
        tokio::task::yield_now().await;
        assert!(!pending.is_finished());

        release.notify_one();
        assert!(matches!(pending.await, Ok(Ok(true))));
    }

    #[tokio::test]
    async fn http_gateway_reports_transport_failure() {
        // Port 9 (discard) on localhost refuses connections in CI sandboxes.
        let gateway = HttpGateway::new("http://127.0.0.1:9/bookings");
        assert_eq!(gateway.endpoint(), "http://127.0.0.1:9/bookings");

        let result = tokio::time::timeout(Duration::from_secs(5), gateway.submit(request())).await;
        if let Ok(result) = result {
            assert!(matches!(result, Err(GatewayError::Transport(_))));
        }
    }
}
