//! Circuit breaker pattern implementation
//!
//! A breaker opens when a guarded call exceeds its timeout, rejects calls
//! while open, and becomes probe-eligible (half-open) once the retry timer
//! fires. A probe flips the breaker back to open before it is attempted and
//! closes it when it completes in time.

use emulator_core::CircuitBreakerSettings;
use parking_lot::Mutex;
use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

/// Circuit breaker state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CircuitState {
    /// Circuit is closed, requests pass through normally
    Closed,
    /// Circuit is open, requests are rejected without a network attempt
    Open,
    /// Retry timer fired, the next request is let through as a probe
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half-open"),
        }
    }
}

/// Circuit breaker configuration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CircuitBreakerConfig {
    /// Deadline of every guarded call
    pub timeout: Duration,

    /// Time to wait before transitioning from open to half-open
    pub retry_after: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(1),
            retry_after: Duration::from_secs(5),
        }
    }
}

impl From<CircuitBreakerSettings> for CircuitBreakerConfig {
    fn from(settings: CircuitBreakerSettings) -> Self {
        Self {
            timeout: settings.timeout,
            retry_after: settings.retry_timer,
        }
    }
}

/// Circuit breaker metrics
#[derive(Debug, Clone, Default)]
pub struct CircuitMetrics {
    /// Calls presented to the breaker, rejected ones included
    pub total_calls: u64,
    /// Calls that completed within the timeout
    pub total_completed: u64,
    /// Calls that exceeded the timeout
    pub total_timeouts: u64,
    /// Calls rejected because the circuit was open
    pub total_rejected: u64,
    /// Last state change time
    pub last_state_change: Option<Instant>,
}

/// Thread-safe circuit breaker for one route
#[derive(Clone)]
pub struct CircuitBreaker {
    route: Arc<str>,
    config: Arc<CircuitBreakerConfig>,
    state: Arc<Mutex<CircuitBreakerState>>,
}

struct CircuitBreakerState {
    state: CircuitState,
    // Bumped on every transition so a stale retry timer cannot half-open a newer opening
    epoch: u64,
    metrics: CircuitMetrics,
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("route", &self.route)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish()
    }
}

impl CircuitBreaker {
    /// Create a new closed circuit breaker for `route`
    pub fn new(route: impl Into<String>, config: CircuitBreakerConfig) -> Self {
        Self {
            route: Arc::from(route.into()),
            config: Arc::new(config),
            state: Arc::new(Mutex::new(CircuitBreakerState {
                state: CircuitState::Closed,
                epoch: 0,
                metrics: CircuitMetrics::default(),
            })),
        }
    }

    /// Route key this breaker protects
    pub fn route(&self) -> &str {
        &self.route
    }

    pub fn config(&self) -> &CircuitBreakerConfig {
        &self.config
    }

    /// Get the current state
    pub fn state(&self) -> CircuitState {
        self.state.lock().state
    }

    /// Check if the circuit breaker is open (requests are rejected)
    pub fn is_open(&self) -> bool {
        self.state() == CircuitState::Open
    }

    /// Get current metrics
    pub fn metrics(&self) -> CircuitMetrics {
        self.state.lock().metrics.clone()
    }

    /// Run `operation` under the breaker.
    ///
    /// Returns `unavailable` without calling `operation` while the circuit is
    /// open, and when the operation misses the deadline. Any result produced
    /// in time (success or error) is returned as is and closes the circuit.
    pub async fn guard<F, Fut, T, E>(&self, operation: F, unavailable: E) -> Result<T, E>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let mut probe = match self.admit() {
            Admission::Rejected => return Err(unavailable),
            Admission::Closed => None,
            Admission::Probe { epoch } => Some(ProbeInFlight {
                breaker: self,
                epoch,
                settled: false,
            }),
        };

        let outcome = tokio::time::timeout(self.config.timeout, operation()).await;
        if let Some(probe) = probe.as_mut() {
            probe.settled = true;
        }

        match outcome {
            Ok(result) => {
                self.record_completion();
                result
            }
            Err(_) => {
                self.record_timeout();
                Err(unavailable)
            }
        }
    }

    // Internal methods

    fn admit(&self) -> Admission {
        let mut state = self.state.lock();
        state.metrics.total_calls += 1;

        match state.state {
            CircuitState::Closed => Admission::Closed,
            CircuitState::Open => {
                state.metrics.total_rejected += 1;
                debug!("Circuit breaker {} is open, rejecting call", self.route);
                Admission::Rejected
            }
            CircuitState::HalfOpen => {
                // Only one probe: later callers see the circuit open until it completes
                self.transition(&mut state, CircuitState::Open);
                debug!("Circuit breaker {} letting probe through", self.route);
                Admission::Probe { epoch: state.epoch }
            }
        }
    }

    // The probe was dropped before completing or timing out
    fn abandon_probe(&self, epoch: u64) {
        {
            let state = self.state.lock();
            if state.state != CircuitState::Open || state.epoch != epoch {
                return;
            }
        }

        warn!(
            "Circuit breaker {} probe was cancelled, retrying in {:?}",
            self.route, self.config.retry_after
        );
        self.schedule_half_open(epoch);
    }

    fn record_completion(&self) {
        let mut state = self.state.lock();
        state.metrics.total_completed += 1;

        if state.state != CircuitState::Closed {
            self.transition(&mut state, CircuitState::Closed);
            info!("Circuit breaker {} closed after successful call", self.route);
        }
    }

    fn record_timeout(&self) {
        let epoch = {
            let mut state = self.state.lock();
            state.metrics.total_timeouts += 1;
            self.transition(&mut state, CircuitState::Open);
            state.epoch
        };

        warn!(
            "Circuit breaker {} opened after call timed out ({:?}), retrying in {:?}",
            self.route, self.config.timeout, self.config.retry_after
        );
        self.schedule_half_open(epoch);
    }

    fn schedule_half_open(&self, epoch: u64) {
        let Ok(runtime) = tokio::runtime::Handle::try_current() else {
            warn!("Circuit breaker {} has no runtime to schedule its retry timer", self.route);
            return;
        };

        let state = Arc::clone(&self.state);
        let route = Arc::clone(&self.route);
        let retry_after = self.config.retry_after;

        runtime.spawn(async move {
            tokio::time::sleep(retry_after).await;

            let mut state = state.lock();
            if state.state == CircuitState::Open && state.epoch == epoch {
                state.state = CircuitState::HalfOpen;
                state.epoch += 1;
                state.metrics.last_state_change = Some(Instant::now());
                info!("Circuit breaker {} transitioned to half-open state", route);
            }
        });
    }

    fn transition(&self, state: &mut CircuitBreakerState, next: CircuitState) {
        state.state = next;
        state.epoch += 1;
        state.metrics.last_state_change = Some(Instant::now());
    }
}

enum Admission {
    Rejected,
    Closed,
    Probe { epoch: u64 },
}

/// Restarts the cooldown if a probe is dropped mid-call
struct ProbeInFlight<'a> {
    breaker: &'a CircuitBreaker,
    epoch: u64,
    settled: bool,
}

impl Drop for ProbeInFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            self.breaker.abandon_probe(self.epoch);
        }
    }
}

/// Builder for circuit breakers
pub struct CircuitBreakerBuilder {
    route: String,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerBuilder {
    /// Create a new builder with default config
    pub fn new(route: impl Into<String>) -> Self {
        Self {
            route: route.into(),
            config: CircuitBreakerConfig::default(),
        }
    }

    /// Set the per-call timeout
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.config.timeout = timeout;
        self
    }

    /// Set the cooldown before a probe is allowed
    pub fn retry_after(mut self, retry_after: Duration) -> Self {
        self.config.retry_after = retry_after;
        self
    }

    /// Build the circuit breaker
    pub fn build(self) -> CircuitBreaker {
        CircuitBreaker::new(self.route, self.config)
    }
}
