//! Test doubles for the core ports
//!
//! Deterministic stand-ins for the transport, clock and sleeper so upload
//! and polling logic can be exercised without a network or real waiting.

use std::collections::VecDeque;
use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use diadoc_domain::{TransportError, TransportRequest, TransportResponse};
use parking_lot::Mutex;

use crate::ports::{Clock, HttpTransport, Sleeper};

type Responder =
    Box<dyn Fn(&TransportRequest) -> Result<TransportResponse, TransportError> + Send + Sync>;

/// Transport that answers from a closure or a fixed script and records
/// every request it receives.
pub struct ScriptedTransport {
    responder: Responder,
    requests: Mutex<Vec<TransportRequest>>,
}

impl ScriptedTransport {
    /// Answer each request with `responder`.
    pub fn new<F>(responder: F) -> Self
    where
        F: Fn(&TransportRequest) -> Result<TransportResponse, TransportError>
            + Send
            + Sync
            + 'static,
    {
        Self { responder: Box::new(responder), requests: Mutex::new(Vec::new()) }
    }

    /// Answer requests with `responses` in order; once the script runs out
    /// every further request fails with a network error.
    pub fn from_sequence(
        responses: impl IntoIterator<Item = Result<TransportResponse, TransportError>>,
    ) -> Self {
        let script = Mutex::new(responses.into_iter().collect::<VecDeque<_>>());
        Self::new(move |_| {
            script
                .lock()
                .pop_front()
                .unwrap_or_else(|| Err(TransportError::Network("script exhausted".into())))
        })
    }

    pub fn requests(&self) -> Vec<TransportRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }
}

#[async_trait]
impl HttpTransport for ScriptedTransport {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let result = (self.responder)(&request);
        self.requests.lock().push(request);
        result
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Clone)]
pub struct MockClock {
    start: Instant,
    elapsed: Arc<Mutex<Duration>>,
}

impl MockClock {
    pub fn new() -> Self {
        Self { start: Instant::now(), elapsed: Arc::new(Mutex::new(Duration::ZERO)) }
    }

    pub fn advance(&self, duration: Duration) {
        *self.elapsed.lock() += duration;
    }

    pub fn elapsed(&self) -> Duration {
        *self.elapsed.lock()
    }
}

impl Default for MockClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MockClock {
    fn now(&self) -> Instant {
        self.start + self.elapsed()
    }
}

/// Sleeper that returns immediately, advancing a [`MockClock`] by the
/// requested delay and remembering it.
#[derive(Debug, Clone)]
pub struct RecordingSleeper {
    clock: MockClock,
    delays: Arc<Mutex<Vec<Duration>>>,
}

impl RecordingSleeper {
    pub fn new(clock: MockClock) -> Self {
        Self { clock, delays: Arc::new(Mutex::new(Vec::new())) }
    }

    pub fn delays(&self) -> Vec<Duration> {
        self.delays.lock().clone()
    }
}

#[async_trait]
impl Sleeper for RecordingSleeper {
    async fn sleep(&self, duration: Duration) {
        self.delays.lock().push(duration);
        self.clock.advance(duration);
    }
}
