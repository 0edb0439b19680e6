//! Port interfaces for the outside world: HTTP, time and delays

use std::time::{Duration, Instant};

use async_trait::async_trait;
use bytes::Bytes;
use diadoc_domain::{FileContent, TransportError, TransportRequest, TransportResponse};

/// HTTP transport collaborator.
///
/// Implementations own authentication, TLS and connection pooling. `send`
/// returns every HTTP answer as a response, whatever its status; only a
/// failure to complete the exchange is an error.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    /// Execute a request and buffer the whole response.
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError>;

    /// Execute a request and return the body of a 2xx answer.
    async fn perform_request(&self, request: TransportRequest) -> Result<Bytes, TransportError> {
        self.send(request).await?.into_success_body()
    }

    /// Like [`perform_request`](Self::perform_request), keeping the file name
    /// and content type the server announced.
    async fn perform_request_with_file_content(
        &self,
        request: TransportRequest,
    ) -> Result<FileContent, TransportError> {
        FileContent::from_response(self.send(request).await?)
    }
}

/// Monotonic time source.
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Real system clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Suspends the calling task without blocking the executor thread.
#[async_trait]
pub trait Sleeper: Send + Sync {
    async fn sleep(&self, duration: Duration);
}

/// Sleeper backed by the tokio timer.
#[derive(Debug, Clone, Copy, Default)]
pub struct TokioSleeper;

#[async_trait]
impl Sleeper for TokioSleeper {
    async fn sleep(&self, duration: Duration) {
        if !duration.is_zero() {
            tokio::time::sleep(duration).await;
        }
    }
}
