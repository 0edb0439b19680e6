//! Waiting for asynchronous server tasks
//!
//! Operations such as cloud signing hand back a task id instead of a result.
//! [`TaskPoller`] turns that id into the final payload by asking the result
//! endpoint until the task succeeds, fails, or the caller's deadline passes.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use diadoc_domain::{TaskConfig, TaskEndpoint, TaskError, TaskId, TaskPoll, TransportRequest};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument, warn};

use crate::ports::{Clock, HttpTransport, Sleeper, SystemClock, TokioSleeper};

/// Polls task result endpoints with server-paced backoff.
pub struct TaskPoller {
    transport: Arc<dyn HttpTransport>,
    clock: Arc<dyn Clock>,
    sleeper: Arc<dyn Sleeper>,
    config: TaskConfig,
}

impl TaskPoller {
    /// Poller on the system clock and the tokio timer.
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_runtime(transport, Arc::new(SystemClock), Arc::new(TokioSleeper))
    }

    /// Poller with an explicit clock and sleeper.
    pub fn with_runtime(
        transport: Arc<dyn HttpTransport>,
        clock: Arc<dyn Clock>,
        sleeper: Arc<dyn Sleeper>,
    ) -> Self {
        Self { transport, clock, sleeper, config: TaskConfig::default() }
    }

    #[must_use]
    pub fn with_config(mut self, config: TaskConfig) -> Self {
        self.config = config;
        self
    }

    pub fn default_timeout(&self) -> Duration {
        self.config.default_timeout()
    }

    /// Wait for the result of one of the well-known task endpoints.
    pub async fn wait_endpoint_result(
        &self,
        endpoint: TaskEndpoint,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes, TaskError> {
        self.wait_result(endpoint.path(), task_id, timeout).await
    }

    /// Poll `endpoint` until the task identified by `task_id` completes.
    ///
    /// `timeout` defaults to five minutes.
    ///
    /// # Errors
    ///
    /// * [`TaskError::Timeout`] if the task is still pending after `timeout`.
    /// * [`TaskError::Failed`] as soon as the endpoint answers with anything
    ///   other than 200 or 204.
    /// * [`TaskError::Transport`] if a status request cannot be completed.
    pub async fn wait_result(
        &self,
        endpoint: &str,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes, TaskError> {
        self.wait_result_with_cancellation(endpoint, task_id, timeout, &CancellationToken::new())
            .await
    }

    /// [`wait_result`](Self::wait_result) that also gives up with
    /// [`TaskError::Cancelled`] once `cancel` fires. Cancellation interrupts
    /// the delay between polls, never an in-flight request.
    #[instrument(skip(self, task_id, cancel), fields(task_id = %task_id))]
    pub async fn wait_result_with_cancellation(
        &self,
        endpoint: &str,
        task_id: &TaskId,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Bytes, TaskError> {
        let timeout = timeout.unwrap_or_else(|| self.config.default_timeout());
        let started = self.clock.now();
        // A timeout too large to represent means no deadline.
        let deadline = started.checked_add(timeout);
        let mut polls = 0u32;

        loop {
            if cancel.is_cancelled() {
                return Err(TaskError::Cancelled);
            }

            let request = TransportRequest::get(endpoint).query("taskId", task_id.as_str());
            let response = self.transport.send(request).await?;
            polls += 1;

            match TaskPoll::from_response(response) {
                TaskPoll::Succeeded(body) => {
                    info!(polls, len = body.len(), "task completed");
                    return Ok(body);
                }
                TaskPoll::Failed { status, reason, error_code } => {
                    warn!(polls, status, ?error_code, "task failed");
                    return Err(TaskError::Failed { status, reason, error_code });
                }
                TaskPoll::Pending { retry_after_secs } => {
                    let now = self.clock.now();
                    if deadline.is_some_and(|deadline| now > deadline) {
                        let elapsed_secs = now.duration_since(started).as_secs();
                        warn!(polls, elapsed_secs, "task result wait timed out");
                        return Err(TaskError::Timeout { endpoint: endpoint.to_string(), elapsed_secs });
                    }

                    let delay = self.retry_delay(retry_after_secs);
                    debug!(polls, ?retry_after_secs, delay_secs = delay.as_secs(), "task pending");
                    tokio::select! {
                        () = self.sleeper.sleep(delay) => {}
                        () = cancel.cancelled() => return Err(TaskError::Cancelled),
                    }
                }
            }
        }
    }

    /// Server hint capped at the configured maximum, or the default delay.
    fn retry_delay(&self, retry_after_secs: Option<u64>) -> Duration {
        retry_after_secs.map_or_else(
            || self.config.default_retry_delay(),
            |secs| Duration::from_secs(secs).min(self.config.max_retry_delay()),
        )
    }
}

#[cfg(test)]
mod tests {
    use diadoc_domain::{TransportError, TransportResponse};

    use super::*;
    use crate::testing::{MockClock, RecordingSleeper, ScriptedTransport};

    fn pending() -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(204, "No Content"))
    }

    fn pending_after(secs: &str) -> Result<TransportResponse, TransportError> {
        Ok(TransportResponse::new(204, "No Content").with_header("Retry-After", secs))
    }

    struct Harness {
        transport: Arc<ScriptedTransport>,
        clock: MockClock,
        sleeper: RecordingSleeper,
        poller: TaskPoller,
    }

    fn harness(transport: ScriptedTransport) -> Harness {
        let transport = Arc::new(transport);
        let clock = MockClock::new();
        let sleeper = RecordingSleeper::new(clock.clone());
        let poller = TaskPoller::with_runtime(
            transport.clone(),
            Arc::new(clock.clone()),
            Arc::new(sleeper.clone()),
        );
        Harness { transport, clock, sleeper, poller }
    }

    #[tokio::test]
    async fn honours_retry_after_then_default_delay() {
        let h = harness(ScriptedTransport::from_sequence([
            pending_after("5"),
            pending(),
            Ok(TransportResponse::new(200, "OK").with_body("ok")),
        ]));

        let result = h.poller.wait_result("/CloudSignResult", &TaskId::from("t-1"), None).await.unwrap();

        assert_eq!(result, Bytes::from_static(b"ok"));
        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(5), Duration::from_secs(15)]);
        let requests = h.transport.requests();
        assert_eq!(requests.len(), 3);
        assert!(requests.iter().all(|r| r.path == "/CloudSignResult" && r.query_value("taskId") == Some("t-1")));
    }

    #[tokio::test]
    async fn retry_after_is_capped() {
        let h = harness(ScriptedTransport::from_sequence([
            pending_after("120"),
            Ok(TransportResponse::new(200, "OK")),
        ]));

        h.poller.wait_result("/CloudSignResult", &TaskId::from("t"), None).await.unwrap();

        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn invalid_retry_after_uses_default_delay() {
        let h = harness(ScriptedTransport::from_sequence([
            pending_after("later"),
            Ok(TransportResponse::new(200, "OK")),
        ]));

        h.poller.wait_result("/CloudSignResult", &TaskId::from("t"), None).await.unwrap();

        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(15)]);
    }

    #[tokio::test]
    async fn times_out_while_pending() {
        let h = harness(ScriptedTransport::new(|_| pending()));

        let err = h
            .poller
            .wait_result("/AcquireCounteragentResult", &TaskId::from("t"), Some(Duration::from_secs(30)))
            .await
            .unwrap_err();

        match err {
            TaskError::Timeout { endpoint, elapsed_secs } => {
                assert_eq!(endpoint, "/AcquireCounteragentResult");
                assert_eq!(elapsed_secs, 45);
            }
            other => panic!("expected timeout, got {other:?}"),
        }
        // Polls at 0s, 15s, 30s and 45s; only the last one is past the deadline.
        assert_eq!(h.transport.request_count(), 4);
        assert_eq!(h.sleeper.delays().len(), 3);
        assert_eq!(h.clock.elapsed(), Duration::from_secs(45));
    }

    #[tokio::test]
    async fn unbounded_timeout_keeps_polling() {
        let h = harness(ScriptedTransport::from_sequence([
            pending(),
            pending(),
            Ok(TransportResponse::new(200, "OK").with_body("done")),
        ]));

        let result = h
            .poller
            .wait_result("/CloudSignResult", &TaskId::from("t"), Some(Duration::MAX))
            .await
            .unwrap();

        assert_eq!(result, Bytes::from_static(b"done"));
        assert_eq!(h.transport.request_count(), 3);
        assert_eq!(h.sleeper.delays().len(), 2);
    }

    #[tokio::test]
    async fn server_error_fails_immediately() {
        let h = harness(ScriptedTransport::from_sequence([Ok(TransportResponse::new(
            500,
            "Internal Server Error",
        ))]));

        let err = h.poller.wait_result("/CloudSignResult", &TaskId::from("t"), None).await.unwrap_err();

        assert!(matches!(
            err,
            TaskError::Failed { status: 500, ref reason, error_code: None } if reason == "Internal Server Error"
        ));
        assert!(h.sleeper.delays().is_empty());
        assert_eq!(h.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn failure_carries_server_error_code() {
        let h = harness(ScriptedTransport::from_sequence([
            pending(),
            Ok(TransportResponse::new(409, "Conflict").with_header("X-Diadoc-ErrorCode", "CloudSign.Expired")),
        ]));

        let err = h
            .poller
            .wait_endpoint_result(TaskEndpoint::CloudSignConfirmResult, &TaskId::from("t"), None)
            .await
            .unwrap_err();

        match err {
            TaskError::Failed { status, error_code, .. } => {
                assert_eq!(status, 409);
                assert_eq!(error_code.as_deref(), Some("CloudSign.Expired"));
            }
            other => panic!("expected task failure, got {other:?}"),
        }
        assert_eq!(h.transport.requests()[0].path, "/CloudSignConfirmResult");
    }

    #[tokio::test]
    async fn transport_error_is_not_retried() {
        let h = harness(ScriptedTransport::from_sequence([Err(TransportError::Network(
            "connection refused".into(),
        ))]));

        let err = h.poller.wait_result("/CloudSignResult", &TaskId::from("t"), None).await.unwrap_err();

        assert!(matches!(err, TaskError::Transport(TransportError::Network(_))));
        assert_eq!(h.transport.request_count(), 1);
    }

    #[tokio::test]
    async fn custom_config_changes_default_delay_and_timeout() {
        let h = harness(ScriptedTransport::new(|_| pending()));
        let poller = h.poller.with_config(TaskConfig {
            default_timeout_ms: 10_000,
            max_retry_delay_secs: 3,
            default_retry_delay_secs: 4,
        });

        let err = poller.wait_result("/CloudSignResult", &TaskId::from("t"), None).await.unwrap_err();

        assert!(matches!(err, TaskError::Timeout { elapsed_secs: 12, .. }));
        assert_eq!(h.sleeper.delays(), vec![Duration::from_secs(4); 3]);
    }

    #[tokio::test]
    async fn cancelled_token_stops_polling() {
        let h = harness(ScriptedTransport::new(|_| pending()));
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = h
            .poller
            .wait_result_with_cancellation("/CloudSignResult", &TaskId::from("t"), None, &cancel)
            .await
            .unwrap_err();

        assert!(matches!(err, TaskError::Cancelled));
        assert_eq!(h.transport.request_count(), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn cancellation_interrupts_real_delay() {
        let transport = Arc::new(ScriptedTransport::new(|_| pending()));
        let poller = TaskPoller::new(transport.clone());
        let cancel = CancellationToken::new();
        let trigger = cancel.clone();

        let task_id = TaskId::from("t");
        let wait = poller.wait_result_with_cancellation("/CloudSignResult", &task_id, None, &cancel);
        let cancel_later = async move {
            tokio::time::sleep(Duration::from_secs(1)).await;
            trigger.cancel();
        };
        let (result, ()) = tokio::join!(wait, cancel_later);

        assert!(matches!(result, Err(TaskError::Cancelled)));
        assert_eq!(transport.request_count(), 1);
    }
}
