//! Asynchronous server task types

use std::fmt;

use bytes::Bytes;
use serde::{Deserialize, Serialize};

use super::transport::TransportResponse;

/// Opaque identifier returned by an operation that starts a server task.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TaskId(String);

impl TaskId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TaskId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<String> for TaskId {
    fn from(value: String) -> Self {
        Self(value)
    }
}

/// Result endpoints of the asynchronous operations the API offers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TaskEndpoint {
    CloudSignResult,
    CloudSignConfirmResult,
    AcquireCounteragentResult,
    AutosignReceiptsResult,
}

impl TaskEndpoint {
    pub fn path(self) -> &'static str {
        match self {
            Self::CloudSignResult => "/CloudSignResult",
            Self::CloudSignConfirmResult => "/CloudSignConfirmResult",
            Self::AcquireCounteragentResult => "/AcquireCounteragentResult",
            Self::AutosignReceiptsResult => "/AutosignReceiptsResult",
        }
    }
}

impl fmt::Display for TaskEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.path())
    }
}

/// What a single status request revealed about a task.
///
/// Polling moves `Pending -> Pending` until the server answers with
/// `Succeeded` or `Failed`; both are terminal.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskPoll {
    Pending { retry_after_secs: Option<u64> },
    Succeeded(Bytes),
    Failed { status: u16, reason: String, error_code: Option<String> },
}

impl TaskPoll {
    pub fn from_response(response: TransportResponse) -> Self {
        match response.status {
            204 => Self::Pending { retry_after_secs: response.retry_after_secs() },
            200 => Self::Succeeded(response.body),
            status => Self::Failed {
                status,
                error_code: response.error_code().map(str::to_string),
                reason: response.reason,
            },
        }
    }
}
