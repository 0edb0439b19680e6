//! `DiadocAuth` credentials
//!
//! Every request carries the API client id; once authenticated it also
//! carries the token the server issued. The token is swapped in place when
//! the user re-authenticates, so one [`AuthManager`] is shared between the
//! HTTP client and the API facade.

use std::fmt;

use diadoc_domain::constants::AUTH_SCHEME;
use parking_lot::RwLock;
use tracing::debug;

/// Client id plus the optional session token.
#[derive(Clone, PartialEq, Eq)]
pub struct DiadocCredentials {
    api_client_id: String,
    auth_token: Option<String>,
}

impl DiadocCredentials {
    pub fn new(api_client_id: impl Into<String>, auth_token: Option<String>) -> Self {
        Self { api_client_id: api_client_id.into(), auth_token }
    }

    pub fn api_client_id(&self) -> &str {
        &self.api_client_id
    }

    pub fn auth_token(&self) -> Option<&str> {
        self.auth_token.as_deref()
    }

    /// Value of the `Authorization` header.
    pub fn header_value(&self) -> String {
        match &self.auth_token {
            Some(token) => {
                format!("{AUTH_SCHEME} ddauth_api_client_id={},ddauth_token={token}", self.api_client_id)
            }
            None => format!("{AUTH_SCHEME} ddauth_api_client_id={}", self.api_client_id),
        }
    }
}

// Keep tokens out of logs.
impl fmt::Debug for DiadocCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DiadocCredentials")
            .field("api_client_id", &self.api_client_id)
            .field("auth_token", &self.auth_token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Shared, mutable holder of the current credentials.
#[derive(Debug)]
pub struct AuthManager {
    api_client_id: String,
    token: RwLock<Option<String>>,
}

impl AuthManager {
    pub fn new(api_client_id: impl Into<String>) -> Self {
        Self { api_client_id: api_client_id.into(), token: RwLock::new(None) }
    }

    pub fn set_credentials(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
        debug!("auth token updated");
    }

    pub fn clear_credentials(&self) {
        *self.token.write() = None;
    }

    pub fn is_authenticated(&self) -> bool {
        self.token.read().is_some()
    }

    /// Snapshot of the credentials to stamp on a request.
    pub fn credentials(&self) -> DiadocCredentials {
        DiadocCredentials::new(self.api_client_id.clone(), self.token.read().clone())
    }
}
