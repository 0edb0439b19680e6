use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use diadoc_core::HttpTransport;
use diadoc_domain::constants::{DEFAULT_API_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
use diadoc_domain::{HttpMethod, TransportError, TransportRequest, TransportResponse};
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{Client as ReqwestClient, Method, Request};
use tracing::debug;
use url::Url;

use crate::auth::AuthManager;
use crate::errors::InfraError;

/// User agent sent with every request.
pub fn default_user_agent() -> String {
    format!("Diadoc SDK for Rust v{}", env!("CARGO_PKG_VERSION"))
}

/// HTTP client bound to one Diadoc API host.
///
/// Every HTTP answer, whatever its status, is handed back as a
/// [`TransportResponse`]; status semantics belong to the callers. Only
/// requests that never produced an answer are retried, and only when more
/// than one attempt is configured.
#[derive(Clone)]
pub struct HttpClient {
    client: ReqwestClient,
    base_url: Url,
    auth: Arc<AuthManager>,
    max_attempts: usize,
    base_backoff: Duration,
}

impl HttpClient {
    /// Start building a new HTTP client.
    pub fn builder(auth: Arc<AuthManager>) -> HttpClientBuilder {
        HttpClientBuilder::new(auth)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    fn build_request(&self, request: &TransportRequest) -> Result<Request, TransportError> {
        let url = self.endpoint_url(request)?;
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
        };

        let mut builder = self
            .client
            .request(method, url)
            .header(AUTHORIZATION, self.auth.credentials().header_value());
        if let Some(content_type) = &request.content_type {
            builder = builder.header(CONTENT_TYPE, content_type);
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        } else if request.method == HttpMethod::Post {
            builder = builder.body(Vec::new());
        }

        builder.build().map_err(|err| InfraError::from(err).into())
    }

    fn endpoint_url(&self, request: &TransportRequest) -> Result<Url, TransportError> {
        let joined = format!(
            "{}/{}",
            self.base_url.as_str().trim_end_matches('/'),
            request.path.trim_start_matches('/')
        );
        let mut url = Url::parse(&joined).map_err(|err| {
            TransportError::InvalidRequest(format!("invalid request URL {joined}: {err}"))
        })?;
        if !request.query.is_empty() {
            url.query_pairs_mut().extend_pairs(&request.query);
        }
        Ok(url)
    }

    async fn read_response(response: reqwest::Response) -> Result<TransportResponse, TransportError> {
        let status = response.status();
        let mut result = TransportResponse::new(
            status.as_u16(),
            status.canonical_reason().unwrap_or("Unknown Status"),
        );
        for (name, value) in response.headers() {
            if let Ok(value) = value.to_str() {
                result.insert_header(name.as_str(), value);
            }
        }
        let body = response.bytes().await.map_err(|err| TransportError::from(InfraError::from(err)))?;
        Ok(result.with_body(body))
    }

    fn backoff_delay(&self, retry_number: usize) -> Duration {
        let shift = retry_number.saturating_sub(1).min(8) as u32;
        let multiplier = 1u32 << shift;
        self.base_backoff.saturating_mul(multiplier)
    }

    async fn sleep_with_backoff(&self, retry_number: usize) {
        let delay = self.backoff_delay(retry_number);
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn send(&self, request: TransportRequest) -> Result<TransportResponse, TransportError> {
        let attempts = self.max_attempts.max(1);

        for attempt in 0..attempts {
            let built = self.build_request(&request)?;
            let method = built.method().clone();
            let url = built.url().clone();
            debug!(attempt = attempt + 1, %method, %url, "sending HTTP request");

            match self.client.execute(built).await {
                Ok(response) => {
                    let status = response.status();
                    debug!(attempt = attempt + 1, %method, %url, %status, "received HTTP response");
                    return Self::read_response(response).await;
                }
                Err(err) => {
                    debug!(attempt = attempt + 1, %method, %url, error = %err, "HTTP request failed");

                    if attempt + 1 < attempts && should_retry_error(&err) {
                        self.sleep_with_backoff(attempt + 1).await;
                        continue;
                    }

                    return Err(InfraError::from(err).into());
                }
            }
        }

        Err(TransportError::Network("http client exhausted retries without producing a result".into()))
    }
}

/// Builder for [`HttpClient`].
#[derive(Debug)]
pub struct HttpClientBuilder {
    auth: Arc<AuthManager>,
    base_url: String,
    timeout: Duration,
    max_attempts: usize,
    base_backoff: Duration,
    user_agent: Option<String>,
}

impl HttpClientBuilder {
    fn new(auth: Arc<AuthManager>) -> Self {
        Self {
            auth,
            base_url: DEFAULT_API_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            max_attempts: 1,
            base_backoff: Duration::from_millis(200),
            user_agent: None,
        }
    }

    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Configure the total number of attempts (initial try + retries) for
    /// requests that fail before any answer arrives.
    pub fn max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    pub fn base_backoff(mut self, backoff: Duration) -> Self {
        self.base_backoff = backoff;
        self
    }

    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    pub fn build(self) -> Result<HttpClient, TransportError> {
        let base_url = Url::parse(&self.base_url).map_err(|err| {
            TransportError::InvalidRequest(format!("invalid base URL {}: {err}", self.base_url))
        })?;

        let client = ReqwestClient::builder()
            .timeout(self.timeout)
            .user_agent(self.user_agent.unwrap_or_else(default_user_agent))
            .no_proxy()
            .build()
            .map_err(|err| TransportError::from(InfraError::from(err)))?;

        Ok(HttpClient {
            client,
            base_url,
            auth: self.auth,
            max_attempts: self.max_attempts.max(1),
            base_backoff: self.base_backoff,
        })
    }
}

fn should_retry_error(err: &reqwest::Error) -> bool {
    if err.is_timeout() || err.is_request() {
        return true;
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        if err.is_connect() {
            return true;
        }
    }
    false
}
