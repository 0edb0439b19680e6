//! Diadoc API client
//!
//! Wires the reqwest transport, the shared credentials and the core
//! protocol services together behind one facade.

use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use diadoc_core::{HttpTransport, ShelfUploader, TaskPoller};
use diadoc_domain::constants::{
    AUTHENTICATE_PATH, AUTHENTICATE_V3_PATH, GENERATE_PRINT_FORM_PATH, SHELF_DOWNLOAD_PATH,
};
use diadoc_domain::{
    ClientConfig, DiadocError, PrintFormResult, Result, ShelfName, TaskEndpoint, TaskId,
    TransportRequest,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use crate::auth::AuthManager;
use crate::http::HttpClient;

/// Client for the Diadoc API
pub struct DiadocClient {
    config: ClientConfig,
    auth: Arc<AuthManager>,
    transport: Arc<dyn HttpTransport>,
    uploader: ShelfUploader,
    poller: TaskPoller,
}

impl DiadocClient {
    /// Create a client talking to `config.api.base_url` over HTTP.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::Transport` if the base URL is invalid or the
    /// HTTP client cannot be created.
    pub fn new(config: ClientConfig) -> Result<Self> {
        let auth = Arc::new(AuthManager::new(config.api.client_id.clone()));

        let mut builder = HttpClient::builder(auth.clone())
            .base_url(config.api.base_url.clone())
            .timeout(config.api.timeout());
        if let Some(agent) = &config.api.user_agent {
            builder = builder.user_agent(agent.clone());
        }
        let http = builder.build()?;

        Ok(Self::from_parts(config, auth, Arc::new(http)))
    }

    /// Create a client from configuration found in the environment or in a
    /// `diadoc.{json,toml}` file.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::Config` if no usable configuration is found.
    pub fn from_env() -> Result<Self> {
        Self::new(crate::config::load()?)
    }

    /// Assemble a client over an arbitrary transport. `auth` should be the
    /// same manager the transport stamps requests with.
    pub fn from_parts(
        config: ClientConfig,
        auth: Arc<AuthManager>,
        transport: Arc<dyn HttpTransport>,
    ) -> Self {
        let uploader = ShelfUploader::with_config(transport.clone(), config.shelf);
        let poller = TaskPoller::new(transport.clone()).with_config(config.task);
        Self { config, auth, transport, uploader, poller }
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn auth(&self) -> &Arc<AuthManager> {
        &self.auth
    }

    pub fn is_authenticated(&self) -> bool {
        self.auth.is_authenticated()
    }

    /// Authenticate with a session id issued by the Kontur identity service.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the server answers with
    /// something that is not a token. Previous credentials are dropped
    /// either way.
    #[instrument(skip(self, sid))]
    pub async fn authenticate_by_sid(&self, sid: &str) -> Result<()> {
        require("sid", sid)?;
        self.auth.clear_credentials();

        let request = TransportRequest::post(AUTHENTICATE_V3_PATH)
            .query("type", "sid")
            .content_type("text/plain")
            .body(Bytes::copy_from_slice(sid.as_bytes()));
        let body = self.transport.perform_request(request).await?;

        self.store_token(body)
    }

    /// Authenticate with login and password through the legacy endpoint.
    ///
    /// # Errors
    ///
    /// Same as [`authenticate_by_sid`](Self::authenticate_by_sid).
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, login: &str, password: &str) -> Result<()> {
        require("login", login)?;
        self.auth.clear_credentials();

        let request = TransportRequest::post(AUTHENTICATE_PATH)
            .query("login", login)
            .query("password", password);
        let body = self.transport.perform_request(request).await?;

        self.store_token(body)
    }

    fn store_token(&self, body: Bytes) -> Result<()> {
        let token = String::from_utf8(body.to_vec())
            .map_err(|e| DiadocError::Auth(format!("Token is not valid UTF-8: {e}")))?;
        if token.is_empty() {
            return Err(DiadocError::Auth("Server returned an empty token".into()));
        }
        self.auth.set_credentials(token);
        info!("authenticated");
        Ok(())
    }

    /// Upload `data` to the shelf and return the generated name it is
    /// stored under.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::ShelfUpload` when a part is rejected for good or
    /// the upload runs out of attempts.
    pub async fn upload_file_to_shelf(&self, data: impl Into<Bytes>) -> Result<ShelfName> {
        Ok(self.uploader.upload(data).await?)
    }

    /// Download an object previously put on the shelf.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::Transport` for network failures and non-2xx
    /// answers.
    #[instrument(skip(self, name))]
    pub async fn shelf_download(&self, name: impl Into<ShelfName>) -> Result<Bytes> {
        let name = name.into();
        debug!(shelf_name = %name, "downloading from shelf");

        let request = TransportRequest::get(SHELF_DOWNLOAD_PATH).query("nameOnShelf", name.namespaced());
        Ok(self.transport.perform_request(request).await?)
    }

    pub fn shelf_upload_chunk_size(&self) -> usize {
        self.uploader.part_length()
    }

    pub fn shelf_upload_max_attempts(&self) -> u32 {
        self.uploader.max_attempts()
    }

    /// Wait for the task behind `task_id` on an arbitrary result endpoint.
    ///
    /// `timeout` defaults to the configured task timeout.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::Task` on timeout, task failure or transport
    /// failure.
    pub async fn wait_task_result(
        &self,
        endpoint: &str,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        Ok(self.poller.wait_result(endpoint, task_id, timeout).await?)
    }

    /// [`wait_task_result`](Self::wait_task_result) that stops early once
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Also returns `TaskError::Cancelled` (wrapped in `DiadocError::Task`).
    pub async fn wait_task_result_with_cancellation(
        &self,
        endpoint: &str,
        task_id: &TaskId,
        timeout: Option<Duration>,
        cancel: &CancellationToken,
    ) -> Result<Bytes> {
        Ok(self.poller.wait_result_with_cancellation(endpoint, task_id, timeout, cancel).await?)
    }

    pub async fn wait_cloud_sign_result(&self, task_id: &TaskId, timeout: Option<Duration>) -> Result<Bytes> {
        self.wait_endpoint(TaskEndpoint::CloudSignResult, task_id, timeout).await
    }

    pub async fn wait_cloud_sign_confirm_result(
        &self,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        self.wait_endpoint(TaskEndpoint::CloudSignConfirmResult, task_id, timeout).await
    }

    pub async fn wait_acquire_counteragent_result(
        &self,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        self.wait_endpoint(TaskEndpoint::AcquireCounteragentResult, task_id, timeout).await
    }

    pub async fn wait_autosign_receipts_result(
        &self,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        self.wait_endpoint(TaskEndpoint::AutosignReceiptsResult, task_id, timeout).await
    }

    async fn wait_endpoint(
        &self,
        endpoint: TaskEndpoint,
        task_id: &TaskId,
        timeout: Option<Duration>,
    ) -> Result<Bytes> {
        Ok(self.poller.wait_endpoint_result(endpoint, task_id, timeout).await?)
    }

    /// Ask the server to render the print form of a document.
    ///
    /// The server may not have the form ready yet; it then answers with
    /// [`PrintFormResult::RetryAfter`] and the call should be repeated later.
    ///
    /// # Errors
    ///
    /// Returns `DiadocError::InvalidInput` for empty ids and
    /// `DiadocError::Transport` for any answer other than 200.
    #[instrument(skip(self))]
    pub async fn generate_print_form(
        &self,
        box_id: &str,
        message_id: &str,
        document_id: &str,
    ) -> Result<PrintFormResult> {
        require("box_id", box_id)?;
        require("message_id", message_id)?;
        require("document_id", document_id)?;

        let request = TransportRequest::get(GENERATE_PRINT_FORM_PATH)
            .query("boxId", box_id)
            .query("messageId", message_id)
            .query("documentId", document_id);
        let response = self.transport.send(request).await?;

        Ok(PrintFormResult::from_response(response)?)
    }
}

fn require(name: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(DiadocError::InvalidInput(format!("{name} must not be empty")));
    }
    Ok(())
}
