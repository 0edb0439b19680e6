//! Shared helpers for the integration tests.
#![allow(dead_code)]

use diadoc_domain::ClientConfig;
use diadoc_infra::DiadocClient;
use wiremock::{MockServer, Request};

pub const CLIENT_ID: &str = "test-client";

/// Default configuration pointed at the mock server.
pub fn config_for(server: &MockServer) -> ClientConfig {
    let mut config = ClientConfig::new(CLIENT_ID);
    config.api.base_url = server.uri();
    config
}

pub fn client_for(server: &MockServer) -> DiadocClient {
    DiadocClient::new(config_for(server)).expect("diadoc client")
}

/// Decoded value of the first query parameter named `key`.
pub fn query(request: &Request, key: &str) -> Option<String> {
    request.url.query_pairs().find(|(k, _)| k == key).map(|(_, v)| v.into_owned())
}

/// Raw header value, commas included.
pub fn header(request: &Request, name: &str) -> Option<String> {
    request.headers.get(name).and_then(|v| v.to_str().ok()).map(str::to_string)
}
