//! Request/response values exchanged with the HTTP transport

use std::collections::BTreeMap;

use bytes::Bytes;

use crate::constants::{
    HEADER_CONTENT_DISPOSITION, HEADER_CONTENT_TYPE, HEADER_ERROR_CODE, HEADER_RETRY_AFTER,
};
use crate::errors::TransportError;

/// HTTP method subset used by the Diadoc API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
}

/// A request relative to the configured API base URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportRequest {
    pub method: HttpMethod,
    pub path: String,
    pub query: Vec<(String, String)>,
    pub body: Option<Bytes>,
    pub content_type: Option<String>,
}

impl TransportRequest {
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, path)
    }

    fn new(method: HttpMethod, path: impl Into<String>) -> Self {
        Self { method, path: path.into(), query: Vec::new(), body: None, content_type: None }
    }

    #[must_use]
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    #[must_use]
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = Some(body.into());
        self
    }

    #[must_use]
    pub fn content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Value of the first query parameter named `key`.
    pub fn query_value(&self, key: &str) -> Option<&str> {
        self.query.iter().find(|(k, _)| k == key).map(|(_, v)| v.as_str())
    }
}

/// A fully buffered HTTP response. Any status code is representable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransportResponse {
    pub status: u16,
    pub reason: String,
    /// Header names are stored lower-cased.
    headers: BTreeMap<String, String>,
    pub body: Bytes,
}

impl TransportResponse {
    pub fn new(status: u16, reason: impl Into<String>) -> Self {
        Self { status, reason: reason.into(), headers: BTreeMap::new(), body: Bytes::new() }
    }

    #[must_use]
    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.insert_header(name, value);
        self
    }

    #[must_use]
    pub fn with_body(mut self, body: impl Into<Bytes>) -> Self {
        self.body = body.into();
        self
    }

    pub fn insert_header(&mut self, name: &str, value: impl Into<String>) {
        self.headers.entry(name.to_ascii_lowercase()).or_insert_with(|| value.into());
    }

    /// Case-insensitive header lookup; the first value wins.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(&name.to_ascii_lowercase()).map(String::as_str)
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// `Retry-After` in whole seconds. Empty or non-numeric values are ignored.
    pub fn retry_after_secs(&self) -> Option<u64> {
        self.header(HEADER_RETRY_AFTER).and_then(|value| value.trim().parse().ok())
    }

    pub fn error_code(&self) -> Option<&str> {
        self.header(HEADER_ERROR_CODE).filter(|code| !code.is_empty())
    }

    pub fn content_type(&self) -> Option<&str> {
        self.header(HEADER_CONTENT_TYPE)
    }

    /// File name announced through `Content-Disposition`.
    ///
    /// `filename*=UTF-8''...` wins over plain `filename=`.
    pub fn file_name(&self) -> Option<String> {
        let disposition = self.header(HEADER_CONTENT_DISPOSITION)?;
        let mut plain = None;
        for param in disposition.split(';').map(str::trim) {
            let Some((key, value)) = param.split_once('=') else { continue };
            match key.trim().to_ascii_lowercase().as_str() {
                "filename*" => {
                    let encoded = value.trim().trim_matches('"');
                    let encoded = encoded.split_once("''").map_or(encoded, |(_, rest)| rest);
                    return Some(percent_decode(encoded));
                }
                "filename" => plain = Some(value.trim().trim_matches('"').to_string()),
                _ => {}
            }
        }
        plain
    }

    /// Body of a 2xx response, or a `Status` error carrying the raw body.
    pub fn into_success_body(self) -> Result<Bytes, TransportError> {
        if self.is_success() {
            Ok(self.body)
        } else {
            Err(TransportError::Status {
                status: self.status,
                reason: self.reason,
                body: self.body.to_vec(),
            })
        }
    }
}

/// A downloaded file together with the metadata the server announced for it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub file_name: Option<String>,
    pub content_type: Option<String>,
    pub content: Bytes,
}

impl FileContent {
    pub fn from_response(response: TransportResponse) -> Result<Self, TransportError> {
        let file_name = response.file_name();
        let content_type = response.content_type().map(str::to_string);
        let content = response.into_success_body()?;
        Ok(Self { file_name, content_type, content })
    }
}

fn percent_decode(input: &str) -> String {
    String::from_utf8_lossy(&urlencoding::decode_binary(input.as_bytes())).into_owned()
}
