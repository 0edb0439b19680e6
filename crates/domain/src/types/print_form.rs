//! Print form generation results

use std::time::Duration;

use super::transport::{FileContent, TransportResponse};
use crate::errors::TransportError;

/// Answer of `GeneratePrintForm`: either the rendered document or a hint to
/// ask again later.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PrintFormResult {
    Ready(FileContent),
    RetryAfter(Duration),
}

impl PrintFormResult {
    /// Interpret a print form response. Anything but 200 is an error.
    pub fn from_response(response: TransportResponse) -> Result<Self, TransportError> {
        if response.status != 200 {
            return Err(TransportError::Status {
                status: response.status,
                reason: response.reason,
                body: response.body.to_vec(),
            });
        }
        if let Some(secs) = response.retry_after_secs() {
            return Ok(Self::RetryAfter(Duration::from_secs(secs)));
        }
        FileContent::from_response(response).map(Self::Ready)
    }

    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}

#[cfg(test)]
mod tests {
    use bytes::Bytes;

    use super::*;

    #[test]
    fn retry_after_takes_precedence_over_body() {
        let response = TransportResponse::new(200, "OK").with_header("Retry-After", "3");
        assert_eq!(
            PrintFormResult::from_response(response).unwrap(),
            PrintFormResult::RetryAfter(Duration::from_secs(3))
        );
    }

    #[test]
    fn ready_form_keeps_file_metadata() {
        let response = TransportResponse::new(200, "OK")
            .with_header("Content-Type", "application/pdf")
            .with_header("Content-Disposition", "attachment; filename=\"invoice.pdf\"")
            .with_body("%PDF");

        let result = PrintFormResult::from_response(response).unwrap();

        assert!(result.is_ready());
        let PrintFormResult::Ready(file) = result else { unreachable!() };
        assert_eq!(file.file_name.as_deref(), Some("invoice.pdf"));
        assert_eq!(file.content_type.as_deref(), Some("application/pdf"));
        assert_eq!(file.content, Bytes::from_static(b"%PDF"));
    }

    #[test]
    fn non_ok_status_is_an_error() {
        let response = TransportResponse::new(202, "Accepted");
        let err = PrintFormResult::from_response(response).unwrap_err();
        assert_eq!(err.status(), Some(202));
    }
}
