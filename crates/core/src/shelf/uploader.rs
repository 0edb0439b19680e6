//! Resumable, chunked upload of a payload to the shelf
//!
//! The payload is cut into fixed-size parts that are posted one by one. After
//! every part the server may answer with the indices it is still missing for
//! that shelf name; that answer is trusted over the local view of which
//! requests went through. Only missing parts are re-sent, for a bounded
//! number of rounds.

use std::collections::BTreeSet;
use std::sync::Arc;

use bytes::Bytes;
use diadoc_domain::constants::{SHELF_NON_RETRIABLE_STATUS_CODES, SHELF_UPLOAD_PATH};
use diadoc_domain::{
    parse_missing_parts, split_into_parts, ShelfConfig, ShelfName, ShelfPart, ShelfUploadError,
    TransportError, TransportRequest,
};
use tracing::{debug, info, instrument, warn};

use crate::ports::HttpTransport;

/// Outcome of posting a single part.
#[derive(Debug)]
enum PartOutcome {
    /// 200 with an empty body. Leaves any earlier report untouched.
    Stored,
    /// 200 carrying the server's current missing set for the shelf name.
    Reported(BTreeSet<usize>),
    /// Transport failure or retriable status; already recorded.
    Failed,
}

/// Uploads payloads to the shelf and returns the name they were stored under.
pub struct ShelfUploader {
    transport: Arc<dyn HttpTransport>,
    config: ShelfConfig,
}

impl ShelfUploader {
    pub fn new(transport: Arc<dyn HttpTransport>) -> Self {
        Self::with_config(transport, ShelfConfig::default())
    }

    pub fn with_config(transport: Arc<dyn HttpTransport>, config: ShelfConfig) -> Self {
        Self { transport, config }
    }

    pub fn part_length(&self) -> usize {
        self.config.part_length
    }

    pub fn max_attempts(&self) -> u32 {
        self.config.max_attempts
    }

    /// Upload `payload` under a freshly generated shelf name.
    ///
    /// # Errors
    ///
    /// * [`ShelfUploadError::NonRetriable`] as soon as a part is refused with
    ///   401, 402 or 403.
    /// * [`ShelfUploadError::AttemptsExhausted`] when parts are still missing
    ///   after the configured number of rounds; it carries every error seen.
    /// * [`ShelfUploadError::MalformedMissingParts`] if the server answers with
    ///   a body that is not a JSON array of indices.
    pub async fn upload(&self, payload: impl Into<Bytes>) -> Result<ShelfName, ShelfUploadError> {
        let name = ShelfName::generate();
        self.upload_as(&name, payload.into()).await?;
        Ok(name)
    }

    #[instrument(skip(self, name, payload), fields(shelf_name = %name, len = payload.len()))]
    async fn upload_as(&self, name: &ShelfName, payload: Bytes) -> Result<(), ShelfUploadError> {
        let parts = split_into_parts(&payload, self.config.part_length);
        let last_index = parts.len() - 1;

        let mut missing: BTreeSet<usize> = (0..parts.len()).collect();
        let mut errors = Vec::new();
        let mut attempts = 0u32;

        while !missing.is_empty() {
            attempts += 1;
            if attempts > self.config.max_attempts {
                warn!(
                    attempts = self.config.max_attempts,
                    missing = missing.len(),
                    errors = errors.len(),
                    "shelf upload gave up"
                );
                return Err(ShelfUploadError::AttemptsExhausted {
                    attempts: self.config.max_attempts,
                    errors,
                });
            }

            // The last part finalizes the object; it is re-sent every round.
            missing.insert(last_index);

            debug!(attempt = attempts, parts = missing.len(), "uploading missing shelf parts");
            missing = self.put_missing_parts(name, &parts, &missing, &mut errors).await?;
        }

        info!(parts = parts.len(), attempts, "shelf upload completed");
        Ok(())
    }

    /// One round over `targets`. Returns the missing set for the next round:
    /// parts that failed here plus the most recent server report.
    async fn put_missing_parts(
        &self,
        name: &ShelfName,
        parts: &[ShelfPart],
        targets: &BTreeSet<usize>,
        errors: &mut Vec<TransportError>,
    ) -> Result<BTreeSet<usize>, ShelfUploadError> {
        let mut failed = BTreeSet::new();
        let mut reported: Option<(usize, BTreeSet<usize>)> = None;

        for &index in targets {
            match self.put_part(name, &parts[index], errors).await? {
                PartOutcome::Failed => {
                    failed.insert(index);
                }
                PartOutcome::Stored => {}
                PartOutcome::Reported(server_missing) => {
                    if reported.as_ref().map_or(true, |(reporter, _)| index > *reporter) {
                        reported = Some((index, server_missing));
                    }
                }
            }
        }

        if let Some((reporter, server_missing)) = reported {
            let (known, unknown): (BTreeSet<_>, BTreeSet<_>) =
                server_missing.into_iter().partition(|&i| i < parts.len());
            if !unknown.is_empty() {
                warn!(reporter, ?unknown, "server reported missing parts outside the payload");
            }
            failed.extend(known);
        }
        Ok(failed)
    }

    async fn put_part(
        &self,
        name: &ShelfName,
        part: &ShelfPart,
        errors: &mut Vec<TransportError>,
    ) -> Result<PartOutcome, ShelfUploadError> {
        let mut request = TransportRequest::post(SHELF_UPLOAD_PATH)
            .query("nameOnShelf", name.namespaced())
            .query("partIndex", part.index.to_string());
        if part.is_last {
            request = request.query("isLastPart", "1");
        }
        let request = request.body(part.data.clone());

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(err) => {
                warn!(part = part.index, error = %err, "shelf part upload failed");
                errors.push(err);
                return Ok(PartOutcome::Failed);
            }
        };

        if response.status != 200 {
            if SHELF_NON_RETRIABLE_STATUS_CODES.contains(&response.status) {
                warn!(part = part.index, status = response.status, "shelf upload rejected");
                return Err(ShelfUploadError::NonRetriable {
                    status: response.status,
                    reason: response.reason,
                });
            }
            warn!(part = part.index, status = response.status, "shelf part upload returned an error status");
            errors.push(TransportError::Status {
                status: response.status,
                reason: response.reason,
                body: response.body.to_vec(),
            });
            return Ok(PartOutcome::Failed);
        }

        Ok(match parse_missing_parts(&response.body)? {
            Some(missing) => PartOutcome::Reported(missing),
            None => PartOutcome::Stored,
        })
    }
}
