//! Protocol constants
//!
//! Centralized location for the wire-level constants of the Diadoc shelf and
//! task endpoints.

use std::time::Duration;

// Shelf upload
pub const SHELF_PART_LENGTH: usize = 512 * 1024;
pub const SHELF_MAX_ATTEMPTS: u32 = 3;
/// Statuses that mean a part upload can never succeed, no matter how often
/// it is retried.
pub const SHELF_NON_RETRIABLE_STATUS_CODES: &[u16] = &[401, 402, 403];
pub const SHELF_USER_NAMESPACE: &str = "__userId__";
pub const SHELF_NAME_PREFIX: &str = "rust_api";

// Task polling
pub const TASK_DEFAULT_TIMEOUT_MS: u64 = 5 * 60 * 1000;
pub const TASK_MAX_RETRY_DELAY: Duration = Duration::from_secs(15);
pub const TASK_DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(15);

// Endpoints
pub const SHELF_UPLOAD_PATH: &str = "/ShelfUpload";
pub const SHELF_DOWNLOAD_PATH: &str = "/ShelfDownload";
pub const AUTHENTICATE_PATH: &str = "/Authenticate";
pub const AUTHENTICATE_V3_PATH: &str = "/V3/Authenticate";
pub const GENERATE_PRINT_FORM_PATH: &str = "/GeneratePrintForm";

// Headers
pub const HEADER_RETRY_AFTER: &str = "Retry-After";
pub const HEADER_ERROR_CODE: &str = "X-Diadoc-ErrorCode";
pub const HEADER_CONTENT_TYPE: &str = "Content-Type";
pub const HEADER_CONTENT_DISPOSITION: &str = "Content-Disposition";
pub const AUTH_SCHEME: &str = "DiadocAuth";

// Client defaults
pub const DEFAULT_API_URL: &str = "https://diadoc-api.kontur.ru";
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 100;
