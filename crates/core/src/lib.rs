//! # Diadoc Core
//!
//! Protocol logic of the Diadoc client, free of any concrete HTTP stack.
//!
//! This crate contains:
//! - Port interfaces (traits) for transport, time and delays
//! - The resumable shelf uploader
//! - The task result poller
//!
//! ## Architecture Principles
//! - Only depends on `diadoc-domain`
//! - No sockets, TLS or configuration files
//! - All external effects via traits

pub mod ports;
pub mod shelf;
pub mod task;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use ports::{Clock, HttpTransport, Sleeper, SystemClock, TokioSleeper};
pub use shelf::ShelfUploader;
pub use task::TaskPoller;
