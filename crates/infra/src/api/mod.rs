//! Diadoc API facade
//!
//! [`DiadocClient`] is the entry point of the crate: it authenticates,
//! uploads to and downloads from the shelf, waits for asynchronous tasks and
//! renders print forms.

pub mod client;

pub use client::DiadocClient;
