//! # Diadoc Infrastructure
//!
//! Infrastructure implementations of the core ports.
//!
//! This crate contains:
//! - The reqwest HTTP transport
//! - `DiadocAuth` credential handling
//! - Configuration loading and tracing setup
//! - The [`DiadocClient`] facade
//!
//! ## Architecture
//! - Implements traits defined in `diadoc-core`
//! - Contains all "impure" code (network, environment, files)

pub mod api;
pub mod auth;
pub mod config;
pub mod errors;
pub mod http;
pub mod observability;

// Re-export commonly used items
pub use api::DiadocClient;
pub use auth::{AuthManager, DiadocCredentials};
pub use errors::InfraError;
pub use http::{HttpClient, HttpClientBuilder};
pub use observability::{init_tracing, LogFormat};
