//! # Diadoc Domain
//!
//! Domain types and models for the Diadoc client.
//!
//! This crate contains:
//! - Protocol constants (shelf part size, attempt budget, polling delays)
//! - Client configuration structures
//! - Error taxonomy and Result definitions
//! - Transport request/response values, shelf parts and task poll states
//!
//! ## Architecture
//! - No dependencies on other Diadoc crates
//! - Only external dependencies allowed
//! - Pure domain models and data structures

pub mod config;
pub mod constants;
pub mod errors;
pub mod types;

// Re-export commonly used items
pub use config::*;
pub use errors::*;
pub use types::*;
