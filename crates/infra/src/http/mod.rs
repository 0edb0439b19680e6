//! reqwest-backed implementation of the transport port

pub mod client;

pub use client::{default_user_agent, HttpClient, HttpClientBuilder};
