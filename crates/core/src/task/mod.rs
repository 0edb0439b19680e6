//! Asynchronous task polling

pub mod poller;

pub use poller::TaskPoller;
