//! Domain types and models

pub mod print_form;
pub mod shelf;
pub mod task;
pub mod transport;

pub use print_form::PrintFormResult;
pub use shelf::{parse_missing_parts, split_into_parts, ShelfName, ShelfPart};
pub use task::{TaskEndpoint, TaskId, TaskPoll};
pub use transport::{FileContent, HttpMethod, TransportRequest, TransportResponse};
