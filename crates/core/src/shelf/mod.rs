//! Shelf uploads

pub mod uploader;

pub use uploader::ShelfUploader;
