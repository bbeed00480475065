//! Storage module for drawing files
//!
//! Defines the [`FileStore`] boundary the drawing service writes through and
//! the MinIO/S3-compatible client backing it in production.

mod file_store;
mod minio_client;

pub use file_store::{object_key, FileStore};
pub use minio_client::MinIOClient;
