//! Image ingestion and thumbnail pipeline: URL probing, size-guarded
//! download, content-type resolution, on-disk storage, lazy derivative
//! generation, and deletion sweeps.

pub mod error;
pub mod fetch;
pub mod mime;
pub mod probe;
pub mod service;
pub mod storage;
pub mod thumbs;

pub use {
    error::{Error, Result},
    service::{ImageService, ServiceOptions},
    storage::MediaStorage,
};
