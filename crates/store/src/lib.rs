//! Durable record store for ingested images.
//!
//! Maps monotonically assigned integer identifiers to relative storage
//! paths. Identifier allocation happens inside the store (a single atomic
//! statement), so callers never need an application-level lock.

pub mod error;
pub mod record;
pub mod store;

pub use {
    error::{Error, Result},
    record::ImageRecord,
    store::{ImageStore, SqliteImageStore},
};
