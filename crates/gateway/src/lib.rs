//! HTTP surface for the image service: upload-by-url, public URL lookup,
//! thumbnail URLs, deletion, and static serving of the storage directory.

pub mod routes;
pub mod server;

pub use server::{AppState, build_app, start_server};
