//! Configuration loading for the image service.
//!
//! Config files: `vignette.toml`, `vignette.yaml`, or `vignette.json`
//! Searched in `./` then `~/.config/vignette/`.

pub mod loader;
pub mod schema;

pub use {
    loader::{config_dir, discover_and_load, load_config},
    schema::{IngestConfig, ServerConfig, StorageConfig, VignetteConfig},
};
