use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Root configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct VignetteConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub ingest: IngestConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Address to bind to. Defaults to "127.0.0.1".
    pub bind: String,
    /// Port to listen on.
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".into(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Directory holding the `images/` tree and the record database.
    /// Defaults to the platform data dir (e.g. `~/.local/share/vignette`).
    pub data_dir: Option<PathBuf>,
}

impl StorageConfig {
    /// The configured data dir, or the platform default, or `./data` as a
    /// last resort.
    pub fn resolve_data_dir(&self) -> PathBuf {
        if let Some(ref dir) = self.data_dir {
            return dir.clone();
        }
        directories::ProjectDirs::from("", "", "vignette")
            .map(|d| d.data_dir().to_path_buf())
            .unwrap_or_else(|| PathBuf::from("data"))
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct IngestConfig {
    /// Maximum accepted payload size in bytes.
    pub max_bytes: u64,
    /// Timeout for remote fetches, in seconds.
    pub timeout_secs: u64,
    /// Supported thumbnail size classes (square pixel dimensions).
    pub thumbnail_sizes: Vec<u32>,
}

impl Default for IngestConfig {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            timeout_secs: 30,
            thumbnail_sizes: vec![100, 300],
        }
    }
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let cfg = VignetteConfig::default();
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.server.port, 8080);
        assert_eq!(cfg.ingest.max_bytes, 5 * 1024 * 1024);
        assert_eq!(cfg.ingest.thumbnail_sizes, vec![100, 300]);
    }

    #[test]
    fn test_partial_toml_fills_defaults() {
        let cfg: VignetteConfig = toml::from_str("[server]\nport = 9000\n").unwrap();
        assert_eq!(cfg.server.port, 9000);
        assert_eq!(cfg.server.bind, "127.0.0.1");
        assert_eq!(cfg.ingest.timeout_secs, 30);
    }
}
