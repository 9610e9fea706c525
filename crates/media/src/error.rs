use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid image url: {url}")]
    InvalidUrl { url: String },
    #[error("payload exceeds {limit}-byte limit")]
    TooLarge { limit: u64 },
    #[error("not found")]
    NotFound,
    #[error("unsupported thumbnail size {size}")]
    UnsupportedSize { size: u32 },
    #[error("failed to decode {path}: {source}")]
    Decode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error(transparent)]
    Storage(#[from] std::io::Error),
    #[error(transparent)]
    Transport(#[from] reqwest::Error),
    #[error(transparent)]
    Store(#[from] vignette_store::Error),
}

impl Error {
    #[must_use]
    pub fn invalid_url(url: impl Into<String>) -> Self {
        Self::InvalidUrl { url: url.into() }
    }

    #[must_use]
    pub fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::Decode {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
