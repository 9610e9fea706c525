//! End-to-end ingestion, thumbnail, and deletion flows.

use std::{sync::Arc, time::Duration};

use {reqwest::Client, tracing::info};

use vignette_store::{ImageRecord, ImageStore};

use crate::{
    Error, Result, fetch, mime,
    probe::UrlProber,
    storage::{IMAGES_DIR, MediaStorage},
    thumbs,
};

/// Tunables for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct ServiceOptions {
    /// Maximum accepted payload size in bytes.
    pub max_bytes: u64,
    /// Timeout applied to every remote fetch.
    pub timeout: Duration,
    /// Supported thumbnail size classes.
    pub thumbnail_sizes: Vec<u32>,
}

impl Default for ServiceOptions {
    fn default() -> Self {
        Self {
            max_bytes: 5 * 1024 * 1024,
            timeout: Duration::from_secs(30),
            thumbnail_sizes: vec![100, 300],
        }
    }
}

/// Facade over the prober, fetcher, storage writer, thumbnail deriver, and
/// record store.
pub struct ImageService {
    prober: UrlProber,
    client: Client,
    storage: MediaStorage,
    store: Arc<dyn ImageStore>,
    options: ServiceOptions,
}

impl ImageService {
    pub fn new(
        storage: MediaStorage,
        store: Arc<dyn ImageStore>,
        options: ServiceOptions,
    ) -> Result<Self> {
        let client = Client::builder().timeout(options.timeout).build()?;
        Ok(Self {
            prober: UrlProber::new(client.clone()),
            client,
            storage,
            store,
            options,
        })
    }

    /// Ingest the image at `url`: probe reachability and content type,
    /// download under the size cap, store the bytes, allocate a record.
    ///
    /// Identifier assignment is a single atomic store operation; all
    /// network and disk work happens before it, outside any lock.
    pub async fn create_from_url(&self, url: &str) -> Result<ImageRecord> {
        if !self.prober.probe(url).await || !self.prober.is_image(url).await {
            return Err(Error::invalid_url(url));
        }

        let content_type = self.prober.content_type(url).await.unwrap_or_default();
        let Some(extension) = mime::image_extension(&content_type) else {
            return Err(Error::invalid_url(url));
        };

        let bytes = fetch::download(&self.client, url, self.options.max_bytes).await?;
        let storage_path = self.storage.store(bytes, &extension).await?;

        let record = match self.store.allocate(&storage_path).await {
            Ok(record) => record,
            Err(source) => {
                // Don't leave an unreferenced file behind.
                let _ = self.storage.sweep(&storage_path).await;
                return Err(Error::Store(source));
            },
        };

        info!(id = record.id, path = %record.storage_path, "image ingested");
        Ok(record)
    }

    /// Look up a record and verify its file still exists on disk. A record
    /// whose file is missing surfaces as [`Error::NotFound`].
    pub async fn original(&self, id: i64) -> Result<ImageRecord> {
        let record = self.store.find_by_id(id).await?.ok_or(Error::NotFound)?;
        if !self.storage.absolute(&record.storage_path).exists() {
            return Err(Error::NotFound);
        }
        Ok(record)
    }

    /// Relative path of the `size`×`size` derivative for record `id`,
    /// generated on first request and cached on disk thereafter.
    pub async fn thumbnail(&self, id: i64, size: u32) -> Result<String> {
        let record = self.original(id).await?;
        let absolute = self.storage.absolute(&record.storage_path);
        let derivative = thumbs::thumbnail(absolute, size, &self.options.thumbnail_sizes).await?;

        let name = derivative
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(format!("{IMAGES_DIR}/{name}"))
    }

    /// Remove the original, its derivative family, and the record.
    ///
    /// Fails with [`Error::NotFound`] when the record or its file is gone;
    /// the record is kept in that case so the caller sees a consistent 404.
    pub async fn delete(&self, id: i64) -> Result<()> {
        let record = self.store.find_by_id(id).await?.ok_or(Error::NotFound)?;
        let removed = self.storage.sweep(&record.storage_path).await?;
        self.store.delete(record.id).await?;

        info!(id = record.id, files = removed, "image deleted");
        Ok(())
    }

    /// Number of stored records.
    pub async fn count(&self) -> Result<i64> {
        Ok(self.store.count().await?)
    }

    pub fn storage(&self) -> &MediaStorage {
        &self.storage
    }
}
