//! Thumbnail and full-image loading with an on-disk cache.

use api_client::MediaId;
use iced::widget::image::Handle;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use thiserror::Error;
use tokio::fs;
use tokio::sync::Semaphore;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ImageLoaderError {
    #[error("network error: {0}")]
    Network(String),
    #[error("image not found")]
    NotFound,
    #[error("request timed out")]
    Timeout,
    #[error("io error: {0}")]
    Io(String),
    #[error("semaphore closed")]
    SemaphoreClosed,
}

impl From<reqwest::Error> for ImageLoaderError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            ImageLoaderError::Timeout
        } else {
            ImageLoaderError::Network(e.to_string())
        }
    }
}

#[derive(Debug, Clone)]
pub struct ImageLoader {
    base_url: String,
    cache_dir: PathBuf,
    client: reqwest::Client,
    semaphore: Arc<Semaphore>,
}

impl ImageLoader {
    pub fn new(base_url: &str, cache_dir: PathBuf, max_concurrent: usize) -> Self {
        let mut loader = Self::with_client(base_url, cache_dir, reqwest::Client::new());
        loader.semaphore = Arc::new(Semaphore::new(max_concurrent.max(1)));
        loader
    }

    pub fn with_client(base_url: &str, cache_dir: PathBuf, client: reqwest::Client) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            cache_dir,
            client,
            semaphore: Arc::new(Semaphore::new(4)),
        }
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn load_thumbnail(&self, file_hash: &str) -> Result<Handle, ImageLoaderError> {
        let start = Instant::now();
        let url = format!("{}/thumbnails/{}.webp", self.base_url, file_hash);
        let cache_path = self
            .cache_dir
            .join("thumbnails")
            .join(format!("{}.webp", file_hash));
        self.fetch_cached(&url, cache_path).await.map(|handle| {
            tracing::info!("thumbnail_time_ms" = %start.elapsed().as_millis(), "hash" = file_hash);
            handle
        })
    }

    #[cfg_attr(feature = "trace-spans", tracing::instrument(skip(self)))]
    pub async fn load_full_image(&self, file_id: MediaId) -> Result<Handle, ImageLoaderError> {
        let start = Instant::now();
        let url = format!("{}/stream/{}", self.base_url, file_id);
        let cache_path = self.cache_dir.join("full").join(file_id.to_string());
        self.fetch_cached(&url, cache_path).await.map(|handle| {
            tracing::info!("full_image_time_ms" = %start.elapsed().as_millis(), "id" = file_id);
            handle
        })
    }

    async fn fetch_cached(&self, url: &str, cache_path: PathBuf) -> Result<Handle, ImageLoaderError> {
        let _permit = self
            .semaphore
            .acquire()
            .await
            .map_err(|_| ImageLoaderError::SemaphoreClosed)?;

        if cache_path.exists() {
            return Ok(Handle::from_path(&cache_path));
        }

        let response = self.client.get(url).send().await?;
        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(ImageLoaderError::NotFound);
        }
        if !response.status().is_success() {
            return Err(ImageLoaderError::Network(format!(
                "unexpected status {}",
                response.status()
            )));
        }
        let bytes = response.bytes().await?;

        if let Some(parent) = cache_path.parent() {
            fs::create_dir_all(parent)
                .await
                .map_err(|e| ImageLoaderError::Io(e.to_string()))?;
        }
        fs::write(&cache_path, &bytes)
            .await
            .map_err(|e| ImageLoaderError::Io(e.to_string()))?;

        Ok(Handle::from_path(&cache_path))
    }
}
