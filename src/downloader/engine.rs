use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::USER_AGENT;
use reqwest::{Client, StatusCode};
use std::path::Path;
use std::time::{Duration, Instant};
use tokio::fs::{self, File};
use tokio::io::AsyncWriteExt;
use tracing::{debug, info, warn};

/// Fetches a direct media URL into the cache
///
/// Bytes go to `part` first; `target` only appears once the body is
/// complete, so a half-written file is never mistaken for a cache hit.
#[async_trait]
pub trait Downloader: Send + Sync {
    /// Returns the number of bytes written
    async fn fetch_to(&self, url: &str, part: &Path, target: &Path) -> Result<u64, ExtractionFailure>;
}

/// Download configuration
#[derive(Debug, Clone)]
pub struct DownloadConfig {
    pub timeout: Duration,   // Whole request, body included
    pub user_agent: String,
}

impl DownloadConfig {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: settings.media_timeout(),
            user_agent: settings.user_agent.clone(),
        }
    }
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self::from_settings(&Settings::default())
    }
}

/// Streaming HTTP media downloader
pub struct DownloadEngine {
    client: Client,
    config: DownloadConfig,
}

impl DownloadEngine {
    pub fn new(client: Client, config: DownloadConfig) -> Self {
        Self { client, config }
    }

    async fn stream_to_file(&self, url: &str, part: &Path) -> Result<u64, ExtractionFailure> {
        debug!("Using simple download for URL: {}", url);

        let response = self
            .client
            .get(url)
            .header(USER_AGENT, &self.config.user_agent)
            .timeout(self.config.timeout)
            .send()
            .await
            .map_err(|e| ExtractionFailure::download(format!("Error downloading video: {}", e)))?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
            return Err(ExtractionFailure::not_found(format!(
                "Media URL answered {}",
                status
            )));
        }
        if !status.is_success() {
            return Err(ExtractionFailure::download(format!("HTTP error: {}", status)));
        }

        let expected = response.content_length();
        let mut file = File::create(part).await?;
        let mut downloaded = 0u64;
        let start_time = Instant::now();

        let mut stream = response.bytes_stream();
        while let Some(chunk_result) = stream.next().await {
            let chunk = chunk_result
                .map_err(|e| ExtractionFailure::download(format!("Error reading video body: {}", e)))?;
            file.write_all(&chunk).await?;
            downloaded += chunk.len() as u64;
        }

        // Ensure file is flushed
        file.flush().await?;

        if let Some(expected) = expected {
            if expected != downloaded {
                return Err(ExtractionFailure::download(format!(
                    "Truncated download: got {} of {} bytes",
                    downloaded, expected
                )));
            }
        }

        let elapsed = start_time.elapsed().as_secs_f64();
        let speed = if elapsed > 0.0 {
            downloaded as f64 / elapsed
        } else {
            0.0
        };
        debug!("Downloaded {} bytes at {:.0} B/s", downloaded, speed);

        Ok(downloaded)
    }
}

#[async_trait]
impl Downloader for DownloadEngine {
    async fn fetch_to(&self, url: &str, part: &Path, target: &Path) -> Result<u64, ExtractionFailure> {
        let result = async {
            let size = self.stream_to_file(url, part).await?;
            fs::rename(part, target).await?;
            Ok::<_, ExtractionFailure>(size)
        }
        .await;

        match result {
            Ok(size) => {
                info!("Saved {} ({} bytes)", target.display(), size);
                Ok(size)
            }
            Err(e) => {
                if let Err(rm) = fs::remove_file(part).await {
                    if rm.kind() != std::io::ErrorKind::NotFound {
                        warn!("Could not remove partial file {}: {}", part.display(), rm);
                    }
                }
                Err(e)
            }
        }
    }
}
