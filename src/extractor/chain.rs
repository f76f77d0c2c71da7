use crate::cache::MediaCache;
use crate::downloader::Downloader;
use crate::extractor::models::{CanonicalUrl, ExtractionAttempt, MediaAsset, MediaLocation, Platform};
use crate::extractor::traits::{AttemptContext, Strategy};
use crate::utils::error::{ExtractionFailure, ReelfetchError};
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Result of a successful fetch
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    pub asset: MediaAsset,
    pub from_cache: bool,
    /// Strategies run for this request, in order; empty on a cache hit
    pub attempts: Vec<ExtractionAttempt>,
}

/// Ordered fallback over a platform's strategies
///
/// Strategies run one at a time and each runs at most once. The first one
/// that leaves a file above the size floor at the target path wins.
pub struct FallbackChain {
    platform: Platform,
    strategies: Vec<Arc<dyn Strategy>>,
    cache: Arc<MediaCache>,
    downloader: Arc<dyn Downloader>,
}

/// Scratch file yt-dlp leaves next to its output
fn tool_partial(target: &Path) -> PathBuf {
    let mut name = OsString::from(target.as_os_str());
    name.push(".part");
    PathBuf::from(name)
}

impl FallbackChain {
    pub fn new(
        platform: Platform,
        strategies: Vec<Arc<dyn Strategy>>,
        cache: Arc<MediaCache>,
        downloader: Arc<dyn Downloader>,
    ) -> Self {
        Self {
            platform,
            strategies,
            cache,
            downloader,
        }
    }

    pub fn strategy_ids(&self) -> Vec<&'static str> {
        self.strategies.iter().map(|s| s.id()).collect()
    }

    pub async fn run(&self, url: &CanonicalUrl) -> Result<FetchOutcome, ReelfetchError> {
        let media_id = url.media_key();
        if let Some(asset) = self.cache.lookup(self.platform, media_id).await {
            info!("Cache hit for {} {}: {}", self.platform, media_id, asset.path.display());
            return Ok(FetchOutcome {
                asset,
                from_cache: true,
                attempts: Vec::new(),
            });
        }

        fs::create_dir_all(self.cache.platform_dir(self.platform)).await?;
        let ctx = AttemptContext {
            platform: self.platform,
            url: url.clone(),
            target: self.cache.target_path(self.platform, media_id),
        };
        // An undersized leftover would pass for yt-dlp's "already downloaded"
        self.cache.discard(&ctx.target).await;
        self.cache.discard(&tool_partial(&ctx.target)).await;

        let mut attempts = Vec::with_capacity(self.strategies.len());
        for (index, strategy) in self.strategies.iter().enumerate() {
            info!(
                strategy = strategy.id(),
                "Trying {} method {}/{} for {}",
                self.platform,
                index + 1,
                self.strategies.len(),
                url
            );
            let started = Instant::now();
            let outcome = self.try_strategy(strategy.as_ref(), &ctx).await;
            let elapsed = started.elapsed();

            match outcome {
                Ok(asset) => {
                    info!(
                        strategy = strategy.id(),
                        "Downloaded {} ({} bytes) in {:.1}s",
                        asset.path.display(),
                        asset.size,
                        elapsed.as_secs_f64()
                    );
                    attempts.push(ExtractionAttempt {
                        strategy: strategy.id(),
                        elapsed,
                        outcome: Ok(()),
                    });
                    return Ok(FetchOutcome {
                        asset,
                        from_cache: false,
                        attempts,
                    });
                }
                Err(failure) => {
                    warn!(strategy = strategy.id(), "Method failed: {}", failure);
                    self.cache.discard(&ctx.target).await;
                    self.cache.discard(&tool_partial(&ctx.target)).await;
                    attempts.push(ExtractionAttempt {
                        strategy: strategy.id(),
                        elapsed,
                        outcome: Err(failure),
                    });
                }
            }
        }

        let last = attempts
            .iter()
            .rev()
            .find_map(|a| a.outcome.clone().err())
            .unwrap_or_else(|| ExtractionFailure::download("No download methods configured"));
        error!(
            "All {} download methods failed for {}: {}",
            self.platform, url, last
        );
        Err(ReelfetchError::AllStrategiesExhausted {
            platform: self.platform,
            attempts: attempts.len(),
            last,
        })
    }

    async fn try_strategy(
        &self,
        strategy: &dyn Strategy,
        ctx: &AttemptContext,
    ) -> Result<MediaAsset, ExtractionFailure> {
        match strategy.attempt(ctx).await? {
            MediaLocation::Remote(media) => {
                debug!(strategy = strategy.id(), "Fetching media from {}", media);
                let part = self.cache.partial_path(self.platform, ctx.url.media_key());
                self.downloader.fetch_to(&media, &part, &ctx.target).await?;
            }
            MediaLocation::Stored(path) => {
                if path != ctx.target {
                    fs::rename(&path, &ctx.target).await?;
                }
            }
        }

        let size = fs::metadata(&ctx.target).await?.len();
        let floor = self.cache.min_size(self.platform);
        if size < floor {
            return Err(ExtractionFailure::download(format!(
                "Downloaded file is incomplete ({} bytes, minimum {})",
                size, floor
            )));
        }

        self.cache
            .lookup(self.platform, ctx.url.media_key())
            .await
            .ok_or_else(|| ExtractionFailure::download("Downloaded file vanished"))
    }
}
