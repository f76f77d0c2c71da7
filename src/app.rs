//! Wiring between configuration, resolver, fallback chains and cache

use crate::cache::{MediaCache, RetentionSweeper};
use crate::downloader::{DownloadConfig, DownloadEngine, Downloader};
use crate::extractor::chain::{FallbackChain, FetchOutcome};
use crate::extractor::models::{CanonicalUrl, Platform, PostReference};
use crate::extractor::{platforms, redirect, resolver};
use crate::utils::config::Settings;
use crate::utils::error::ReelfetchError;
use reqwest::redirect::Policy;
use reqwest::Client;
use std::sync::Arc;
use tracing::{info, warn};

/// Maximum redirect hops followed for share links and media URLs
const MAX_REDIRECTS: usize = 10;

/// Shared state for every request
pub struct App {
    settings: Arc<Settings>,
    client: Client,
    cache: Arc<MediaCache>,
    downloader: Arc<dyn Downloader>,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self, ReelfetchError> {
        let client = Client::builder()
            .redirect(Policy::limited(MAX_REDIRECTS))
            .connect_timeout(settings.page_timeout())
            .gzip(true)
            .build()?;
        let downloader = Arc::new(DownloadEngine::new(
            client.clone(),
            DownloadConfig::from_settings(&settings),
        ));
        Ok(Self::with_parts(settings, client, downloader))
    }

    /// Assemble an app around a custom downloader
    pub fn with_parts(settings: Settings, client: Client, downloader: Arc<dyn Downloader>) -> Self {
        let cache = Arc::new(MediaCache::new(
            settings.cache_dir.clone(),
            settings.min_sizes.clone(),
        ));
        Self {
            settings: Arc::new(settings),
            client,
            cache,
            downloader,
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn cache(&self) -> &MediaCache {
        &self.cache
    }

    /// Route path (`/x/123`, `/@user/video/1`, ...) to canonical post URL
    pub fn resolve(&self, route: &str) -> Result<(Platform, CanonicalUrl), ReelfetchError> {
        let post = PostReference::from_route(route);
        let url = resolver::resolve_reference(&post)?;
        Ok((post.platform(), url))
    }

    pub fn chain_for(&self, platform: Platform) -> FallbackChain {
        FallbackChain::new(
            platform,
            platforms::strategies(platform, &self.settings, &self.client),
            self.cache.clone(),
            self.downloader.clone(),
        )
    }

    /// Swap a share link for the post it redirects to. On failure the share
    /// link is kept, and so is its cache key.
    pub async fn settle_share_link(&self, platform: Platform, url: CanonicalUrl) -> CanonicalUrl {
        if !url.is_share_link() {
            return url;
        }
        match redirect::follow_share_link(&self.client, &self.settings, platform, &url).await {
            Ok(resolved) => resolved,
            Err(e) => {
                warn!("Could not resolve share link {}, using it as is: {}", url, e);
                url
            }
        }
    }

    /// Resolve, follow share links, then serve from cache or run the chain
    pub async fn fetch(&self, route: &str) -> Result<FetchOutcome, ReelfetchError> {
        let (platform, url) = self.resolve(route)?;
        info!("Fetching {} post {}", platform, url);

        let url = self.settle_share_link(platform, url).await;
        self.chain_for(platform).run(&url).await
    }

    pub fn sweeper(&self) -> RetentionSweeper {
        RetentionSweeper::new(
            self.cache.root().to_path_buf(),
            self.settings.max_age(),
            self.settings.sweep_interval(),
        )
    }
}
