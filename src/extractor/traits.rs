use crate::extractor::models::{CanonicalUrl, MediaLocation, Platform};
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use std::path::PathBuf;

/// Everything a strategy needs to know about the current request
#[derive(Debug, Clone)]
pub struct AttemptContext {
    pub platform: Platform,
    pub url: CanonicalUrl,
    /// Final cache path; strategies that write files write exactly here
    pub target: PathBuf,
}

/// Core trait for all extraction strategies
///
/// A strategy wraps one third-party mechanism (yt-dlp, a mirror page, a
/// vendor API) and either hands back a direct media URL or stores the video
/// at `ctx.target` itself. Failures are always classified, never raised.
#[async_trait]
pub trait Strategy: Send + Sync {
    /// Returns a unique identifier for this strategy (e.g., "ytdlp", "savetik")
    fn id(&self) -> &'static str;

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure>;
}
