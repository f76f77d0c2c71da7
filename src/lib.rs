//! Reelfetch library
//!
//! Fetches short videos from TikTok, X, Facebook, Instagram and Threads by
//! post identifier. Each platform has an ordered chain of extraction
//! strategies; results are cached on disk and expired by a sweeper.

pub mod app;
pub mod cache;
pub mod downloader;
pub mod extractor;
pub mod utils;

// Re-export main types for easier use
pub use app::App;
pub use cache::{MediaCache, RetentionSweeper, SweepReport};
pub use downloader::{DownloadConfig, DownloadEngine, Downloader};
pub use extractor::{
    CanonicalUrl, FallbackChain, FetchOutcome, MediaAsset, Platform, PostReference, Strategy,
};
pub use utils::{ExtractionFailure, MalformedIdError, ReelfetchError, Settings};
