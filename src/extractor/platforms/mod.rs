//! Per-platform identifier shapes and fallback strategy lists

pub mod facebook;
pub mod instagram;
pub mod threads;
pub mod tiktok;
pub mod x;

use crate::extractor::models::{CanonicalUrl, Platform};
use crate::extractor::traits::Strategy;
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

/// Strategies for a platform, in the order the chain tries them
pub fn strategies(platform: Platform, settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    match platform {
        Platform::TikTok => tiktok::strategies(settings, client),
        Platform::X => x::strategies(settings, client),
        Platform::Facebook => facebook::strategies(settings, client),
        Platform::Instagram => instagram::strategies(settings, client),
        Platform::Threads => threads::strategies(settings, client),
    }
}

/// Canonical URL for the post a share link redirected to, if the final URL
/// names one.
pub fn from_final_url(platform: Platform, final_url: &str) -> Option<CanonicalUrl> {
    match platform {
        Platform::Facebook => facebook::from_final_url(final_url),
        Platform::Instagram => instagram::from_final_url(final_url),
        _ => None,
    }
}

/// First capture group of `re` in the canonical URL, or the DownloadError a
/// strategy reports when it cannot find the id it needs.
pub(crate) fn capture_id(re: &Regex, url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    re.captures(url.as_str())
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
        .ok_or_else(|| ExtractionFailure::download("Could not extract video ID from URL"))
}
