//! X (Twitter): yt-dlp, then the fxtwitter mirror

use super::capture_id;
use crate::extractor::mirror::MirrorPage;
use crate::extractor::models::CanonicalUrl;
use crate::extractor::resolver::Shape;
use crate::extractor::scrape::MetaTag;
use crate::extractor::traits::Strategy;
use crate::extractor::ytdlp::YtDlpStrategy;
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

// `i/status` must come first, "i" is also a valid user name
pub static SHAPES: Lazy<Vec<Shape>> = Lazy::new(|| {
    vec![
        Shape::new(
            "status",
            r"^(?:i/status/)?(\d+)$",
            "https://x.com/i/status/${1}",
            "${1}",
        ),
        Shape::new(
            "user-status",
            r"^([A-Za-z0-9_]+)/status/(\d+)$",
            "https://x.com/${1}/status/${2}",
            "${2}",
        ),
    ]
});

static STATUS_ID: Lazy<Regex> = Lazy::new(|| Regex::new(r"/status/(\d+)").unwrap());

const FXTWITTER_TAGS: &[MetaTag] = &[
    MetaTag::TwitterPlayerStream,
    MetaTag::OgVideo,
    MetaTag::OgVideoSecureUrl,
];

fn fxtwitter_page(settings: &Settings, url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    Ok(format!(
        "{}/i/status/{}",
        settings.endpoints.fxtwitter.trim_end_matches('/'),
        capture_id(&STATUS_ID, url)?
    ))
}

pub fn strategies(settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(YtDlpStrategy::new("ytdlp", settings.clone())),
        Arc::new(MirrorPage::new(
            "fxtwitter",
            client.clone(),
            settings.clone(),
            fxtwitter_page,
            FXTWITTER_TAGS,
        )),
    ]
}
