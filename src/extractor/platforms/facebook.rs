//! Facebook: share ids are redirect-resolved, then yt-dlp and fsave

use crate::extractor::models::CanonicalUrl;
use crate::extractor::resolver::Shape;
use crate::extractor::scrape::{UrlRule, VendorSchema};
use crate::extractor::traits::Strategy;
use crate::extractor::vendor::{VendorApi, VendorMethod};
use crate::extractor::ytdlp::YtDlpStrategy;
use crate::utils::config::Settings;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

pub static SHAPES: Lazy<Vec<Shape>> = Lazy::new(|| {
    vec![
        Shape::new(
            "share-id",
            r"^([A-Za-z0-9]{10})$",
            "https://www.facebook.com/share/r/${1}/",
            "${1}",
        )
        .share_link(),
        Shape::new(
            "reel",
            r"^reel/(\d+)$",
            "https://www.facebook.com/reel/${1}",
            "${1}",
        ),
        Shape::new(
            "reel-id",
            r"^([A-Za-z0-9_.-]+)$",
            "https://www.facebook.com/reel/${1}",
            "${1}",
        ),
    ]
});

static FINAL_ID: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"facebook\.com/(?:reel/|watch/?\?v=|[^/?]+/videos/|videos/)(\d+)").unwrap()
});

/// Reel URL for wherever a share link ended up
pub fn from_final_url(final_url: &str) -> Option<CanonicalUrl> {
    let id = FINAL_ID.captures(final_url)?.get(1)?.as_str();
    Some(CanonicalUrl::new(
        format!("https://www.facebook.com/reel/{}", id),
        id,
    ))
}

pub static FSAVE: VendorSchema = VendorSchema {
    name: "fsave",
    success: None,
    rules: &[UrlRule::Key("/api/previewUrl")],
};

pub fn strategies(settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(YtDlpStrategy::new("ytdlp", settings.clone())),
        Arc::new(VendorApi::new(
            "fsave",
            client.clone(),
            settings.clone(),
            VendorMethod::PostForm,
            settings.endpoints.fsave_api.clone(),
            &FSAVE,
        )),
    ]
}
