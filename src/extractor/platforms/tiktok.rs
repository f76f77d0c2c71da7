//! TikTok: five tiers, yt-dlp twice before the mirror and vendor APIs

use super::capture_id;
use crate::extractor::mirror::MirrorPage;
use crate::extractor::models::CanonicalUrl;
use crate::extractor::resolver::Shape;
use crate::extractor::scrape::{Expected, MetaTag, SuccessMarker, UrlRule, VendorSchema};
use crate::extractor::traits::Strategy;
use crate::extractor::vendor::{VendorApi, VendorMethod};
use crate::extractor::ytdlp::YtDlpStrategy;
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::Client;
use std::sync::Arc;

pub static SHAPES: Lazy<Vec<Shape>> = Lazy::new(|| {
    vec![
        Shape::new(
            "l-link",
            r"^l/(\d+)$",
            "https://www.tiktok.com/l/${1}",
            "${1}",
        ),
        Shape::new(
            "user-video",
            r"^(@[^/]+)/video/(\d+)$",
            "https://www.tiktok.com/${1}/video/${2}",
            "${2}",
        ),
        Shape::new(
            "t-link",
            r"^t/([A-Za-z0-9_-]+)$",
            "https://www.tiktok.com/t/${1}",
            "${1}",
        ),
        Shape::new(
            "numeric",
            r"^(\d{15,})$",
            "https://www.tiktok.com/@/video/${1}",
            "${1}",
        ),
        Shape::new(
            "short-code",
            r"^([A-Za-z0-9]+)$",
            "https://vm.tiktok.com/${1}",
            "${1}",
        ),
    ]
});

static VIDEO_ID: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"tiktok\.com/(?:@[^/]*/)?(?:video|l)/(\d+)").unwrap());

/// Numeric video id from a canonical TikTok URL
pub fn video_id(url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    capture_id(&VIDEO_ID, url)
}

fn embed_url(url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    Ok(format!("https://www.tiktok.com/embed/v2/{}", video_id(url)?))
}

fn tnktok_page(settings: &Settings, url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    Ok(format!(
        "{}/{}",
        settings.endpoints.tnktok.trim_end_matches('/'),
        video_id(url)?
    ))
}

pub static SAVETIK: VendorSchema = VendorSchema {
    name: "savetik",
    success: Some(SuccessMarker {
        pointer: "/status_code",
        expected: Expected::Int(0),
    }),
    rules: &[UrlRule::Key("/hdDownloadUrl"), UrlRule::Key("/downloadUrl")],
};

pub static SNAPTIK: VendorSchema = VendorSchema {
    name: "snaptik",
    success: None,
    rules: &[
        UrlRule::Key("/video"),
        UrlRule::Key("/url"),
        UrlRule::Key("/download_url"),
        UrlRule::KeyWhen {
            guard: "/status",
            equals: "success",
            key: "/data/0/video",
        },
        UrlRule::KeyWhen {
            guard: "/status",
            equals: "success",
            key: "/data/0/url",
        },
    ],
};

pub static TTDOWNLOADER: VendorSchema = VendorSchema {
    name: "ttdownloader",
    success: None,
    rules: &[
        UrlRule::Key("/download_url"),
        UrlRule::Key("/video"),
        UrlRule::Key("/url"),
    ],
};

pub fn strategies(settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    let endpoints = &settings.endpoints;
    vec![
        Arc::new(
            YtDlpStrategy::new("ytdlp-tiktok", settings.clone())
                .with_args(settings.tiktok_ytdlp_args.clone()),
        ),
        Arc::new(YtDlpStrategy::new("ytdlp-tiktok-embed", settings.clone()).with_source(embed_url)),
        Arc::new(MirrorPage::new(
            "tnktok",
            client.clone(),
            settings.clone(),
            tnktok_page,
            &[MetaTag::OgVideo],
        )),
        Arc::new(VendorApi::new(
            "savetik",
            client.clone(),
            settings.clone(),
            VendorMethod::Get,
            endpoints.savetik_api.clone(),
            &SAVETIK,
        )),
        Arc::new(
            VendorApi::new(
                "snaptik",
                client.clone(),
                settings.clone(),
                VendorMethod::PostForm,
                endpoints.snaptik_api.clone(),
                &SNAPTIK,
            )
            .accepting_plain_url(),
        ),
        Arc::new(VendorApi::new(
            "ttdownloader",
            client.clone(),
            settings.clone(),
            VendorMethod::PostForm,
            endpoints.ttdownloader_api.clone(),
            &TTDOWNLOADER,
        )),
    ]
}
