//! Instagram: share links are redirect-resolved, then yt-dlp, vxinstagram
//! and savegram

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
use reqwest::{Client, Url};
use std::sync::Arc;

pub static SHAPES: Lazy<Vec<Shape>> = Lazy::new(|| {
    vec![
        Shape::new(
            "share",
            r"^share/(?:reel/)?([A-Za-z0-9_-]+)$",
            "https://www.instagram.com/share/reel/${1}/",
            "${1}",
        )
        .share_link(),
        Shape::new(
            "kind-code",
            r"^(p|reel|reels|tv)/([A-Za-z0-9_-]+)$",
            "https://www.instagram.com/${1}/${2}/",
            "${2}",
        ),
        Shape::new(
            "shortcode",
            r"^([A-Za-z0-9_-]+)$",
            "https://www.instagram.com/reel/${1}/",
            "${1}",
        ),
    ]
});

static SHORTCODE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"instagram\.com/(?:p|reel|reels|tv)/([^/?]+)").unwrap());

pub fn from_final_url(final_url: &str) -> Option<CanonicalUrl> {
    let code = SHORTCODE.captures(final_url)?.get(1)?.as_str();
    Some(CanonicalUrl::new(
        format!("https://www.instagram.com/reel/{}/", code),
        code,
    ))
}

fn vxinstagram_page(settings: &Settings, url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    Ok(format!(
        "{}/reel/{}",
        settings.endpoints.vxinstagram.trim_end_matches('/'),
        capture_id(&SHORTCODE, url)?
    ))
}

/// vxinstagram points its meta tags at a rapidsave proxy; the real media
/// URL is its `rapidsaveUrl` query parameter.
pub fn rapidsave_url(content: String) -> Option<String> {
    let proxy = Url::parse(&content).ok()?;
    proxy
        .query_pairs()
        .find(|(key, _)| key == "rapidsaveUrl")
        .map(|(_, value)| value.into_owned())
        .filter(|value| !value.is_empty())
}

fn savegram_params(
    settings: &Settings,
    url: &CanonicalUrl,
) -> Result<Vec<(&'static str, String)>, ExtractionFailure> {
    let (Some(k_exp), Some(k_token)) = (
        settings.tokens.savegram_k_exp.clone(),
        settings.tokens.savegram_k_token.clone(),
    ) else {
        return Err(ExtractionFailure::download("savegram token not configured"));
    };

    Ok(vec![
        ("k_exp", k_exp),
        ("k_token", k_token),
        ("q", url.as_str().to_string()),
        ("t", "media".to_string()),
        ("lang", "es".to_string()),
        ("v", "v2".to_string()),
    ])
}

const VXINSTAGRAM_TAGS: &[MetaTag] = &[MetaTag::OgVideo, MetaTag::OgVideoSecureUrl];

pub static SAVEGRAM: VendorSchema = VendorSchema {
    name: "savegram",
    success: Some(SuccessMarker {
        pointer: "/status",
        expected: Expected::Str("ok"),
    }),
    rules: &[UrlRule::Html {
        key: "/data",
        pattern: r#"<a href="([^"]+)"[^>]*class="abutton is-success[^"]*"[^>]*title="Descargar video""#,
    }],
};

pub fn strategies(settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(YtDlpStrategy::new("ytdlp", settings.clone())),
        Arc::new(
            MirrorPage::new(
                "vxinstagram",
                client.clone(),
                settings.clone(),
                vxinstagram_page,
                VXINSTAGRAM_TAGS,
            )
            .with_content(rapidsave_url),
        ),
        Arc::new(
            VendorApi::new(
                "savegram",
                client.clone(),
                settings.clone(),
                VendorMethod::PostForm,
                settings.endpoints.savegram_api.clone(),
                &SAVEGRAM,
            )
            .with_params(savegram_params),
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::models::Platform;
    use crate::extractor::resolver::resolve;
    use serde_json::json;

    #[test]
    fn share_forms_are_share_links() {
        for raw in ["share/BAcd_12-x", "share/reel/BAcd_12-x"] {
            let url = resolve(Platform::Instagram, raw).unwrap();
            assert!(url.is_share_link());
            assert_eq!(url.as_str(), "https://www.instagram.com/share/reel/BAcd_12-x/");
        }
    }

    #[test]
    fn kinds_are_preserved() {
        let url = resolve(Platform::Instagram, "p/C3xYz").unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/p/C3xYz/");
        let url = resolve(Platform::Instagram, "reels/C3xYz").unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/reels/C3xYz/");
        assert_eq!(url.media_key(), "C3xYz");
    }

    #[test]
    fn bare_code_is_a_reel() {
        let url = resolve(Platform::Instagram, "C3xYz_-1").unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/reel/C3xYz_-1/");
        assert!(resolve(Platform::Instagram, "stories/me/1").is_err());
    }

    #[test]
    fn final_url_becomes_reel() {
        let url = from_final_url("https://www.instagram.com/reel/DAbc123/?igsh=xyz").unwrap();
        assert_eq!(url.as_str(), "https://www.instagram.com/reel/DAbc123/");
        assert_eq!(url.media_key(), "DAbc123");
        assert!(from_final_url("https://www.instagram.com/accounts/login/").is_none());
    }

    #[test]
    fn vxinstagram_unwraps_rapidsave() {
        let page = MirrorPage::new(
            "vxinstagram",
            Client::new(),
            Arc::new(Settings::default()),
            vxinstagram_page,
            VXINSTAGRAM_TAGS,
        )
        .with_content(rapidsave_url);

        let html = r#"
            <meta property="og:video" content="https://vxinstagram.com/proxy?x=1">
            <meta property="og:video:secure_url" content="https://rapidsave.example/dl?rapidsaveUrl=https%3A%2F%2Fcdn.example%2Fv.mp4&amp;t=2">
        "#;
        assert_eq!(
            page.video_url_from_html(html).unwrap(),
            "https://cdn.example/v.mp4"
        );
    }

    #[test]
    fn vxinstagram_page_needs_a_shortcode() {
        let settings = Settings::default();
        let url = resolve(Platform::Instagram, "reel/C3xYz").unwrap();
        assert_eq!(
            vxinstagram_page(&settings, &url).unwrap(),
            "https://vxinstagram.com/reel/C3xYz"
        );

        let share = resolve(Platform::Instagram, "share/C3xYz").unwrap();
        assert!(vxinstagram_page(&settings, &share).is_err());
    }

    #[test]
    fn savegram_requires_tokens() {
        let url = resolve(Platform::Instagram, "C3xYz").unwrap();
        let mut settings = Settings::default();
        assert!(savegram_params(&settings, &url).is_err());

        settings.tokens.savegram_k_exp = Some("1750806645".into());
        settings.tokens.savegram_k_token = Some("abc".into());
        let params = savegram_params(&settings, &url).unwrap();
        assert!(params.contains(&("q", "https://www.instagram.com/reel/C3xYz/".to_string())));
        assert!(params.contains(&("t", "media".to_string())));
    }

    #[test]
    fn savegram_reads_download_anchor() {
        let body = json!({
            "status": "ok",
            "data": "<div><a href=\"https://dl.savegram.app/v.mp4\" rel=\"nofollow\" class=\"abutton is-success is-fullwidth\" title=\"Descargar video\">Descargar</a></div>"
        });
        assert_eq!(
            SAVEGRAM.download_url(&body).unwrap(),
            "https://dl.savegram.app/v.mp4"
        );

        let body = json!({"status": "error", "mess": "blocked"});
        assert!(SAVEGRAM.download_url(&body).unwrap_err().is_not_found());
    }
}
