use crate::extractor::http::{fetch_text, page_headers};
use crate::extractor::models::{CanonicalUrl, MediaLocation};
use crate::extractor::scrape::{first_meta_video, MetaTag};
use crate::extractor::traits::{AttemptContext, Strategy};
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Builds the mirror page URL for a post
pub type PageUrlFn = fn(&Settings, &CanonicalUrl) -> Result<String, ExtractionFailure>;

/// Turns the raw meta tag content into the media URL
pub type ContentFn = fn(String) -> Option<String>;

/// Scrapes a mirror/proxy page for video meta tags
///
/// The page URL and the tag priority are per platform; the first tag found
/// gives the direct media URL.
pub struct MirrorPage {
    id: &'static str,
    client: Client,
    settings: Arc<Settings>,
    page_url: PageUrlFn,
    tags: &'static [MetaTag],
    content: ContentFn,
}

impl MirrorPage {
    pub fn new(
        id: &'static str,
        client: Client,
        settings: Arc<Settings>,
        page_url: PageUrlFn,
        tags: &'static [MetaTag],
    ) -> Self {
        Self {
            id,
            client,
            settings,
            page_url,
            tags,
            content: Some,
        }
    }

    /// Post-process the tag content (e.g. unwrap a redirect parameter)
    pub fn with_content(mut self, content: ContentFn) -> Self {
        self.content = content;
        self
    }

    /// Pure part of the strategy: page HTML to media URL
    pub fn video_url_from_html(&self, html: &str) -> Result<String, ExtractionFailure> {
        let tags_with_content = self.tags.iter().find_map(|tag| {
            first_meta_video(html, std::slice::from_ref(tag))
                .and_then(|(_, content)| (self.content)(content))
        });

        tags_with_content.ok_or_else(|| {
            ExtractionFailure::not_found(format!("No video meta tag found on {} page", self.id))
        })
    }
}

#[async_trait]
impl Strategy for MirrorPage {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure> {
        let page = (self.page_url)(&self.settings, &ctx.url)?;
        info!(strategy = self.id, "Fetching mirror page {}", page);

        let request = self
            .client
            .get(&page)
            .headers(page_headers(&self.settings))
            .timeout(self.settings.page_timeout());
        let html = fetch_text(request, self.id).await?;
        debug!(strategy = self.id, "HTML content length: {} characters", html.len());

        let url = self.video_url_from_html(&html)?;
        info!(strategy = self.id, "Extracted video URL: {}", url);
        Ok(MediaLocation::Remote(url))
    }
}
