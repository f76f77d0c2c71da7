//! Identifier → canonical URL resolution
//!
//! Each platform lists the identifier shapes it accepts, most specific
//! first. The first shape whose pattern matches the whole identifier wins and
//! its templates (regex `${n}` expansion) produce the URL and the cache key.

use crate::extractor::models::{CanonicalUrl, Platform, PostReference};
use crate::extractor::platforms::{facebook, instagram, threads, tiktok, x};
use crate::utils::error::MalformedIdError;
use regex::Regex;
use tracing::debug;

/// One accepted identifier shape
pub struct Shape {
    pub name: &'static str,
    pattern: Regex,
    url_template: &'static str,
    key_template: &'static str,
    share_link: bool,
}

impl Shape {
    pub fn new(
        name: &'static str,
        pattern: &str,
        url_template: &'static str,
        key_template: &'static str,
    ) -> Self {
        Self {
            name,
            pattern: Regex::new(pattern).expect("invalid identifier shape"),
            url_template,
            key_template,
            share_link: false,
        }
    }

    /// Mark the produced URL as a share link needing redirect resolution
    pub fn share_link(mut self) -> Self {
        self.share_link = true;
        self
    }

    pub fn apply(&self, raw: &str) -> Option<CanonicalUrl> {
        let caps = self.pattern.captures(raw)?;
        let mut url = String::new();
        caps.expand(self.url_template, &mut url);
        let mut key = String::new();
        caps.expand(self.key_template, &mut key);

        Some(if self.share_link {
            CanonicalUrl::share(url, key)
        } else {
            CanonicalUrl::new(url, key)
        })
    }
}

fn shapes_for(platform: Platform) -> &'static [Shape] {
    match platform {
        Platform::TikTok => tiktok::SHAPES.as_slice(),
        Platform::X => x::SHAPES.as_slice(),
        Platform::Facebook => facebook::SHAPES.as_slice(),
        Platform::Instagram => instagram::SHAPES.as_slice(),
        Platform::Threads => threads::SHAPES.as_slice(),
    }
}

/// Resolve a raw identifier to its canonical post URL
pub fn resolve(platform: Platform, raw_id: &str) -> Result<CanonicalUrl, MalformedIdError> {
    let normalized = raw_id.trim().trim_matches('/');

    for shape in shapes_for(platform) {
        if let Some(url) = shape.apply(normalized) {
            debug!(
                "Resolved {} id {:?} via shape {} to {}",
                platform, normalized, shape.name, url
            );
            return Ok(url);
        }
    }

    Err(MalformedIdError {
        platform,
        raw: raw_id.to_string(),
    })
}

pub fn resolve_reference(post: &PostReference) -> Result<CanonicalUrl, MalformedIdError> {
    resolve(post.platform(), post.raw_id())
}
