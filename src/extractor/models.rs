//! Data structures shared by the resolver, the strategies and the cache

use crate::utils::error::ExtractionFailure;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Supported social platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Platform {
    TikTok,
    X,
    Facebook,
    Instagram,
    Threads,
}

impl Platform {
    pub const ALL: [Platform; 5] = [
        Platform::TikTok,
        Platform::X,
        Platform::Facebook,
        Platform::Instagram,
        Platform::Threads,
    ];

    /// Leading path segment that selects this platform (`/t/...`, `/x/...`)
    pub fn route_prefix(&self) -> &'static str {
        match self {
            Platform::TikTok => "t",
            Platform::X => "x",
            Platform::Facebook => "f",
            Platform::Instagram => "i",
            Platform::Threads => "h",
        }
    }

    pub fn from_route_prefix(prefix: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.route_prefix() == prefix)
    }

    /// Cache sub-directory name
    pub fn dir_name(&self) -> &'static str {
        match self {
            Platform::TikTok => "tiktok",
            Platform::X => "x",
            Platform::Facebook => "facebook",
            Platform::Instagram => "instagram",
            Platform::Threads => "threads",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Platform::TikTok => "TikTok",
            Platform::X => "X",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
            Platform::Threads => "Threads",
        };
        f.write_str(name)
    }
}

/// A post identifier exactly as the caller gave it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PostReference {
    platform: Platform,
    raw_id: String,
}

impl PostReference {
    pub fn new(platform: Platform, raw_id: impl Into<String>) -> Self {
        Self {
            platform,
            raw_id: raw_id.into(),
        }
    }

    /// Split a request path such as `/x/1234` into platform and identifier.
    ///
    /// Paths without a known prefix are TikTok identifiers, so
    /// `/@user/video/1` and `/t/@user/video/1` are equivalent. The leading
    /// `t` is always taken as the TikTok prefix: `/t/ZT2abc` is the short code
    /// `ZT2abc`, and a `tiktok.com/t/<code>` link is requested as `/t/t/<code>`.
    pub fn from_route(path: &str) -> Self {
        let trimmed = path.trim().trim_start_matches('/');
        if let Some((prefix, rest)) = trimmed.split_once('/') {
            if let Some(platform) = Platform::from_route_prefix(prefix) {
                return Self::new(platform, rest);
            }
        }
        Self::new(Platform::TikTok, trimmed)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn raw_id(&self) -> &str {
        &self.raw_id
    }
}

/// Resolved post URL plus the key its video is cached under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CanonicalUrl {
    url: String,
    media_key: String,
    share_link: bool,
}

impl CanonicalUrl {
    pub fn new(url: impl Into<String>, media_key: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            media_key: media_key.into(),
            share_link: false,
        }
    }

    /// A short share link whose real post id is only known after following
    /// its redirects.
    pub fn share(url: impl Into<String>, media_key: impl Into<String>) -> Self {
        Self {
            share_link: true,
            ..Self::new(url, media_key)
        }
    }

    pub fn as_str(&self) -> &str {
        &self.url
    }

    pub fn media_key(&self) -> &str {
        &self.media_key
    }

    pub fn is_share_link(&self) -> bool {
        self.share_link
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.url)
    }
}

/// A video sitting in the local cache
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaAsset {
    pub platform: Platform,
    pub media_id: String,
    pub extension: String,
    pub path: PathBuf,
    pub size: u64,
    pub modified: DateTime<Utc>,
}

impl MediaAsset {
    /// Served content type for every cached video
    pub const CONTENT_TYPE: &'static str = "video/mp4";
    pub const EXTENSION: &'static str = "mp4";
}

/// Where a successful strategy left the media
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MediaLocation {
    /// Direct media URL the chain still has to download
    Remote(String),
    /// File already written by the strategy
    Stored(PathBuf),
}

/// Outcome of one strategy within a request
#[derive(Debug, Clone)]
pub struct ExtractionAttempt {
    pub strategy: &'static str,
    pub elapsed: Duration,
    pub outcome: Result<(), ExtractionFailure>,
}

impl ExtractionAttempt {
    pub fn succeeded(&self) -> bool {
        self.outcome.is_ok()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn route_prefix_selects_platform() {
        let post = PostReference::from_route("/x/1790000000000000000");
        assert_eq!(post.platform(), Platform::X);
        assert_eq!(post.raw_id(), "1790000000000000000");

        let post = PostReference::from_route("/h/DS-74VmCbK9");
        assert_eq!(post.platform(), Platform::Threads);
        assert_eq!(post.raw_id(), "DS-74VmCbK9");
    }

    #[test]
    fn bare_path_defaults_to_tiktok() {
        let post = PostReference::from_route("/@drielita/video/7498636088018210070");
        assert_eq!(post.platform(), Platform::TikTok);
        assert_eq!(post.raw_id(), "@drielita/video/7498636088018210070");

        let post = PostReference::from_route("ZNd5tth8o");
        assert_eq!(post.platform(), Platform::TikTok);
        assert_eq!(post.raw_id(), "ZNd5tth8o");
    }

    #[test]
    fn tiktok_prefix_is_stripped() {
        let post = PostReference::from_route("/t/l/7498636088018210070");
        assert_eq!(post.platform(), Platform::TikTok);
        assert_eq!(post.raw_id(), "l/7498636088018210070");
    }

    #[test]
    fn every_platform_round_trips_its_prefix() {
        for platform in Platform::ALL {
            assert_eq!(
                Platform::from_route_prefix(platform.route_prefix()),
                Some(platform)
            );
        }
        assert_eq!(Platform::from_route_prefix("l"), None);
    }
}
