//! Application configuration

use crate::extractor::models::Platform;
use crate::utils::error::ReelfetchError;
use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, info};

/// Application settings, loaded once at startup and shared read-only.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Root of the video cache (one sub-directory per platform)
    pub cache_dir: PathBuf,

    /// Seconds between two retention sweeps
    pub sweep_interval_secs: u64,

    /// Cached files older than this many seconds are deleted
    pub max_age_secs: u64,

    /// Timeout for HTML pages and vendor APIs
    pub page_timeout_secs: u64,

    /// Timeout for media downloads
    pub media_timeout_secs: u64,

    /// Timeout for one yt-dlp run
    pub ytdlp_timeout_secs: u64,

    pub user_agent: String,
    pub accept_language: String,

    /// Explicit yt-dlp binary; searched on PATH when unset
    pub ytdlp_path: Option<PathBuf>,

    /// Extra yt-dlp arguments for the first TikTok tier
    pub tiktok_ytdlp_args: Vec<String>,

    /// Number of job status requests made to Publer
    pub publer_poll_attempts: u32,

    /// Fixed pause between two Publer status requests
    pub publer_poll_interval_ms: u64,

    pub min_sizes: MinSizes,
    pub endpoints: Endpoints,
    pub tokens: Tokens,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: PathBuf::from("./videos"),
            sweep_interval_secs: 300,
            max_age_secs: 180,
            page_timeout_secs: 30,
            media_timeout_secs: 120,
            ytdlp_timeout_secs: 600,
            user_agent:
                "Mozilla/5.0 (X11; Linux x86_64; rv:147.0) Gecko/20100101 Firefox/147.0"
                    .to_string(),
            accept_language: "es-ES,es;q=0.9,en-US;q=0.8,en;q=0.7".to_string(),
            ytdlp_path: None,
            tiktok_ytdlp_args: vec![
                "--extractor-args".to_string(),
                "tiktok:api_hostname=api16-normal-c-useast1a.tiktokv.com".to_string(),
            ],
            publer_poll_attempts: 6,
            publer_poll_interval_ms: 2000,
            min_sizes: MinSizes::default(),
            endpoints: Endpoints::default(),
            tokens: Tokens::default(),
        }
    }
}

/// Smallest file accepted per platform, in bytes
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct MinSizes {
    pub tiktok: u64,
    pub x: u64,
    pub facebook: u64,
    pub instagram: u64,
    pub threads: u64,
}

impl Default for MinSizes {
    fn default() -> Self {
        Self {
            tiktok: 10 * 1024,
            x: 10 * 1024,
            facebook: 1024,
            instagram: 1024,
            threads: 1024,
        }
    }
}

impl MinSizes {
    pub fn for_platform(&self, platform: Platform) -> u64 {
        match platform {
            Platform::TikTok => self.tiktok,
            Platform::X => self.x,
            Platform::Facebook => self.facebook,
            Platform::Instagram => self.instagram,
            Platform::Threads => self.threads,
        }
    }
}

/// Third-party services used by the fallback strategies
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Endpoints {
    pub savetik_api: String,
    pub snaptik_api: String,
    pub ttdownloader_api: String,
    pub tnktok: String,
    pub fxtwitter: String,
    pub fsave_api: String,
    pub vxinstagram: String,
    pub savegram_api: String,
    pub publer_job: String,
    pub publer_status: String,
    pub publer_worker: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Self {
            savetik_api: "https://savetik.net/api/action".to_string(),
            snaptik_api: "https://snaptik.app/api.php".to_string(),
            ttdownloader_api: "https://ttdownloader.com/api.php".to_string(),
            tnktok: "https://vt.tnktok.com".to_string(),
            fxtwitter: "https://fxtwitter.com".to_string(),
            fsave_api: "https://fsave.net/proxy.php".to_string(),
            vxinstagram: "https://vxinstagram.com".to_string(),
            savegram_api: "https://savegram.app/api/ajaxSearch".to_string(),
            publer_job: "https://app.publer.com/tools/media".to_string(),
            publer_status: "https://app.publer.com/api/v1/job_status".to_string(),
            publer_worker: "https://publer-media-downloader.kalemi-code4806.workers.dev/"
                .to_string(),
        }
    }
}

/// Vendor credentials. Strategies needing a missing token fail fast.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Tokens {
    pub publer: Option<String>,
    pub savegram_k_exp: Option<String>,
    pub savegram_k_token: Option<String>,
}

impl Settings {
    /// Load settings from an optional TOML file, falling back to defaults.
    pub fn load(path: Option<&Path>) -> Result<Self, ReelfetchError> {
        let settings = match path {
            Some(path) => {
                info!("Loading configuration from {}", path.display());
                let raw = std::fs::read_to_string(path)?;
                Self::from_toml(&raw)?
            }
            None => Self::default(),
        };
        Ok(settings.validated())
    }

    pub fn from_toml(raw: &str) -> Result<Self, ReelfetchError> {
        let settings: Settings = toml::from_str(raw)?;
        Ok(settings.validated())
    }

    /// Enforce sane minimums and make the cache path absolute.
    pub fn validated(mut self) -> Self {
        if self.sweep_interval_secs == 0 {
            self.sweep_interval_secs = 1;
        }
        if self.publer_poll_attempts == 0 {
            self.publer_poll_attempts = 1;
        }
        if let Ok(abs) = self.cache_dir.absolutize() {
            self.cache_dir = abs.into_owned();
        }
        debug!("Effective cache directory: {}", self.cache_dir.display());
        self
    }

    pub fn page_timeout(&self) -> Duration {
        Duration::from_secs(self.page_timeout_secs)
    }

    pub fn media_timeout(&self) -> Duration {
        Duration::from_secs(self.media_timeout_secs)
    }

    pub fn ytdlp_timeout(&self) -> Duration {
        Duration::from_secs(self.ytdlp_timeout_secs)
    }

    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_secs(self.max_age_secs)
    }

    pub fn publer_poll_interval(&self) -> Duration {
        Duration::from_millis(self.publer_poll_interval_ms)
    }
}
