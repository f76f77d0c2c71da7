use crate::extractor::models::{MediaAsset, Platform};
use crate::utils::config::MinSizes;
use chrono::{DateTime, Utc};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, warn};
use uuid::Uuid;

/// On-disk video cache, one directory per platform
#[derive(Debug, Clone)]
pub struct MediaCache {
    root: PathBuf,
    min_sizes: MinSizes,
}

impl MediaCache {
    pub fn new(root: impl Into<PathBuf>, min_sizes: MinSizes) -> Self {
        Self {
            root: root.into(),
            min_sizes,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn platform_dir(&self, platform: Platform) -> PathBuf {
        self.root.join(platform.dir_name())
    }

    /// `<root>/<platform>/<media id>.mp4`
    pub fn target_path(&self, platform: Platform, media_id: &str) -> PathBuf {
        self.platform_dir(platform)
            .join(format!("{}.{}", media_id, MediaAsset::EXTENSION))
    }

    /// Unique scratch file next to the target, never named like a hit
    pub fn partial_path(&self, platform: Platform, media_id: &str) -> PathBuf {
        self.platform_dir(platform)
            .join(format!("{}.{}.part", media_id, Uuid::new_v4()))
    }

    /// Smallest file size accepted as a valid video
    pub fn min_size(&self, platform: Platform) -> u64 {
        self.min_sizes.for_platform(platform).max(1)
    }

    pub async fn ensure_dirs(&self) -> io::Result<()> {
        for platform in Platform::ALL {
            fs::create_dir_all(self.platform_dir(platform)).await?;
        }
        Ok(())
    }

    /// A cached video, if one exists and is large enough to be real
    pub async fn lookup(&self, platform: Platform, media_id: &str) -> Option<MediaAsset> {
        let path = self.target_path(platform, media_id);
        let meta = fs::metadata(&path).await.ok()?;
        if !meta.is_file() {
            return None;
        }

        let size = meta.len();
        if size < self.min_size(platform) {
            debug!(
                "Ignoring undersized cache entry {} ({} bytes)",
                path.display(),
                size
            );
            return None;
        }

        let modified = meta
            .modified()
            .map(DateTime::<Utc>::from)
            .unwrap_or_else(|_| Utc::now());

        Some(MediaAsset {
            platform,
            media_id: media_id.to_string(),
            extension: MediaAsset::EXTENSION.to_string(),
            path,
            size,
            modified,
        })
    }

    /// Remove a file if present; a missing file is not an error
    pub async fn discard(&self, path: &Path) {
        match fs::remove_file(path).await {
            Ok(()) => debug!("Removed {}", path.display()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => {}
            Err(e) => warn!("Could not remove {}: {}", path.display(), e),
        }
    }
}
