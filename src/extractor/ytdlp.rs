//! yt-dlp wrapper for video extraction
//!
//! The generic extractor tier of every chain except Threads. yt-dlp writes
//! the video straight to the cache path. Its stderr decides whether a failure
//! means the post is gone or the extractor broke.

use crate::extractor::models::{CanonicalUrl, MediaLocation};
use crate::extractor::traits::{AttemptContext, Strategy};
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command as AsyncCommand;
use tokio::time::timeout;
use tracing::{debug, error, info, warn};

/// Maps the canonical URL to the URL handed to yt-dlp
pub type SourceFn = fn(&CanonicalUrl) -> Result<String, ExtractionFailure>;

fn canonical_source(url: &CanonicalUrl) -> Result<String, ExtractionFailure> {
    Ok(url.as_str().to_string())
}

/// Generic extractor strategy backed by the yt-dlp binary
pub struct YtDlpStrategy {
    id: &'static str,
    settings: Arc<Settings>,
    extra_args: Vec<String>,
    source: SourceFn,
}

impl YtDlpStrategy {
    pub fn new(id: &'static str, settings: Arc<Settings>) -> Self {
        Self {
            id,
            settings,
            extra_args: Vec::new(),
            source: canonical_source,
        }
    }

    pub fn with_args(mut self, args: Vec<String>) -> Self {
        self.extra_args = args;
        self
    }

    /// Run yt-dlp on a different URL than the canonical one
    pub fn with_source(mut self, source: SourceFn) -> Self {
        self.source = source;
        self
    }

    fn binary(&self) -> Option<PathBuf> {
        match &self.settings.ytdlp_path {
            Some(path) => Some(path.clone()),
            None => find_ytdlp(),
        }
    }

    /// Full argument list for one run
    pub fn build_args(&self, source: &str, target: &Path) -> Vec<String> {
        let mut args = vec![
            "-f".to_string(),
            "best[ext=mp4]/best".to_string(),
            "--merge-output-format".to_string(),
            "mp4".to_string(),
            "--no-playlist".to_string(),
            "--no-mtime".to_string(),
            "--no-progress".to_string(),
            "--no-warnings".to_string(),
            "--quiet".to_string(),
            "-o".to_string(),
            output_template(target),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(source.to_string());
        args
    }
}

#[async_trait]
impl Strategy for YtDlpStrategy {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure> {
        let source = (self.source)(&ctx.url)?;
        let ytdlp = self.binary().ok_or_else(|| {
            error!("yt-dlp not found anywhere!");
            ExtractionFailure::download("yt-dlp not found. Please install yt-dlp")
        })?;

        info!(strategy = self.id, "Running yt-dlp for {}", source);
        let mut cmd = AsyncCommand::new(&ytdlp);
        cmd.args(self.build_args(&source, &ctx.target))
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match timeout(self.settings.ytdlp_timeout(), cmd.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(e)) => {
                return Err(ExtractionFailure::download(format!(
                    "Failed to run yt-dlp: {}",
                    e
                )))
            }
            Err(_) => {
                return Err(ExtractionFailure::download(format!(
                    "yt-dlp timed out after {} seconds",
                    self.settings.ytdlp_timeout_secs
                )))
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!(strategy = self.id, "yt-dlp extraction failed: {}", stderr.trim());
            return Err(classify_stderr(&stderr));
        }

        if !tokio::fs::try_exists(&ctx.target).await.unwrap_or(false) {
            return Err(ExtractionFailure::download(
                "yt-dlp finished but produced no file",
            ));
        }

        debug!(strategy = self.id, "yt-dlp wrote {}", ctx.target.display());
        Ok(MediaLocation::Stored(ctx.target.clone()))
    }
}

/// yt-dlp treats `%` as a template marker; the cache path is literal.
fn output_template(target: &Path) -> String {
    target.to_string_lossy().replace('%', "%%")
}

/// Decide from yt-dlp's stderr whether the post itself is unavailable.
pub fn classify_stderr(stderr: &str) -> ExtractionFailure {
    const GONE: [&str; 7] = [
        "http error 404",
        "not available",
        "does not exist",
        "has been removed",
        "private",
        "no video formats found",
        "unsupported url",
    ];

    let lower = stderr.to_lowercase();
    let line = stderr
        .lines()
        .rev()
        .find(|l| l.contains("ERROR"))
        .unwrap_or_else(|| stderr.trim())
        .to_string();

    if GONE.iter().any(|marker| lower.contains(marker)) {
        ExtractionFailure::NotFound(line)
    } else {
        ExtractionFailure::DownloadError(format!("yt-dlp failed: {}", line))
    }
}

// ============================================================
// yt-dlp Detection Functions
// ============================================================

/// Find yt-dlp binary with priority:
/// 1. Next to the executable
/// 2. System PATH
/// 3. Common installation paths
pub fn find_ytdlp() -> Option<PathBuf> {
    if let Some(local) = find_next_to_exe() {
        debug!("Using yt-dlp next to executable: {:?}", local);
        return Some(local);
    }

    if let Ok(path) = which::which("yt-dlp") {
        debug!("Using system yt-dlp: {:?}", path);
        return Some(path);
    }

    if let Some(common) = find_in_common_paths() {
        debug!("Using yt-dlp from common path: {:?}", common);
        return Some(common);
    }

    None
}

fn find_next_to_exe() -> Option<PathBuf> {
    let exe_path = std::env::current_exe().ok()?;
    let candidate = exe_path.parent()?.join("yt-dlp");
    is_executable(&candidate).then_some(candidate)
}

fn find_in_common_paths() -> Option<PathBuf> {
    let mut candidates = vec![
        PathBuf::from("/usr/local/bin/yt-dlp"),
        PathBuf::from("/usr/bin/yt-dlp"),
        PathBuf::from("/opt/homebrew/bin/yt-dlp"),
    ];
    if let Some(home) = dirs::home_dir() {
        candidates.push(home.join(".local").join("bin").join("yt-dlp"));
    }

    candidates.into_iter().find(|p| is_executable(p))
}

/// Check if a file is executable
fn is_executable(path: &Path) -> bool {
    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        std::fs::metadata(path)
            .map(|m| m.is_file() && m.permissions().mode() & 0o111 != 0)
            .unwrap_or(false)
    }

    #[cfg(not(unix))]
    {
        path.is_file()
    }
}
