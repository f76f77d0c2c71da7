//! Threads: no yt-dlp tier. The post page embeds its own video list; Publer
//! is the job-polling fallback.

use crate::extractor::http::{api_headers, fetch_text, page_headers, parse_json, truncate};
use crate::extractor::models::{CanonicalUrl, MediaLocation};
use crate::extractor::resolver::Shape;
use crate::extractor::traits::{AttemptContext, Strategy};
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use reqwest::{Client, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info, warn};

pub static SHAPES: Lazy<Vec<Shape>> = Lazy::new(|| {
    vec![
        Shape::new(
            "user-post",
            r"^(@[A-Za-z0-9_.]+)/post/([A-Za-z0-9_-]+)$",
            "https://www.threads.net/${1}/post/${2}",
            "${2}",
        ),
        Shape::new(
            "code",
            r"^([A-Za-z0-9_-]+)$",
            "https://www.threads.net/i/post/${1}",
            "${1}",
        ),
    ]
});

static SJS_SCRIPT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?s)<script[^>]*?type="application/json"[^>]*?data-sjs[^>]*?>(.*?)</script>"#)
        .unwrap()
});

static VIDEO_VERSIONS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#""video_versions":\s*(\[\{.*?\}\])"#).unwrap());

const VIDEO_VERSIONS_POINTER: &str =
    "/require/0/3/0/__bbox/result/data/data/edges/0/node/thread_items/0/post/video_versions";

/// Encodings Threads serves, best first
const PREFERRED_TYPES: [i64; 3] = [101, 102, 103];

#[derive(Debug, Clone, Deserialize)]
pub struct VideoVersion {
    #[serde(rename = "type")]
    pub kind: Option<i64>,
    pub url: Option<String>,
}

/// Best playable entry of a `video_versions` list
pub fn pick_version(versions: &[VideoVersion]) -> Option<String> {
    let with_url = |v: &&VideoVersion| v.url.as_deref().is_some_and(|u| !u.is_empty());

    PREFERRED_TYPES
        .iter()
        .find_map(|t| {
            versions
                .iter()
                .filter(with_url)
                .find(|v| v.kind == Some(*t))
        })
        .or_else(|| versions.iter().find(with_url))
        .and_then(|v| v.url.clone())
}

fn from_structured_json(html: &str) -> Option<String> {
    let raw = SJS_SCRIPT.captures(html)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw);
    let data: Value = serde_json::from_str(&decoded).ok()?;
    let versions: Vec<VideoVersion> =
        serde_json::from_value(data.pointer(VIDEO_VERSIONS_POINTER)?.clone()).ok()?;
    pick_version(&versions)
}

fn from_inline_versions(html: &str) -> Option<String> {
    VIDEO_VERSIONS.captures_iter(html).find_map(|caps| {
        let versions: Vec<VideoVersion> = serde_json::from_str(caps.get(1)?.as_str()).ok()?;
        pick_version(&versions)
    })
}

/// Video URL embedded in a Threads post page
pub fn video_url_from_html(html: &str) -> Result<String, ExtractionFailure> {
    if let Some(url) = from_structured_json(html) {
        debug!("Found video in data-sjs JSON");
        return Ok(url);
    }
    if let Some(url) = from_inline_versions(html) {
        debug!("Found video in inline video_versions");
        return Ok(url);
    }
    Err(ExtractionFailure::not_found("No video found in Threads post"))
}

/// Scrapes the post page itself
pub struct ThreadsPage {
    client: Client,
    settings: Arc<Settings>,
}

impl ThreadsPage {
    pub fn new(client: Client, settings: Arc<Settings>) -> Self {
        Self { client, settings }
    }
}

#[async_trait]
impl Strategy for ThreadsPage {
    fn id(&self) -> &'static str {
        "threads-page"
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure> {
        info!(strategy = self.id(), "Fetching Threads page {}", ctx.url);
        let request = self
            .client
            .get(ctx.url.as_str())
            .headers(page_headers(&self.settings))
            .timeout(self.settings.page_timeout());
        let html = fetch_text(request, "threads.net").await?;

        let url = video_url_from_html(&html)?;
        info!(strategy = self.id(), "Extracted video URL: {}", url);
        Ok(MediaLocation::Remote(url))
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct JobStatus {
    pub status: Option<String>,
    #[serde(default)]
    pub payload: Vec<JobPayload>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct JobPayload {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub path: Option<String>,
}

impl JobStatus {
    /// Media URL once the job is complete and produced a video
    pub fn ready_video(&self) -> Option<String> {
        if self.status.as_deref() != Some("complete") {
            return None;
        }
        let first = self.payload.first()?;
        if first.kind.as_deref() != Some("video") {
            return None;
        }
        first.path.clone().filter(|p| !p.is_empty())
    }
}

fn job_id(value: &Value) -> Option<String> {
    match value.get("job_id")? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// Proxy URL that streams the finished job's media
pub fn worker_url(worker: &str, media: &str) -> Result<String, ExtractionFailure> {
    Url::parse_with_params(worker, &[("url", media)])
        .map(String::from)
        .map_err(|e| ExtractionFailure::download(format!("Invalid Publer worker URL: {}", e)))
}

/// Third-party job API: submit, poll, fetch through a worker
pub struct Publer {
    client: Client,
    settings: Arc<Settings>,
}

impl Publer {
    pub fn new(client: Client, settings: Arc<Settings>) -> Self {
        Self { client, settings }
    }

    async fn create_job(&self, post: &CanonicalUrl, token: &str) -> Result<String, ExtractionFailure> {
        let request = self
            .client
            .post(&self.settings.endpoints.publer_job)
            .headers(api_headers(&self.settings, "https://publer.com"))
            .json(&json!({"url": post.as_str(), "token": token, "macOS": false}))
            .timeout(self.settings.page_timeout());
        let body = fetch_text(request, "publer").await?;
        let value = parse_json(&body, "publer")?;

        job_id(&value).ok_or_else(|| {
            debug!("Publer job response: {}", truncate(&body, 500));
            ExtractionFailure::download("No job_id received from Publer")
        })
    }

    async fn poll_once(&self, status_url: &str) -> Result<JobStatus, ExtractionFailure> {
        let request = self
            .client
            .get(status_url)
            .headers(api_headers(&self.settings, "https://publer.com"))
            .timeout(self.settings.page_timeout());
        let body = fetch_text(request, "publer").await?;
        Ok(serde_json::from_str(&body)?)
    }
}

#[async_trait]
impl Strategy for Publer {
    fn id(&self) -> &'static str {
        "publer"
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure> {
        let token = self
            .settings
            .tokens
            .publer
            .as_deref()
            .ok_or_else(|| ExtractionFailure::download("Publer token not configured"))?;

        let job = self.create_job(&ctx.url, token).await?;
        info!(strategy = self.id(), "Publer job {} created", job);

        let status_url = format!(
            "{}/{}",
            self.settings.endpoints.publer_status.trim_end_matches('/'),
            job
        );
        let attempts = self.settings.publer_poll_attempts;
        let mut media = None;

        for attempt in 0..attempts {
            if attempt > 0 {
                tokio::time::sleep(self.settings.publer_poll_interval()).await;
            }
            match self.poll_once(&status_url).await {
                Ok(status) => {
                    debug!(
                        strategy = self.id(),
                        "Publer status (attempt {}/{}): {:?}",
                        attempt + 1,
                        attempts,
                        status.status
                    );
                    if let Some(url) = status.ready_video() {
                        media = Some(url);
                        break;
                    }
                }
                Err(e) => warn!(strategy = self.id(), "Publer poll {} failed: {}", attempt + 1, e),
            }
        }

        let media = media.ok_or_else(|| {
            ExtractionFailure::download(format!(
                "Failed to get video URL from Publer after {} polling attempts",
                attempts
            ))
        })?;
        Ok(MediaLocation::Remote(worker_url(
            &self.settings.endpoints.publer_worker,
            &media,
        )?))
    }
}

pub fn strategies(settings: &Arc<Settings>, client: &Client) -> Vec<Arc<dyn Strategy>> {
    vec![
        Arc::new(ThreadsPage::new(client.clone(), settings.clone())),
        Arc::new(Publer::new(client.clone(), settings.clone())),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::models::Platform;
    use crate::extractor::resolver::resolve;

    #[test]
    fn code_and_user_post_resolve() {
        let url = resolve(Platform::Threads, "DS-74VmCbK9").unwrap();
        assert_eq!(url.as_str(), "https://www.threads.net/i/post/DS-74VmCbK9");

        let url = resolve(Platform::Threads, "@zuck/post/DS-74VmCbK9").unwrap();
        assert_eq!(url.as_str(), "https://www.threads.net/@zuck/post/DS-74VmCbK9");
        assert_eq!(url.media_key(), "DS-74VmCbK9");

        assert!(resolve(Platform::Threads, "zuck/post/x").is_err());
    }

    fn versions(raw: &str) -> Vec<VideoVersion> {
        serde_json::from_str(raw).unwrap()
    }

    #[test]
    fn hd_version_is_preferred() {
        let list = versions(
            r#"[{"type":103,"url":"https://sd3"},{"type":101,"url":"https://hd"},{"type":102,"url":"https://sd2"}]"#,
        );
        assert_eq!(pick_version(&list).as_deref(), Some("https://hd"));

        let list = versions(r#"[{"type":103,"url":"https://sd3"},{"type":102,"url":"https://sd2"}]"#);
        assert_eq!(pick_version(&list).as_deref(), Some("https://sd2"));

        let list = versions(r#"[{"type":7,"url":"https://other"}]"#);
        assert_eq!(pick_version(&list).as_deref(), Some("https://other"));

        assert_eq!(pick_version(&versions(r#"[{"type":101}]"#)), None);
    }

    #[test]
    fn structured_json_is_read_first() {
        let html = r#"<html><script type="application/json" data-sjs>{"require":[["x","y",null,[{"__bbox":{"result":{"data":{"data":{"edges":[{"node":{"thread_items":[{"post":{"video_versions":[{"type":101,"url":"https://cdn/hd.mp4?a=1&amp;b=2"}]}}]}}]}}}}}]]]}</script>
            "video_versions": [{"type":101,"url":"https://inline"}]</html>"#;
        assert_eq!(
            video_url_from_html(html).unwrap(),
            "https://cdn/hd.mp4?a=1&b=2"
        );
    }

    #[test]
    fn inline_versions_are_the_fallback() {
        let html = r#"<script>{"a":1,"video_versions": [{"type":102,"url":"https://sd"}], "b":2}</script>"#;
        assert_eq!(video_url_from_html(html).unwrap(), "https://sd");
    }

    #[test]
    fn page_without_video_is_not_found() {
        let err = video_url_from_html("<html><body>text post</body></html>").unwrap_err();
        assert!(err.is_not_found());
    }

    #[test]
    fn job_status_needs_complete_video() {
        let working: JobStatus = serde_json::from_str(r#"{"status":"working"}"#).unwrap();
        assert_eq!(working.ready_video(), None);

        let photo: JobStatus = serde_json::from_str(
            r#"{"status":"complete","payload":[{"type":"photo","path":"https://p"}]}"#,
        )
        .unwrap();
        assert_eq!(photo.ready_video(), None);

        let done: JobStatus = serde_json::from_str(
            r#"{"status":"complete","payload":[{"type":"video","path":"https://v.mp4"}]}"#,
        )
        .unwrap();
        assert_eq!(done.ready_video().as_deref(), Some("https://v.mp4"));
    }

    #[test]
    fn job_id_accepts_strings_and_numbers() {
        assert_eq!(job_id(&json!({"job_id": "abc"})).as_deref(), Some("abc"));
        assert_eq!(job_id(&json!({"job_id": 42})).as_deref(), Some("42"));
        assert_eq!(job_id(&json!({"error": "bad token"})), None);
    }

    #[test]
    fn worker_url_encodes_media() {
        let url = worker_url("https://worker.example/", "https://cdn.example/v.mp4?x=1&y=2").unwrap();
        assert_eq!(
            url,
            "https://worker.example/?url=https%3A%2F%2Fcdn.example%2Fv.mp4%3Fx%3D1%26y%3D2"
        );
    }

    #[tokio::test]
    async fn publer_without_token_fails_fast() {
        let publer = Publer::new(Client::new(), Arc::new(Settings::default()));
        let ctx = AttemptContext {
            platform: Platform::Threads,
            url: resolve(Platform::Threads, "DS-74VmCbK9").unwrap(),
            target: std::env::temp_dir().join("never-written.mp4"),
        };
        let err = publer.attempt(&ctx).await.unwrap_err();
        assert!(!err.is_not_found());
        assert!(err.to_string().contains("token"));
    }
}
