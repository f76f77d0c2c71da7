use crate::extractor::http::page_headers;
use crate::extractor::models::{CanonicalUrl, Platform};
use crate::extractor::platforms;
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use reqwest::Client;
use tracing::{debug, info};

/// Follow a share link's redirects and return the post it lands on.
///
/// The client's redirect policy bounds the hops; only the final URL matters,
/// whatever status the last page answers with.
pub async fn follow_share_link(
    client: &Client,
    settings: &Settings,
    platform: Platform,
    share: &CanonicalUrl,
) -> Result<CanonicalUrl, ExtractionFailure> {
    debug!("Resolving {} share link {}", platform, share);
    let response = client
        .get(share.as_str())
        .headers(page_headers(settings))
        .timeout(settings.page_timeout())
        .send()
        .await
        .map_err(|e| ExtractionFailure::download(format!("Error following share link: {}", e)))?;

    let final_url = response.url().as_str().to_string();
    let resolved = platforms::from_final_url(platform, &final_url).ok_or_else(|| {
        ExtractionFailure::download(format!("Share link did not lead to a post: {}", final_url))
    })?;

    info!("Share link {} resolved to {}", share, resolved);
    Ok(resolved)
}
