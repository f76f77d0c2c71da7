use crate::extractor::http::{api_headers, fetch_text, parse_json, truncate};
use crate::extractor::models::{CanonicalUrl, MediaLocation};
use crate::extractor::scrape::VendorSchema;
use crate::extractor::traits::{AttemptContext, Strategy};
use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tracing::{debug, info};

/// Request parameters sent to a vendor for one post
pub type ParamsFn =
    fn(&Settings, &CanonicalUrl) -> Result<Vec<(&'static str, String)>, ExtractionFailure>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VendorMethod {
    /// Parameters go in the query string
    Get,
    /// Parameters go in an urlencoded form body
    PostForm,
}

/// A third-party downloader API answering with a JSON envelope
pub struct VendorApi {
    id: &'static str,
    client: Client,
    settings: Arc<Settings>,
    method: VendorMethod,
    endpoint: String,
    params: ParamsFn,
    schema: &'static VendorSchema,
    plain_url_body: bool,
}

/// The usual parameter set: just the post URL
pub fn url_param(_: &Settings, url: &CanonicalUrl) -> Result<Vec<(&'static str, String)>, ExtractionFailure> {
    Ok(vec![("url", url.as_str().to_string())])
}

impl VendorApi {
    pub fn new(
        id: &'static str,
        client: Client,
        settings: Arc<Settings>,
        method: VendorMethod,
        endpoint: impl Into<String>,
        schema: &'static VendorSchema,
    ) -> Self {
        Self {
            id,
            client,
            settings,
            method,
            endpoint: endpoint.into(),
            params: url_param,
            schema,
            plain_url_body: false,
        }
    }

    pub fn with_params(mut self, params: ParamsFn) -> Self {
        self.params = params;
        self
    }

    /// Accept a body that is a bare media URL instead of JSON
    pub fn accepting_plain_url(mut self) -> Self {
        self.plain_url_body = true;
        self
    }

    /// Pure part of the strategy: response body to media URL
    pub fn download_url_from_body(&self, body: &str) -> Result<String, ExtractionFailure> {
        match parse_json(body, self.id) {
            Ok(value) => {
                debug!(strategy = self.id, "JSON response: {}", truncate(body, 500));
                self.schema.download_url(&value)
            }
            Err(e) if self.plain_url_body => {
                let text = body.trim();
                if text.starts_with("http") && (text.contains("tiktok") || text.contains(".mp4")) {
                    debug!(strategy = self.id, "Response is a direct video URL");
                    Ok(text.to_string())
                } else {
                    Err(e)
                }
            }
            Err(e) => Err(e),
        }
    }
}

#[async_trait]
impl Strategy for VendorApi {
    fn id(&self) -> &'static str {
        self.id
    }

    async fn attempt(&self, ctx: &AttemptContext) -> Result<MediaLocation, ExtractionFailure> {
        let params = (self.params)(&self.settings, &ctx.url)?;
        info!(strategy = self.id, "Querying {} for {}", self.endpoint, ctx.url);

        let request = match self.method {
            VendorMethod::Get => self.client.get(&self.endpoint).query(&params),
            VendorMethod::PostForm => self.client.post(&self.endpoint).form(&params),
        }
        .headers(api_headers(&self.settings, &self.endpoint))
        .timeout(self.settings.page_timeout());

        let body = fetch_text(request, self.id).await?;
        let url = self.download_url_from_body(&body)?;
        info!(strategy = self.id, "Extracted download URL: {}", url);
        Ok(MediaLocation::Remote(url))
    }
}
