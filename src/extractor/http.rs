//! Request helpers shared by the scraping and vendor API strategies

use crate::utils::config::Settings;
use crate::utils::error::ExtractionFailure;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{RequestBuilder, StatusCode, Url};
use serde_json::Value;
use tracing::{debug, warn};

pub const ACCEPT_HTML: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,*/*;q=0.8";
pub const ACCEPT_JSON: &str = "application/json, text/plain, */*";

fn insert(headers: &mut HeaderMap, name: HeaderName, value: &str) {
    match HeaderValue::from_str(value) {
        Ok(v) => {
            headers.insert(name, v);
        }
        Err(e) => warn!("Skipping invalid {} header value: {}", name, e),
    }
}

/// Headers of a browser navigating to a page
pub fn page_headers(settings: &Settings) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::USER_AGENT, &settings.user_agent);
    insert(&mut headers, header::ACCEPT, ACCEPT_HTML);
    insert(&mut headers, header::ACCEPT_LANGUAGE, &settings.accept_language);
    insert(&mut headers, header::DNT, "1");
    headers
}

/// Headers of a same-origin XHR made by a vendor's own web page
pub fn api_headers(settings: &Settings, endpoint: &str) -> HeaderMap {
    let mut headers = HeaderMap::new();
    insert(&mut headers, header::USER_AGENT, &settings.user_agent);
    insert(&mut headers, header::ACCEPT, ACCEPT_JSON);
    insert(&mut headers, header::ACCEPT_LANGUAGE, &settings.accept_language);
    insert(
        &mut headers,
        HeaderName::from_static("x-requested-with"),
        "XMLHttpRequest",
    );
    if let Some(origin) = origin_of(endpoint) {
        insert(&mut headers, header::REFERER, &format!("{}/", origin));
        insert(&mut headers, header::ORIGIN, &origin);
    }
    headers
}

/// `https://host[:port]` of an endpoint URL
pub fn origin_of(endpoint: &str) -> Option<String> {
    let url = Url::parse(endpoint).ok()?;
    let host = url.host_str()?;
    Some(match url.port() {
        Some(port) => format!("{}://{}:{}", url.scheme(), host, port),
        None => format!("{}://{}", url.scheme(), host),
    })
}

/// Send a request and return the body, classifying HTTP failures.
///
/// 404/410 mean the post is gone; every other failure is a download error.
pub async fn fetch_text(request: RequestBuilder, label: &str) -> Result<String, ExtractionFailure> {
    let response = request.send().await.map_err(|e| {
        warn!("Error contacting {}: {}", label, e);
        ExtractionFailure::download(format!("Error contacting {}: {}", label, e))
    })?;

    let status = response.status();
    debug!("{} responded with {}", label, status);
    if status == StatusCode::NOT_FOUND || status == StatusCode::GONE {
        return Err(ExtractionFailure::not_found(format!(
            "{} answered {}",
            label, status
        )));
    }
    if !status.is_success() {
        return Err(ExtractionFailure::download(format!(
            "{} answered {}",
            label, status
        )));
    }

    response
        .text()
        .await
        .map_err(|e| ExtractionFailure::download(format!("Error reading {} response: {}", label, e)))
}

pub fn parse_json(body: &str, label: &str) -> Result<Value, ExtractionFailure> {
    serde_json::from_str(body).map_err(|e| {
        debug!("Raw {} response: {}", label, truncate(body, 500));
        ExtractionFailure::download(format!("Invalid response from {}: {}", label, e))
    })
}

/// Cut a body for logging without splitting a UTF-8 character
pub fn truncate(body: &str, max: usize) -> &str {
    if body.len() <= max {
        return body;
    }
    let mut end = max;
    while !body.is_char_boundary(end) {
        end -= 1;
    }
    &body[..end]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_strips_path_and_query() {
        assert_eq!(
            origin_of("https://savetik.net/api/action?x=1").as_deref(),
            Some("https://savetik.net")
        );
        assert_eq!(origin_of("not a url"), None);
    }

    #[test]
    fn api_headers_carry_vendor_origin() {
        let settings = Settings::default();
        let headers = api_headers(&settings, "https://fsave.net/proxy.php");
        assert_eq!(headers[header::ORIGIN], "https://fsave.net");
        assert_eq!(headers[header::REFERER], "https://fsave.net/");
        assert_eq!(headers["x-requested-with"], "XMLHttpRequest");
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let body = "ñññ";
        assert_eq!(truncate(body, 3), "ñ");
        assert_eq!(truncate(body, 100), body);
    }
}
