//! Declarative rules for locating a video URL in third-party responses
//!
//! Mirror pages expose the video through meta tags, vendor APIs through one
//! of several JSON keys. Both are described as ordered rule lists so the
//! priority of every vendor quirk is visible in one place.

use crate::utils::error::ExtractionFailure;
use regex::Regex;
use serde_json::Value;
use tracing::debug;

/// Meta tags that may carry a playable video URL
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetaTag {
    TwitterPlayerStream,
    OgVideo,
    OgVideoSecureUrl,
}

impl MetaTag {
    pub fn property(&self) -> &'static str {
        match self {
            MetaTag::TwitterPlayerStream => "twitter:player:stream",
            MetaTag::OgVideo => "og:video",
            MetaTag::OgVideoSecureUrl => "og:video:secure_url",
        }
    }
}

/// Content of the first `<meta property="..." content="...">` with the given
/// property, HTML entities decoded.
pub fn meta_content(html: &str, property: &str) -> Option<String> {
    let pattern = format!(
        r#"<meta\s+(?:property|name)="{}"\s+content="([^"]+)""#,
        regex::escape(property)
    );
    let re = Regex::new(&pattern).ok()?;
    let raw = re.captures(html)?.get(1)?.as_str();
    let decoded = html_escape::decode_html_entities(raw).trim().to_string();
    (!decoded.is_empty()).then_some(decoded)
}

/// Try the tags in order; the first one present wins.
pub fn first_meta_video(html: &str, tags: &[MetaTag]) -> Option<(MetaTag, String)> {
    tags.iter().find_map(|tag| {
        meta_content(html, tag.property()).map(|url| {
            debug!("Found video URL in {}", tag.property());
            (*tag, url)
        })
    })
}

/// One way of pulling a download URL out of a vendor response
#[derive(Debug, Clone, Copy)]
pub enum UrlRule {
    /// Non-empty string at a JSON pointer
    Key(&'static str),
    /// `key`, but only when the string at `guard` equals `equals`
    KeyWhen {
        guard: &'static str,
        equals: &'static str,
        key: &'static str,
    },
    /// First capture group of `pattern` run over the HTML string at `key`
    Html {
        key: &'static str,
        pattern: &'static str,
    },
}

fn string_at<'a>(value: &'a Value, pointer: &str) -> Option<&'a str> {
    value
        .pointer(pointer)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
}

impl UrlRule {
    pub fn apply(&self, value: &Value) -> Option<String> {
        match *self {
            UrlRule::Key(key) => string_at(value, key).map(str::to_string),
            UrlRule::KeyWhen { guard, equals, key } => {
                if string_at(value, guard) == Some(equals) {
                    string_at(value, key).map(str::to_string)
                } else {
                    None
                }
            }
            UrlRule::Html { key, pattern } => {
                let html = string_at(value, key)?;
                let re = Regex::new(pattern).ok()?;
                let found = re.captures(html)?.get(1)?.as_str();
                Some(html_escape::decode_html_entities(found).to_string())
            }
        }
    }
}

/// Value a vendor puts in its envelope when the lookup worked
#[derive(Debug, Clone, Copy)]
pub enum Expected {
    Int(i64),
    Str(&'static str),
}

#[derive(Debug, Clone, Copy)]
pub struct SuccessMarker {
    pub pointer: &'static str,
    pub expected: Expected,
}

impl SuccessMarker {
    fn holds(&self, value: &Value) -> bool {
        match (value.pointer(self.pointer), self.expected) {
            (Some(found), Expected::Int(n)) => found.as_i64() == Some(n),
            (Some(found), Expected::Str(s)) => found.as_str() == Some(s),
            (None, _) => false,
        }
    }
}

/// Response layout of one vendor API
#[derive(Debug, Clone, Copy)]
pub struct VendorSchema {
    pub name: &'static str,
    pub success: Option<SuccessMarker>,
    pub rules: &'static [UrlRule],
}

impl VendorSchema {
    pub fn download_url(&self, value: &Value) -> Result<String, ExtractionFailure> {
        if let Some(marker) = &self.success {
            if !marker.holds(value) {
                return Err(ExtractionFailure::not_found(format!(
                    "{} reported the video as unavailable",
                    self.name
                )));
            }
        }

        self.rules
            .iter()
            .find_map(|rule| rule.apply(value))
            .ok_or_else(|| {
                ExtractionFailure::not_found(format!("No download URL in {} response", self.name))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    const PAGE: &str = r#"
        <html><head>
        <meta property="og:title" content="A post">
        <meta property="og:video:secure_url" content="https://cdn.example/secure.mp4">
        <meta property="og:video" content="https://cdn.example/v.mp4?a=1&amp;b=2">
        </head></html>
    "#;

    #[test]
    fn meta_content_decodes_entities() {
        assert_eq!(
            meta_content(PAGE, "og:video").as_deref(),
            Some("https://cdn.example/v.mp4?a=1&b=2")
        );
    }

    #[test]
    fn og_video_does_not_match_secure_url_tag() {
        let html = r#"<meta property="og:video:secure_url" content="https://cdn.example/s.mp4">"#;
        assert_eq!(meta_content(html, "og:video"), None);
    }

    #[test]
    fn first_meta_video_follows_priority() {
        let tags = [
            MetaTag::TwitterPlayerStream,
            MetaTag::OgVideo,
            MetaTag::OgVideoSecureUrl,
        ];
        let (tag, url) = first_meta_video(PAGE, &tags).unwrap();
        assert_eq!(tag, MetaTag::OgVideo);
        assert!(url.ends_with("v.mp4?a=1&b=2"));

        let stream = r#"<meta property="twitter:player:stream" content="https://video.example/s.mp4">"#;
        let html = format!("{}{}", PAGE, stream);
        let (tag, _) = first_meta_video(&html, &tags).unwrap();
        assert_eq!(tag, MetaTag::TwitterPlayerStream);
    }

    #[test]
    fn missing_tags_yield_none() {
        assert_eq!(first_meta_video("<html></html>", &[MetaTag::OgVideo]), None);
    }

    const RULES: &[UrlRule] = &[
        UrlRule::Key("/video"),
        UrlRule::Key("/url"),
        UrlRule::KeyWhen {
            guard: "/status",
            equals: "success",
            key: "/data/0/video",
        },
    ];

    const SCHEMA: VendorSchema = VendorSchema {
        name: "test-vendor",
        success: None,
        rules: RULES,
    };

    #[test]
    fn rules_are_tried_in_order() {
        let value = json!({"url": "https://b", "video": "https://a"});
        assert_eq!(SCHEMA.download_url(&value).unwrap(), "https://a");

        let value = json!({"video": "", "url": "https://b"});
        assert_eq!(SCHEMA.download_url(&value).unwrap(), "https://b");
    }

    #[test]
    fn guarded_rule_requires_guard() {
        let nested = json!({"status": "success", "data": [{"video": "https://n"}]});
        assert_eq!(SCHEMA.download_url(&nested).unwrap(), "https://n");

        let failed = json!({"status": "error", "data": [{"video": "https://n"}]});
        assert!(SCHEMA.download_url(&failed).unwrap_err().is_not_found());
    }

    #[test]
    fn success_marker_gates_extraction() {
        static KEYS: &[UrlRule] = &[UrlRule::Key("/downloadUrl")];
        let schema = VendorSchema {
            name: "marker",
            success: Some(SuccessMarker {
                pointer: "/status_code",
                expected: Expected::Int(0),
            }),
            rules: KEYS,
        };

        let ok = json!({"status_code": 0, "downloadUrl": "https://d"});
        assert_eq!(schema.download_url(&ok).unwrap(), "https://d");

        let err = schema
            .download_url(&json!({"status_code": 1, "downloadUrl": "https://d"}))
            .unwrap_err();
        assert!(err.to_string().contains("unavailable"));
    }

    #[test]
    fn html_rule_extracts_anchor() {
        let rule = UrlRule::Html {
            key: "/data",
            pattern: r#"<a href="([^"]+)"[^>]*class="dl""#,
        };
        let value = json!({"data": "<div><a href=\"https://x/v.mp4?a=1&amp;b=2\" class=\"dl\">Go</a></div>"});
        assert_eq!(rule.apply(&value).as_deref(), Some("https://x/v.mp4?a=1&b=2"));
    }
}
