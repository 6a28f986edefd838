//! Collect image URLs referenced by an HTML page.
//!
//! Mirrors what a user would pick by hand in the browser: `<img>` sources
//! (preferring the largest `srcset` candidate), common lazy-load attributes
//! and inline `background-image` styles.

use crate::utils::error::{Result, UpscaleError};
use crate::utils::validation::validate_url;
use regex::Regex;
use reqwest::Client;
use std::collections::HashSet;
use std::sync::LazyLock;
use std::time::Duration;
use url::Url;

pub const PAGE_TIMEOUT: Duration = Duration::from_secs(10);

// 屬性值內的 `>` 不結束標籤
static TAG_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?is)<([a-z][a-z0-9-]*)\b((?:[^>"']|"[^"]*"|'[^']*')*)>"#)
        .expect("tag pattern is valid")
});

static HIDDEN_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)<!--.*?-->|<script\b[^>]*>.*?</script\s*>")
        .expect("hidden span pattern is valid")
});

static ATTR_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?s)([a-zA-Z_:][-a-zA-Z0-9_:.]*)\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("attribute pattern is valid")
});

static CSS_URL_PATTERN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"(?i)url\(\s*["']?([^"')]+?)["']?\s*\)"#).expect("css url pattern is valid")
});

const LAZY_ATTRIBUTES: [&str; 4] = ["data-src", "data-original", "data-lazy-src", "data-srcset"];

/// Image URLs in document order, resolved against `base` and de-duplicated.
pub fn extract_image_urls(html: &str, base: &Url) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut urls = Vec::new();
    let visible = HIDDEN_PATTERN.replace_all(html, " ");

    for tag in TAG_PATTERN.captures_iter(&visible) {
        let name = tag[1].to_ascii_lowercase();
        let attributes = parse_attributes(&tag[2]);
        let lookup = |key: &str| {
            attributes
                .iter()
                .find(|(attr, _)| attr == key)
                .map(|(_, value)| value.as_str())
        };

        let mut candidates = Vec::new();

        if name == "img" {
            // srcset 最後一項通常是最高解析度
            let source = lookup("srcset")
                .and_then(largest_srcset_candidate)
                .or_else(|| lookup("src"));
            candidates.extend(source);
        }

        for attr in LAZY_ATTRIBUTES {
            if let Some(value) = lookup(attr) {
                let value = if attr == "data-srcset" {
                    largest_srcset_candidate(value)
                } else {
                    Some(value)
                };
                candidates.extend(value);
                break;
            }
        }

        if let Some(style) = lookup("style") {
            candidates.extend(
                CSS_URL_PATTERN
                    .captures_iter(style)
                    .filter_map(|caps| caps.get(1).map(|m| m.as_str())),
            );
        }

        for candidate in candidates {
            if let Some(resolved) = resolve(base, candidate) {
                if seen.insert(resolved.clone()) {
                    urls.push(resolved);
                }
            }
        }
    }

    urls
}

pub fn page_client(timeout: Duration) -> Result<Client> {
    Ok(Client::builder().timeout(timeout).build()?)
}

/// GET `page_url` and extract its image URLs, resolving against the final (post-redirect) URL.
pub async fn fetch_page_image_urls(client: &Client, page_url: &str) -> Result<Vec<String>> {
    validate_url("page_url", page_url)?;

    let response = client.get(page_url).send().await?;
    if !response.status().is_success() {
        return Err(UpscaleError::ApiStatusError {
            status: response.status().as_u16(),
            context: "Unable to fetch page".to_string(),
        });
    }

    let base = response.url().clone();
    let html = response.text().await?;
    let urls = extract_image_urls(&html, &base);
    tracing::debug!("Found {} image URLs on {}", urls.len(), base);

    Ok(urls)
}

fn parse_attributes(raw: &str) -> Vec<(String, String)> {
    ATTR_PATTERN
        .captures_iter(raw)
        .map(|caps| {
            let key = caps[1].to_ascii_lowercase();
            let value = caps
                .get(2)
                .or_else(|| caps.get(3))
                .or_else(|| caps.get(4))
                .map(|m| decode_entities(m.as_str()))
                .unwrap_or_default();
            (key, value)
        })
        .collect()
}

fn largest_srcset_candidate(srcset: &str) -> Option<&str> {
    srcset
        .split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .last()
        .and_then(|entry| entry.split_whitespace().next())
}

fn decode_entities(value: &str) -> String {
    value
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&#x27;", "'")
        .replace("&amp;", "&")
}

fn resolve(base: &Url, candidate: &str) -> Option<String> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    match base.join(candidate) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => Some(url.to_string()),
        Ok(_) => None,
        Err(e) => {
            tracing::debug!("Skipping unresolvable image URL {}: {}", candidate, e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use httpmock::prelude::*;

    fn base() -> Url {
        Url::parse("https://shop.example.com/gallery/index.html").unwrap()
    }

    #[test]
    fn test_img_prefers_largest_srcset_candidate() {
        let html = r#"<img src="/small.jpg" srcset="/small.jpg 480w, /medium.jpg 800w, /large.jpg 1600w">"#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec!["https://shop.example.com/large.jpg"]
        );
    }

    #[test]
    fn test_relative_urls_are_resolved_and_deduplicated() {
        let html = r#"
            <IMG SRC="thumbs/a.png" alt="a">
            <img src='https://cdn.example.com/b.webp'>
            <img src="thumbs/a.png">
        "#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec![
                "https://shop.example.com/gallery/thumbs/a.png",
                "https://cdn.example.com/b.webp",
            ]
        );
    }

    #[test]
    fn test_lazy_load_and_background_images() {
        let html = r#"
            <div class="card" data-original="/lazy/hero.jpg"></div>
            <span data-srcset="/x1.png 1x, /x2.png 2x"></span>
            <section style="background-image: url(&quot;/bg/sky.jpg&quot;)"></section>
            <a href="/about">About</a>
        "#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec![
                "https://shop.example.com/lazy/hero.jpg",
                "https://shop.example.com/x2.png",
                "https://shop.example.com/bg/sky.jpg",
            ]
        );
    }

    #[test]
    fn test_data_uris_are_skipped() {
        let html = r#"<img src="data:image/gif;base64,R0lGODlhAQABAAAAACw=" data-src="/real.jpg">"#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec!["https://shop.example.com/real.jpg"]
        );
    }

    #[test]
    fn test_query_entities_are_decoded() {
        let html = r#"<img src="/img.jpg?w=800&amp;h=600">"#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec!["https://shop.example.com/img.jpg?w=800&h=600"]
        );
    }

    #[test]
    fn test_quoted_angle_bracket_keeps_tag_intact() {
        let html = r#"<img alt="1 > 0" src="/real.jpg"><img title='a>b' data-src="/lazy.png">"#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec![
                "https://shop.example.com/real.jpg",
                "https://shop.example.com/lazy.png",
            ]
        );
    }

    #[test]
    fn test_comments_and_scripts_are_ignored() {
        let html = r#"
            <!-- <img src="/old.jpg"> -->
            <script type="text/javascript">
                document.write('<img src="/tracker.gif">');
            </script>
            <img src="/current.jpg">
        "#;

        assert_eq!(
            extract_image_urls(html, &base()),
            vec!["https://shop.example.com/current.jpg"]
        );
    }

    #[tokio::test]
    async fn test_fetch_page_image_urls() {
        let server = MockServer::start();
        let page_mock = server.mock(|when, then| {
            when.method(GET).path("/posts/1");
            then.status(200)
                .header("Content-Type", "text/html")
                .body(r#"<html><body><img src="../media/cover.jpg"></body></html>"#);
        });

        let urls = fetch_page_image_urls(&Client::new(), &server.url("/posts/1"))
            .await
            .unwrap();

        page_mock.assert();
        assert_eq!(urls, vec![server.url("/media/cover.jpg")]);
    }

    #[tokio::test]
    async fn test_slow_page_hits_client_timeout() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/slow");
            then.status(200)
                .delay(std::time::Duration::from_millis(500))
                .body("<img src=\"/late.jpg\">");
        });

        let client = page_client(std::time::Duration::from_millis(50)).unwrap();
        let err = fetch_page_image_urls(&client, &server.url("/slow"))
            .await
            .unwrap_err();
        match err {
            UpscaleError::ApiError(e) => assert!(e.is_timeout()),
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_reports_http_status() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/private");
            then.status(403);
        });

        let err = fetch_page_image_urls(&Client::new(), &server.url("/private"))
            .await
            .unwrap_err();
        assert!(matches!(err, UpscaleError::ApiStatusError { status: 403, .. }));
    }
}
