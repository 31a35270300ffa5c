use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect, Client};
use scraper::{Html, Selector};
use serde_json::Value;
use std::time::Duration;
use url::Url;

use crate::model::Recipe;

/// Hop bound when resolving an accepted image URL to its final location.
const MAX_REDIRECT_HOPS: usize = 3;
const PAGE_TIMEOUT: Duration = Duration::from_secs(5);
const PROBE_TIMEOUT: Duration = Duration::from_secs(3);
const EMBED_TIMEOUT: Duration = Duration::from_secs(4);
const MIN_INLINE_DIMENSION: u64 = 200;

const USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko)";

/// Finds a representative image for a recipe page.
///
/// The cascade is an ordered list of independent strategies; the first
/// candidate that validates as a real image wins. Every network failure
/// along the way means "no candidate at this stage", never an error.
pub struct ImageDiscovery {
    client: Client,
    embed_base: String,
}

impl ImageDiscovery {
    pub fn new() -> Self {
        Self::with_embed_base("https://noembed.com")
    }

    /// Use a different URL-metadata/embed service (tests point this at a mock).
    pub fn with_embed_base(embed_base: impl Into<String>) -> Self {
        let client = Client::builder()
            .redirect(redirect::Policy::limited(MAX_REDIRECT_HOPS))
            .user_agent(USER_AGENT)
            .build()
            .expect("Failed to create HTTP client");

        Self {
            client,
            embed_base: embed_base.into(),
        }
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    /// Best-effort image URL for the page, or `None`.
    ///
    /// Invalid or non-HTTP(S) input short-circuits without any network call.
    pub async fn find_image(&self, page_url: &str) -> Option<String> {
        let base = parse_http_url(page_url)?;
        let html = self.fetch_page(page_url).await?;

        // The parsed document is not Send, so all candidates are collected
        // up front and validated afterwards.
        let candidates = {
            let document = Html::parse_document(&html);
            collect_dom_candidates(&document, &base)
        };
        for (strategy, candidate) in candidates {
            if self.validate(&candidate).await {
                debug!("image discovery: accepted {candidate} via {strategy}");
                return Some(self.resolve_redirects(&candidate).await);
            }
        }

        // Degraded pass: plain-text scan of the raw markup, same priority.
        for candidate in collect_raw_candidates(&html, &base) {
            if self.validate(&candidate).await {
                debug!("image discovery: accepted {candidate} via raw scan");
                return Some(self.resolve_redirects(&candidate).await);
            }
        }

        // Last resort within this component: embed-service thumbnail.
        if let Some(thumbnail) = self.embed_thumbnail(page_url).await {
            return Some(self.resolve_redirects(&thumbnail).await);
        }

        None
    }

    /// Caller-level cascade used after extraction.
    ///
    /// Keeps a valid model-provided URL, otherwise walks the page, then a
    /// distinct source URL, then the embed service, then the site favicon.
    /// Whatever is accepted lands on the recipe redirect-resolved.
    pub async fn best_image(&self, page_url: &str, recipe: &mut Recipe) {
        if let Some(existing) = recipe.image_url.clone() {
            if self.validate(&existing).await {
                recipe.image_url = Some(self.resolve_redirects(&existing).await);
                return;
            }
        }

        let mut found = self.find_image(page_url).await;

        if found.is_none() {
            if let Some(source) = recipe.source_url.clone() {
                if source != page_url {
                    found = self.find_image(&source).await;
                }
            }
        }

        if found.is_none() {
            if let Some(thumbnail) = self.embed_thumbnail(page_url).await {
                found = Some(self.resolve_redirects(&thumbnail).await);
            }
        }

        if found.is_none() {
            if let Some(favicon) = favicon_url(page_url) {
                if self.validate(&favicon).await {
                    found = Some(self.resolve_redirects(&favicon).await);
                }
            }
        }

        if found.is_some() {
            recipe.image_url = found;
        }
    }

    async fn fetch_page(&self, url: &str) -> Option<String> {
        let response = self
            .client
            .get(url)
            .timeout(PAGE_TIMEOUT)
            .send()
            .await
            .ok()?;
        response.text().await.ok()
    }

    /// Is this a real, reachable image? Header-only probe; fails closed.
    async fn validate(&self, url: &str) -> bool {
        if parse_http_url(url).is_none() {
            return false;
        }
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => {
                response.status().is_success()
                    && response
                        .headers()
                        .get(CONTENT_TYPE)
                        .and_then(|value| value.to_str().ok())
                        .is_some_and(|ct| ct.starts_with("image/"))
            }
            Err(_) => false,
        }
    }

    /// Follow redirects (bounded by the client policy) and return the final
    /// URL; the original is kept on any error.
    async fn resolve_redirects(&self, url: &str) -> String {
        match self.client.head(url).timeout(PROBE_TIMEOUT).send().await {
            Ok(response) => response.url().to_string(),
            Err(_) => url.to_string(),
        }
    }

    /// Thumbnail from the third-party embed service, validated.
    async fn embed_thumbnail(&self, page_url: &str) -> Option<String> {
        let response = self
            .client
            .get(format!("{}/embed", self.embed_base))
            .query(&[("url", page_url)])
            .timeout(EMBED_TIMEOUT)
            .send()
            .await
            .ok()?;
        if !response.status().is_success() {
            return None;
        }
        let data: Value = response.json().await.ok()?;
        let thumbnail = data.get("thumbnail_url")?.as_str()?.to_string();
        if self.validate(&thumbnail).await {
            Some(thumbnail)
        } else {
            None
        }
    }
}

impl Default for ImageDiscovery {
    fn default() -> Self {
        Self::new()
    }
}

fn parse_http_url(raw: &str) -> Option<Url> {
    let url = Url::parse(raw.trim()).ok()?;
    matches!(url.scheme(), "http" | "https").then_some(url)
}

fn favicon_url(page_url: &str) -> Option<String> {
    let url = parse_http_url(page_url)?;
    Some(format!("{}/favicon.ico", url.origin().ascii_serialization()))
}

fn absolutize(base: &Url, candidate: &str) -> Option<String> {
    let trimmed = candidate.trim();
    if trimmed.is_empty() {
        return None;
    }
    base.join(trimmed).ok().map(|url| url.to_string())
}

/// All DOM-level candidates, one entry per strategy in priority order;
/// the inline-image scan contributes its survivors sorted by area.
fn collect_dom_candidates(document: &Html, base: &Url) -> Vec<(&'static str, String)> {
    let mut candidates = Vec::new();

    if let Some(url) = meta_content(document, "meta[property=\"og:image\"]", base) {
        candidates.push(("og:image", url));
    }
    if let Some(url) = meta_content(document, "meta[name=\"twitter:image\"]", base)
        .or_else(|| meta_content(document, "meta[property=\"twitter:image\"]", base))
    {
        candidates.push(("twitter:image", url));
    }
    if let Some(url) = link_href(document, "link[rel=\"image_src\"]", base) {
        candidates.push(("link image_src", url));
    }
    if let Some(url) = meta_content(document, "meta[property=\"og:article:image\"]", base) {
        candidates.push(("og:article:image", url));
    }
    if let Some(url) = json_ld_recipe_image(document, base) {
        candidates.push(("json-ld recipe", url));
    }
    for url in inline_image_candidates(document, base) {
        candidates.push(("inline image", url));
    }

    candidates
}

fn meta_content(document: &Html, selector: &str, base: &Url) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .find_map(|element| element.value().attr("content"))
        .and_then(|value| absolutize(base, value))
}

fn link_href(document: &Html, selector: &str, base: &Url) -> Option<String> {
    let selector = Selector::parse(selector).unwrap();
    document
        .select(&selector)
        .find_map(|element| element.value().attr("href"))
        .and_then(|value| absolutize(base, value))
}

/// The `image` field of an embedded schema.org Recipe block: a plain
/// string, the first element of a list, or a nested object's `url`.
fn json_ld_recipe_image(document: &Html, base: &Url) -> Option<String> {
    let selector = Selector::parse("script[type=\"application/ld+json\"]").unwrap();
    for script in document.select(&selector) {
        let Ok(data) = serde_json::from_str::<Value>(&script.inner_html()) else {
            continue;
        };
        if let Some(url) = recipe_image_in(&data) {
            return absolutize(base, url);
        }
    }
    None
}

fn recipe_image_in(data: &Value) -> Option<&str> {
    match data {
        Value::Array(items) => items.iter().find_map(recipe_image_in),
        Value::Object(map) => {
            if map.get("@type").is_some_and(type_is_recipe) {
                image_url_of(map.get("image")?)
            } else if let Some(graph) = map.get("@graph") {
                recipe_image_in(graph)
            } else {
                None
            }
        }
        _ => None,
    }
}

fn type_is_recipe(type_value: &Value) -> bool {
    match type_value {
        Value::String(s) => s == "Recipe",
        Value::Array(items) => items.iter().any(|item| item.as_str() == Some("Recipe")),
        _ => false,
    }
}

fn image_url_of(image: &Value) -> Option<&str> {
    match image {
        Value::String(s) => Some(s),
        Value::Array(items) => items.first().and_then(image_url_of),
        Value::Object(map) => map.get("url").and_then(Value::as_str),
        _ => None,
    }
}

/// `<img>` tags that plausibly show the dish: not decorative, declared at
/// least 200x200, sorted largest-area first. The sort is stable, so ties
/// keep first-seen order.
fn inline_image_candidates(document: &Html, base: &Url) -> Vec<String> {
    let selector = Selector::parse("img").unwrap();
    let mut sized: Vec<(u64, String)> = Vec::new();

    for img in document.select(&selector) {
        let Some(src) = img.value().attr("src") else {
            continue;
        };
        if is_decorative(src) {
            continue;
        }
        let (Some(width), Some(height)) = (
            declared_dimension(img.value().attr("width")),
            declared_dimension(img.value().attr("height")),
        ) else {
            continue;
        };
        if width < MIN_INLINE_DIMENSION || height < MIN_INLINE_DIMENSION {
            continue;
        }
        if let Some(url) = absolutize(base, src) {
            sized.push((width * height, url));
        }
    }

    sized.sort_by(|a, b| b.0.cmp(&a.0));
    sized.into_iter().map(|(_, url)| url).collect()
}

fn is_decorative(src: &str) -> bool {
    let lowered = src.to_ascii_lowercase();
    lowered.contains("icon")
        || lowered.contains("logo")
        || lowered.contains("avatar")
        || lowered.starts_with("data:")
        || lowered.contains(".svg")
}

fn declared_dimension(attr: Option<&str>) -> Option<u64> {
    attr?.trim().trim_end_matches("px").parse().ok()
}

/// Plain-text fallback over the raw markup, mirroring the DOM priority.
/// Used when the DOM pass yields nothing validatable (e.g. markup too
/// broken for the parser to place the tags where the selectors look).
fn collect_raw_candidates(html: &str, base: &Url) -> Vec<String> {
    let mut candidates = Vec::new();

    for (marker, attr) in [
        ("og:image", "content"),
        ("twitter:image", "content"),
        ("image_src", "href"),
        ("og:article:image", "content"),
    ] {
        if let Some(value) = marker_tag_attr(html, marker, attr) {
            if let Some(url) = absolutize(base, &value) {
                candidates.push(url);
            }
        }
    }

    if let Some(value) = raw_json_ld_image(html) {
        if let Some(url) = absolutize(base, &value) {
            candidates.push(url);
        }
    }

    candidates
}

/// Find a tag containing `marker` and pull the quoted value of `attr`
/// out of it. Handles either attribute order within the tag.
fn marker_tag_attr(html: &str, marker: &str, attr: &str) -> Option<String> {
    let lowered = html.to_ascii_lowercase();
    let mut from = 0;
    while let Some(found) = lowered[from..].find(marker) {
        let at = from + found;
        let tag_start = match html[..at].rfind('<') {
            Some(start) => start,
            None => return None,
        };
        let tag_end = match html[at..].find('>') {
            Some(end) => at + end,
            None => return None,
        };
        let tag = &html[tag_start..=tag_end];
        if let Some(value) = attr_value(tag, attr) {
            return Some(value.to_string());
        }
        from = at + marker.len();
    }
    None
}

/// The quoted value of `attr="..."` (or single-quoted) inside a tag slice.
fn attr_value<'a>(tag: &'a str, attr: &str) -> Option<&'a str> {
    let lowered = tag.to_ascii_lowercase();
    let needle = format!("{attr}=");
    let at = lowered.find(&needle)?;
    let rest = &tag[at + needle.len()..];
    let quote = rest.chars().next()?;
    if quote != '"' && quote != '\'' {
        return None;
    }
    let rest = &rest[1..];
    let end = rest.find(quote)?;
    Some(&rest[..end])
}

/// Crude scan for a schema.org Recipe image inside raw JSON-LD text.
fn raw_json_ld_image(html: &str) -> Option<String> {
    let recipe_at = html.find(r#""Recipe""#)?;
    let rest = &html[recipe_at..];
    let image_at = rest.find(r#""image""#)?;
    let rest = &rest[image_at..];
    let http_at = rest.find("http")?;
    let rest = &rest[http_at..];
    let end = rest.find('"')?;
    Some(rest[..end].to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Url {
        Url::parse("https://example.com/recipes/cake").unwrap()
    }

    #[test]
    fn test_invalid_urls_are_rejected_up_front() {
        assert!(parse_http_url("not a url").is_none());
        assert!(parse_http_url("ftp://example.com/x").is_none());
        assert!(parse_http_url("  https://example.com/x ").is_some());
    }

    #[test]
    fn test_og_image_comes_before_twitter() {
        let document = Html::parse_document(
            r#"<html><head>
                <meta name="twitter:image" content="/tw.jpg">
                <meta property="og:image" content="/og.jpg">
            </head></html>"#,
        );
        let candidates = collect_dom_candidates(&document, &base());
        assert_eq!(candidates[0].1, "https://example.com/og.jpg");
        assert_eq!(candidates[1].1, "https://example.com/tw.jpg");
    }

    #[test]
    fn test_relative_urls_are_absolutized() {
        let document = Html::parse_document(
            r#"<html><head><link rel="image_src" href="hero.png"></head></html>"#,
        );
        let candidates = collect_dom_candidates(&document, &base());
        assert_eq!(candidates[0].1, "https://example.com/recipes/hero.png");
    }

    #[test]
    fn test_json_ld_image_variants() {
        for (image, expected) in [
            (r#""https://img.example.com/a.jpg""#, "a.jpg"),
            (
                r#"["https://img.example.com/b.jpg", "https://img.example.com/c.jpg"]"#,
                "b.jpg",
            ),
            (r#"{"url": "https://img.example.com/d.jpg"}"#, "d.jpg"),
        ] {
            let html = format!(
                r#"<html><head><script type="application/ld+json">
                    {{"@type": "Recipe", "name": "Cake", "image": {image}}}
                </script></head></html>"#
            );
            let document = Html::parse_document(&html);
            let found = json_ld_recipe_image(&document, &base()).unwrap();
            assert!(found.ends_with(expected), "{found} should end with {expected}");
        }
    }

    #[test]
    fn test_json_ld_graph_is_searched() {
        let html = r#"<html><head><script type="application/ld+json">
            {"@graph": [
                {"@type": "WebSite", "name": "Food"},
                {"@type": "Recipe", "image": "https://img.example.com/g.jpg"}
            ]}
        </script></head></html>"#;
        let document = Html::parse_document(html);
        assert_eq!(
            json_ld_recipe_image(&document, &base()).unwrap(),
            "https://img.example.com/g.jpg"
        );
    }

    #[test]
    fn test_inline_images_filtered_and_sorted() {
        let document = Html::parse_document(
            r#"<html><body>
                <img src="/site-logo.png" width="400" height="400">
                <img src="/small.jpg" width="120" height="90">
                <img src="/medium.jpg" width="300" height="250">
                <img src="/large.jpg" width="640" height="480">
                <img src="/unsized.jpg">
                <img src="data:image/png;base64,AAAA" width="999" height="999">
                <img src="/art.svg" width="600" height="600">
            </body></html>"#,
        );
        let candidates = inline_image_candidates(&document, &base());
        assert_eq!(
            candidates,
            vec![
                "https://example.com/large.jpg",
                "https://example.com/medium.jpg"
            ]
        );
    }

    #[test]
    fn test_raw_scan_finds_meta_in_either_attribute_order() {
        let forward = r#"<meta property="og:image" content="https://x.com/a.jpg">"#;
        let reversed = r#"<meta content="https://x.com/b.jpg" property="og:image">"#;
        assert_eq!(
            marker_tag_attr(forward, "og:image", "content").unwrap(),
            "https://x.com/a.jpg"
        );
        assert_eq!(
            marker_tag_attr(reversed, "og:image", "content").unwrap(),
            "https://x.com/b.jpg"
        );
    }

    #[test]
    fn test_raw_scan_json_ld() {
        let html = r#"{"@type": "Recipe", "image": ["https://x.com/dish.jpg"]}"#;
        assert_eq!(raw_json_ld_image(html).unwrap(), "https://x.com/dish.jpg");
    }

    #[test]
    fn test_favicon_url_keeps_port() {
        assert_eq!(
            favicon_url("http://127.0.0.1:5500/recipes/1").unwrap(),
            "http://127.0.0.1:5500/favicon.ico"
        );
    }
}
