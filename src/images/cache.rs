use log::debug;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use sha2::{Digest, Sha256};
use std::collections::HashMap;
use std::time::{Duration, Instant};

const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);
const FETCH_TIMEOUT: Duration = Duration::from_secs(5);

/// One cached download: raw bytes plus the declared content type.
pub struct CachedImage {
    pub bytes: Vec<u8>,
    pub content_type: String,
    fetched_at: Instant,
}

/// Session-scoped, content-addressed image cache.
///
/// Keys are a hash of the source URL. Entries go logically stale after
/// `max_age` but are only evicted lazily when the same key is touched
/// again; there is no background sweep and no size bound.
pub struct ImageCache {
    entries: HashMap<String, CachedImage>,
    max_age: Duration,
}

impl ImageCache {
    pub fn new() -> Self {
        Self::with_max_age(DEFAULT_MAX_AGE)
    }

    pub fn with_max_age(max_age: Duration) -> Self {
        Self {
            entries: HashMap::new(),
            max_age,
        }
    }

    /// Stable cache key for a URL.
    pub fn key(url: &str) -> String {
        hex::encode(Sha256::digest(url.as_bytes()))
    }

    /// Fetch and store the image unless a fresh copy is already cached.
    ///
    /// Within the freshness window this is a no-op; no revalidation is
    /// attempted. Responses that are not successful, not declared as an
    /// image, or whose bytes do not decode as a real image are discarded
    /// silently: a bad image must never surface as an error.
    pub async fn ensure_cached(&mut self, client: &Client, url: &str) {
        if url.is_empty() {
            return;
        }
        let key = Self::key(url);
        if let Some(entry) = self.entries.get(&key) {
            if entry.fetched_at.elapsed() < self.max_age {
                return;
            }
            self.entries.remove(&key);
        }

        let Ok(response) = client.get(url).timeout(FETCH_TIMEOUT).send().await else {
            return;
        };
        if !response.status().is_success() {
            return;
        }
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.starts_with("image/") {
            return;
        }
        let Ok(bytes) = response.bytes().await else {
            return;
        };
        // A success status with an image content type can still carry
        // garbage; only bytes that decode are worth keeping.
        if image::load_from_memory(&bytes).is_err() {
            debug!("discarding undecodable image bytes from {url}");
            return;
        }
        self.entries.insert(
            key,
            CachedImage {
                bytes: bytes.to_vec(),
                content_type,
                fetched_at: Instant::now(),
            },
        );
    }

    /// Cached bytes for a URL, if present and not past the age limit.
    /// Expired entries are evicted here, on access.
    pub fn get(&mut self, url: &str) -> Option<&CachedImage> {
        let key = Self::key(url);
        let expired = match self.entries.get(&key) {
            Some(entry) => entry.fetched_at.elapsed() >= self.max_age,
            None => return None,
        };
        if expired {
            self.entries.remove(&key);
            return None;
        }
        self.entries.get(&key)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for ImageCache {
    fn default() -> Self {
        Self::new()
    }
}
