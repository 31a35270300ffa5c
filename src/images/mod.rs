//! Finding and caching recipe images.
//!
//! `discovery` walks a page for a representative image via an ordered
//! fallback cascade; `cache` keeps downloaded image bytes for the session.

mod cache;
mod discovery;

pub use cache::{CachedImage, ImageCache};
pub use discovery::ImageDiscovery;
