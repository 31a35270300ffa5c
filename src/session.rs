//! Per-session transient UI state.
//!
//! Everything here dies with the session: nothing is shared across
//! sessions and nothing survives a restart. Handlers receive the state
//! explicitly; there are no process-wide singletons.

use std::collections::{HashMap, HashSet};

use crate::images::ImageCache;
use crate::model::Recipe;
use crate::store::SortOrder;

/// A one-shot message rendered on the next page and then dropped.
#[derive(Debug, Clone)]
pub struct Flash {
    pub kind: FlashKind,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlashKind {
    Success,
    Error,
    Warning,
    Info,
}

/// Everything one browser session accumulates.
pub struct SessionState {
    /// Current unsaved extraction preview; a new extraction replaces it.
    pub preview: Option<Recipe>,
    /// Set after a successful save so a stale preview is not re-rendered.
    pub just_saved: bool,
    /// Record ids whose delete button has been pressed once and now await
    /// an explicit confirm or cancel.
    pub pending_delete: HashSet<String>,
    /// Browse results cached per sort order for the session's lifetime.
    pub list_cache: HashMap<SortOrder, Vec<Recipe>>,
    /// Downloaded image bytes backing this session's cards.
    pub images: ImageCache,
    /// Message carried across one redirect.
    pub flash: Option<Flash>,
}

impl SessionState {
    pub fn new() -> Self {
        Self {
            preview: None,
            just_saved: false,
            pending_delete: HashSet::new(),
            list_cache: HashMap::new(),
            images: ImageCache::new(),
            flash: None,
        }
    }

    /// Replace the preview; whatever was there is discarded.
    pub fn set_preview(&mut self, recipe: Recipe) {
        self.preview = Some(recipe);
        self.just_saved = false;
    }

    /// Cached lists are stale after any insert or delete.
    pub fn invalidate_lists(&mut self) {
        self.list_cache.clear();
    }

    pub fn set_flash(&mut self, kind: FlashKind, text: impl Into<String>) {
        self.flash = Some(Flash {
            kind,
            text: text.into(),
        });
    }

    /// The pending flash, consumed.
    pub fn take_flash(&mut self) -> Option<Flash> {
        self.flash.take()
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::new()
    }
}
