//! The server-rendered web surface: routing and session plumbing.
//!
//! One interaction is one synchronous request/response cycle. Each
//! browser session gets its own [`SessionState`] behind its own mutex,
//! so a session's interactions are serialized and nothing is shared
//! across sessions.

mod handlers;
mod views;

use std::sync::Arc;

use axum::http::header::{COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use axum::response::Response;
use axum::routing::{get, post};
use axum::Router;
use dashmap::DashMap;
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::extract::RecipeExtractor;
use crate::session::SessionState;
use crate::store::RecipeStore;

/// Shared application state handed to every handler.
pub struct AppState {
    pub store: RecipeStore,
    pub extractor: RecipeExtractor,
    /// Client used for cache fills from the image proxy.
    pub http: reqwest::Client,
    sessions: DashMap<Uuid, Arc<Mutex<SessionState>>>,
}

impl AppState {
    pub fn new(store: RecipeStore, extractor: RecipeExtractor) -> Self {
        Self {
            store,
            extractor,
            http: reqwest::Client::new(),
            sessions: DashMap::new(),
        }
    }

    /// The session for this request, created when the cookie is absent or
    /// stale. Returns (id, state, newly-created).
    pub(crate) fn session(
        &self,
        headers: &HeaderMap,
    ) -> (Uuid, Arc<Mutex<SessionState>>, bool) {
        if let Some(sid) = cookie_sid(headers) {
            if let Some(entry) = self.sessions.get(&sid) {
                return (sid, entry.clone(), false);
            }
        }
        let sid = Uuid::new_v4();
        let state = Arc::new(Mutex::new(SessionState::new()));
        self.sessions.insert(sid, state.clone());
        (sid, state, true)
    }
}

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::add_page))
        .route("/extract", post(handlers::extract_url))
        .route("/extract-image", post(handlers::extract_image))
        .route("/preview/image", post(handlers::upload_preview_image))
        .route("/save", post(handlers::save_preview))
        .route("/recipes", get(handlers::browse))
        .route("/recipes/refresh", post(handlers::refresh))
        .route("/recipes/{id}/delete", post(handlers::arm_delete))
        .route("/recipes/{id}/confirm", post(handlers::confirm_delete))
        .route("/recipes/{id}/cancel", post(handlers::cancel_delete))
        .route("/search", get(handlers::search))
        .route("/img", get(handlers::image_proxy))
        .route("/style.css", get(handlers::stylesheet))
        // Photo uploads are routinely bigger than the 2 MB default.
        .layer(axum::extract::DefaultBodyLimit::max(16 * 1024 * 1024))
        .with_state(state)
}

fn cookie_sid(headers: &HeaderMap) -> Option<Uuid> {
    headers
        .get(COOKIE)?
        .to_str()
        .ok()?
        .split(';')
        .find_map(|pair| {
            let (name, value) = pair.trim().split_once('=')?;
            if name == "sid" {
                Uuid::parse_str(value).ok()
            } else {
                None
            }
        })
}

/// Attach the session cookie when the session was created by this request.
pub(crate) fn with_session_cookie(new_sid: Option<Uuid>, mut response: Response) -> Response {
    if let Some(sid) = new_sid {
        if let Ok(value) = HeaderValue::from_str(&format!("sid={sid}; Path=/; HttpOnly")) {
            response.headers_mut().insert(SET_COOKIE, value);
        }
    }
    response
}
