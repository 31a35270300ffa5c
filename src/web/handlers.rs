use std::collections::BTreeSet;
use std::sync::Arc;

use axum::extract::{Multipart, Path, Query, State};
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};
use axum::Form;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::{error, warn};
use serde::Deserialize;

use super::views::{self, BrowseContext, Tab};
use super::{with_session_cookie, AppState};
use crate::error::KeeperError;
use crate::extract::RecipeSource;
use crate::i18n::{tr, tr_title};
use crate::model::Recipe;
use crate::session::{Flash, FlashKind};
use crate::store::SortOrder;

fn urlencode(value: &str) -> String {
    url::form_urlencoded::byte_serialize(value.as_bytes()).collect()
}

/// GET / — the add tab.
pub(super) async fn add_page(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let flashes: Vec<Flash> = session.take_flash().into_iter().collect();
    let html = views::add_page(session.preview.as_ref(), session.just_saved, &flashes);
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

#[derive(Deserialize)]
pub(super) struct ExtractForm {
    #[serde(default)]
    url: String,
}

/// POST /extract — extract from a URL, keep the result as the preview.
pub(super) async fn extract_url(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Form(form): Form<ExtractForm>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let mut flashes = Vec::new();

    if form.url.trim().is_empty() {
        // Rejected before any network call.
        flashes.push(Flash {
            kind: FlashKind::Warning,
            text: tr("enter_url_warning").to_string(),
        });
    } else {
        let source = RecipeSource::Url(form.url.clone());
        match app.extractor.extract(source, &mut session.images).await {
            Ok(recipe) => {
                session.set_preview(recipe);
                flashes.push(Flash {
                    kind: FlashKind::Success,
                    text: tr("recipe_extracted").to_string(),
                });
            }
            Err(KeeperError::InvalidInput(reason)) => {
                warn!("rejected URL input: {reason}");
                flashes.push(Flash {
                    kind: FlashKind::Warning,
                    text: tr("enter_url_warning").to_string(),
                });
            }
            Err(err) => {
                error!("extraction from URL failed: {err}");
                session.preview = None;
                flashes.push(Flash {
                    kind: FlashKind::Error,
                    text: format!("{}: {err}", tr("error_extract_url")),
                });
                flashes.push(Flash {
                    kind: FlashKind::Warning,
                    text: tr("extraction_failed").to_string(),
                });
            }
        }
    }

    let html = views::add_page(session.preview.as_ref(), session.just_saved, &flashes);
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

/// POST /extract-image — extract from an uploaded photo.
pub(super) async fn extract_image(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let mut flashes = Vec::new();

    match read_image_field(&mut multipart).await {
        None => {
            flashes.push(Flash {
                kind: FlashKind::Warning,
                text: tr("img_upload_error").to_string(),
            });
        }
        Some((mime_type, bytes)) => {
            let source = RecipeSource::Image { bytes, mime_type };
            match app.extractor.extract(source, &mut session.images).await {
                Ok(recipe) => {
                    session.set_preview(recipe);
                    flashes.push(Flash {
                        kind: FlashKind::Success,
                        text: tr("recipe_extracted").to_string(),
                    });
                }
                Err(KeeperError::InvalidInput(reason)) => {
                    warn!("rejected image upload: {reason}");
                    flashes.push(Flash {
                        kind: FlashKind::Warning,
                        text: format!("{} {reason}", tr("img_upload_error")),
                    });
                }
                Err(err) => {
                    error!("extraction from image failed: {err}");
                    session.preview = None;
                    flashes.push(Flash {
                        kind: FlashKind::Error,
                        text: format!("{}: {err}", tr("error_extract_image")),
                    });
                    flashes.push(Flash {
                        kind: FlashKind::Warning,
                        text: tr("extraction_failed").to_string(),
                    });
                }
            }
        }
    }

    let html = views::add_page(session.preview.as_ref(), session.just_saved, &flashes);
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

/// POST /preview/image — manual image upload when discovery found nothing.
pub(super) async fn upload_preview_image(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let mut flashes = Vec::new();

    match read_image_field(&mut multipart).await {
        Some((_, bytes)) if image::guess_format(&bytes).is_ok() => {
            if let Some(preview) = session.preview.as_mut() {
                preview.image_data_b64 = Some(STANDARD.encode(&bytes));
                flashes.push(Flash {
                    kind: FlashKind::Success,
                    text: tr("img_upload_success").to_string(),
                });
            }
        }
        _ => {
            flashes.push(Flash {
                kind: FlashKind::Warning,
                text: tr("img_upload_error").to_string(),
            });
        }
    }

    let html = views::add_page(session.preview.as_ref(), session.just_saved, &flashes);
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

/// POST /save — persist the current preview.
pub(super) async fn save_preview(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let mut flashes = Vec::new();

    if let Some(preview) = session.preview.clone() {
        match app.store.insert(&preview).await {
            Ok(_) => {
                session.preview = None;
                session.just_saved = true;
                session.invalidate_lists();
            }
            Err(err) => {
                error!("saving recipe failed: {err}");
                flashes.push(Flash {
                    kind: FlashKind::Error,
                    text: format!("{}: {err}", tr("error_save")),
                });
            }
        }
    }

    let html = views::add_page(session.preview.as_ref(), session.just_saved, &flashes);
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

#[derive(Deserialize)]
pub(super) struct BrowseQuery {
    sort: Option<String>,
    cuisine: Option<String>,
    meal: Option<String>,
}

/// GET /recipes — the browse tab.
pub(super) async fn browse(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<BrowseQuery>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let sort = SortOrder::parse(query.sort.as_deref().unwrap_or_default());
    let flash = session.take_flash();

    if !session.list_cache.contains_key(&sort) {
        match app.store.list_all(sort).await {
            Ok(records) => {
                session.list_cache.insert(sort, records);
            }
            Err(err) => {
                error!("listing recipes failed: {err}");
                let body = views::flash_html(&Flash {
                    kind: FlashKind::Error,
                    text: format!("{}: {err}", tr("error_fetch")),
                });
                let html = views::page(Tab::Browse, &body);
                return with_session_cookie(
                    is_new.then_some(sid),
                    axum::response::Html(html).into_response(),
                );
            }
        }
    }
    let records = session.list_cache.get(&sort).cloned().unwrap_or_default();

    let selected_cuisine = query
        .cuisine
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());
    let selected_meal = query
        .meal
        .as_deref()
        .map(str::trim)
        .filter(|s| !s.is_empty());

    // Filter buckets come from the loaded records themselves.
    let cuisines = filter_bucket(records.iter().map(|r| r.cuisine.as_deref()));
    let meal_types = filter_bucket(records.iter().map(|r| r.meal_type.as_deref()));

    let filtered: Vec<&Recipe> = records
        .iter()
        .filter(|r| {
            selected_cuisine.is_none_or(|c| r.cuisine.as_deref().map(str::trim) == Some(c))
                && selected_meal.is_none_or(|m| r.meal_type.as_deref().map(str::trim) == Some(m))
        })
        .collect();

    let mut from = format!("/recipes?sort={}", sort.as_str());
    if let Some(cuisine) = selected_cuisine {
        from.push_str(&format!("&cuisine={}", urlencode(cuisine)));
    }
    if let Some(meal) = selected_meal {
        from.push_str(&format!("&meal={}", urlencode(meal)));
    }

    let html = views::browse_page(&BrowseContext {
        recipes: filtered,
        total: records.len(),
        sort,
        cuisines,
        meal_types,
        selected_cuisine,
        selected_meal,
        pending_delete: &session.pending_delete,
        flash,
        from,
    });
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

/// POST /recipes/refresh — drop the session list caches.
pub(super) async fn refresh(State(app): State<Arc<AppState>>, headers: HeaderMap) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    session.lock().await.invalidate_lists();
    with_session_cookie(is_new.then_some(sid), Redirect::to("/recipes").into_response())
}

#[derive(Deserialize)]
pub(super) struct ReturnTo {
    #[serde(default)]
    from: String,
}

/// POST /recipes/{id}/delete — first press arms the confirmation.
pub(super) async fn arm_delete(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ReturnTo>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    session.lock().await.pending_delete.insert(id);
    redirect_back(is_new.then_some(sid), &form.from)
}

/// POST /recipes/{id}/confirm — second press actually deletes.
pub(super) async fn confirm_delete(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ReturnTo>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    session.pending_delete.remove(&id);

    let title = session
        .list_cache
        .values()
        .flatten()
        .find(|r| r.id_key().as_deref() == Some(id.as_str()))
        .map(|r| r.display_title().to_string())
        .unwrap_or_else(|| tr("untitled_recipe").to_string());

    match app.store.delete(&id).await {
        Ok(true) => {
            session.invalidate_lists();
            session.set_flash(FlashKind::Success, tr_title("recipe_deleted", &title));
        }
        Ok(false) => {
            // Already gone; not an error, but nothing to celebrate either.
            session.set_flash(FlashKind::Warning, tr("error_delete"));
        }
        Err(err) => {
            error!("deleting recipe {id} failed: {err}");
            session.set_flash(FlashKind::Error, format!("{}: {err}", tr("error_delete")));
        }
    }

    redirect_back(is_new.then_some(sid), &form.from)
}

/// POST /recipes/{id}/cancel — disarm the confirmation.
pub(super) async fn cancel_delete(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Form(form): Form<ReturnTo>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    session.lock().await.pending_delete.remove(&id);
    redirect_back(is_new.then_some(sid), &form.from)
}

#[derive(Deserialize)]
pub(super) struct SearchQuery {
    q: Option<String>,
}

/// GET /search — the free-text search tab.
pub(super) async fn search(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<SearchQuery>,
) -> Response {
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    let flash = session.take_flash();
    let text = query.q.unwrap_or_default();
    let trimmed = text.trim();

    let html = if trimmed.is_empty() {
        views::search_page(trimmed, None, &session.pending_delete, flash.as_ref())
    } else {
        match app.store.search(trimmed).await {
            Ok(results) => {
                views::search_page(trimmed, Some(&results), &session.pending_delete, flash.as_ref())
            }
            Err(err) => {
                error!("search failed: {err}");
                let body = views::flash_html(&Flash {
                    kind: FlashKind::Error,
                    text: format!("{}: {err}", tr("error_search")),
                });
                views::page(Tab::Search, &body)
            }
        }
    };
    with_session_cookie(is_new.then_some(sid), axum::response::Html(html).into_response())
}

#[derive(Deserialize)]
pub(super) struct ImageQuery {
    u: String,
}

/// GET /img — serve card images out of the session cache.
///
/// A cache miss falls back to redirecting the browser at the original
/// URL; image trouble must never take down a card.
pub(super) async fn image_proxy(
    State(app): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<ImageQuery>,
) -> Response {
    if !(query.u.starts_with("http://") || query.u.starts_with("https://")) {
        return StatusCode::NOT_FOUND.into_response();
    }
    let (sid, session, is_new) = app.session(&headers);
    let mut session = session.lock().await;
    session.images.ensure_cached(&app.http, &query.u).await;

    let response = match session.images.get(&query.u) {
        Some(cached) => (
            [(header::CONTENT_TYPE, cached.content_type.clone())],
            cached.bytes.clone(),
        )
            .into_response(),
        None => Redirect::temporary(&query.u).into_response(),
    };
    with_session_cookie(is_new.then_some(sid), response)
}

/// GET /style.css
pub(super) async fn stylesheet() -> impl IntoResponse {
    (
        [(header::CONTENT_TYPE, "text/css; charset=utf-8")],
        include_str!("style.css"),
    )
}

async fn read_image_field(multipart: &mut Multipart) -> Option<(String, Vec<u8>)> {
    while let Ok(Some(field)) = multipart.next_field().await {
        if field.name() == Some("image") {
            let mime_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await.ok()?;
            if bytes.is_empty() {
                return None;
            }
            return Some((mime_type, bytes.to_vec()));
        }
    }
    None
}

/// Redirect to a local path only; anything else lands on the browse tab.
fn redirect_back(sid: Option<uuid::Uuid>, from: &str) -> Response {
    let target = if from.starts_with('/') && !from.starts_with("//") {
        from
    } else {
        "/recipes"
    };
    with_session_cookie(sid, Redirect::to(target).into_response())
}

fn filter_bucket<'a>(values: impl Iterator<Item = Option<&'a str>>) -> Vec<String> {
    values
        .flatten()
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(String::from)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
