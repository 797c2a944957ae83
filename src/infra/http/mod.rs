//! Public HTTP surface.
//!
//! One route per category plus the index; everything reads from the render
//! cache and never waits on an in-flight enrichment call. Query-filtered
//! variants render per request.

use std::sync::Arc;

use axum::{
    Router,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::get,
};
use serde::Deserialize;
use tracing::error;

use crate::domain::entries::Category;
use crate::render::RenderError;
use crate::render::cache::PageCache;
use crate::render::context::PageKind;

use super::assets;

#[derive(Clone)]
pub struct HttpState {
    pub pages: Arc<PageCache>,
}

pub fn build_router(state: HttpState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/{category}", get(category_page))
        .route("/static/public/{*path}", get(assets::serve_public))
        .route("/_health", get(health))
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct SearchQuery {
    q: Option<String>,
}

async fn index(State(state): State<HttpState>) -> Response {
    page_response(state.pages.page(PageKind::Index))
}

async fn category_page(
    State(state): State<HttpState>,
    Path(segment): Path<String>,
    Query(query): Query<SearchQuery>,
) -> Response {
    let Ok(category) = segment.parse::<Category>() else {
        return (StatusCode::NOT_FOUND, "Not found").into_response();
    };

    let result = match query.q.as_deref().map(str::trim).filter(|q| !q.is_empty()) {
        Some(q) => state.pages.filtered_page(category, q),
        None => state.pages.page(PageKind::Category(category)),
    };
    page_response(result)
}

async fn health() -> &'static str {
    "ok"
}

fn page_response(result: Result<String, RenderError>) -> Response {
    match result {
        Ok(html) => Html(html).into_response(),
        Err(err) => {
            error!(error = %err, "page render failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "Page could not be rendered").into_response()
        }
    }
}
