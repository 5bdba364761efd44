use std::sync::Arc;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};

use crate::aggregate;
use crate::global::Global;
use crate::http::error::{ApiError, ApiErrorCode};
use crate::scraper::FetchMode;
use crate::types::{AggregateResult, Category};

pub fn routes() -> Router<Arc<Global>> {
    Router::new()
        .route("/api/free-games", get(get_all))
        .route("/api/free-games/:category", get(get_category))
        .route("/api/scrape", post(scrape))
}

/// GET /api/free-games
///
/// Every category, served from cache where fresh.
#[tracing::instrument(skip(global))]
async fn get_all(State(global): State<Arc<Global>>) -> Json<AggregateResult> {
    Json(aggregate::get_all(&global, FetchMode::Cached).await)
}

/// GET /api/free-games/:category
#[tracing::instrument(skip(global))]
async fn get_category(
    State(global): State<Arc<Global>>,
    Path(category): Path<String>,
) -> Result<Response, ApiError> {
    let category = Category::from_slug(&category)
        .ok_or_else(|| ApiError::not_found(ApiErrorCode::UNKNOWN_CATEGORY, "unknown category"))?;

    let response = match category {
        Category::Permanent => Json(aggregate::get_permanent_free_games(&global).await).into_response(),
        Category::Temporary => Json(aggregate::get_temporary_free_games(&global).await).into_response(),
        Category::Sale => Json(aggregate::get_discounted_games(&global).await).into_response(),
    };

    Ok(response)
}

/// POST /api/scrape
///
/// Scrape every source now, bypassing the cache, and make the result the
/// new backup snapshot.
#[tracing::instrument(skip(global))]
async fn scrape(State(global): State<Arc<Global>>) -> Result<Json<AggregateResult>, ApiError> {
    let result = aggregate::scrape_and_store(&global).await.map_err(|e| {
        tracing::error!(error = %e, "failed to persist scrape result");
        ApiError::internal_server_error(ApiErrorCode::BACKUP_ERROR, "failed to persist scrape result")
    })?;

    Ok(Json(result))
}
