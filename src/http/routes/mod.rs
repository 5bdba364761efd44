use std::sync::Arc;

use axum::extract::State;
use axum::routing::get;
use axum::{Json, Router};

use crate::global::Global;
use crate::types::Category;

pub mod free_games;


pub fn routes() -> Router<Arc<Global>> {
    Router::new().route("/", get(root)).merge(free_games::routes())
}

#[derive(serde::Serialize)]
struct RootResponse {
    message: &'static str,
    version: &'static str,
    uptime: u64,
    endpoints: Vec<String>,
}

#[tracing::instrument(skip(global))]
async fn root(State(global): State<Arc<Global>>) -> Json<RootResponse> {
    let categories = [Category::Permanent, Category::Temporary, Category::Sale];

    let endpoints = std::iter::once("/api/free-games".to_string())
        .chain(categories.iter().map(|c| format!("/api/free-games/{}", c.slug())))
        .chain(std::iter::once("POST /api/scrape".to_string()))
        .collect();

    Json(RootResponse {
        message: "Free Games API",
        version: env!("CARGO_PKG_VERSION"),
        uptime: global.started_at.elapsed().as_secs(),
        endpoints,
    })
}
