//! HTTP boundary: one query route plus permissive CORS. Every failure leaves
//! this layer as a JSON `{ ok: false, error }` envelope; nothing escapes as a
//! bare error.

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tracing::error;

use crate::config::Config;
use crate::fetch;
use crate::parse::records::LicenseRecord;
use crate::query::{self, QueryParams};
use crate::store::Cache;

pub struct AppState {
    pub client: Client,
    pub config: Config,
    pub cache: Cache,
}

pub fn router(state: Arc<AppState>) -> Router {
    // Permissive CORS; the layer also answers the OPTIONS preflight itself.
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/licenses", get(list_licenses))
        .route("/healthz", get(|| async { "ok" }))
        .layer(cors)
        .with_state(state)
}

#[derive(Debug, Deserialize)]
struct RawQuery {
    q: Option<String>,
    page: Option<String>,
    #[serde(rename = "pageSize")]
    page_size: Option<String>,
}

impl RawQuery {
    /// Request strings → normalized params. Unparsable numbers fall back to
    /// their defaults rather than failing the request.
    fn normalize(self) -> QueryParams {
        QueryParams::normalize(
            self.q,
            self.page.and_then(|s| s.parse().ok()),
            self.page_size.and_then(|s| s.parse().ok()),
        )
    }
}

#[derive(Serialize)]
struct LicensePage {
    ok: bool,
    total: usize,
    page: usize,
    #[serde(rename = "pageSize")]
    page_size: usize,
    results: Vec<LicenseRecord>,
}

async fn list_licenses(
    State(state): State<Arc<AppState>>,
    Query(raw): Query<RawQuery>,
) -> Response {
    let params = raw.normalize();

    let entry = state
        .cache
        .get_with(|| fetch::fetch_and_parse(&state.client, &state.config))
        .await;

    match entry {
        Ok(entry) => {
            let page = query::run(&entry.records, &params);
            Json(LicensePage {
                ok: true,
                total: page.total,
                page: page.page,
                page_size: page.page_size,
                results: page.results,
            })
            .into_response()
        }
        Err(e) => {
            error!(error = %e, "ingestion failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "ok": false, "error": e.to_string() })),
            )
                .into_response()
        }
    }
}
