//! HTTP API: liveness, search and add routes.

use crate::error::MedragError;
use crate::ingest::{AddRequest, Ingestor};
use crate::search::SearchService;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, warn};

/// Shared application state.
pub struct AppState {
    pub search: SearchService,
    pub ingestor: Ingestor,
}

/// Build the router with permissive CORS.
pub fn router(state: Arc<AppState>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/", get(home))
        .route("/search", get(search))
        .route("/add", post(add))
        .layer(cors)
        .with_state(state)
}

#[derive(Deserialize)]
struct SearchParams {
    query: Option<String>,
}

#[derive(Serialize)]
struct ErrorResponse {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
        .into_response()
}

impl IntoResponse for MedragError {
    fn into_response(self) -> Response {
        if self.is_client_error() {
            warn!("Rejected request: {}", self);
            error_response(StatusCode::BAD_REQUEST, self.to_string())
        } else {
            error!("Request failed: {}", self);
            error_response(StatusCode::INTERNAL_SERVER_ERROR, self.to_string())
        }
    }
}

// === Handlers ===

async fn home() -> impl IntoResponse {
    Json(serde_json::json!({ "message": "server is alive" }))
}

async fn search(
    State(state): State<Arc<AppState>>,
    Query(params): Query<SearchParams>,
) -> Response {
    let Some(query) = params.query.filter(|q| !q.is_empty()) else {
        return error_response(StatusCode::BAD_REQUEST, "Missing 'query' parameter");
    };

    match state.search.search(&query).await {
        Ok(response) => Json(response).into_response(),
        Err(e) => e.into_response(),
    }
}

async fn add(
    State(state): State<Arc<AppState>>,
    body: Result<Json<AddRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => {
            return error_response(StatusCode::BAD_REQUEST, rejection.body_text());
        }
    };

    match state.ingestor.add(request).await {
        Ok(outcome) => Json(outcome).into_response(),
        Err(e) => e.into_response(),
    }
}
