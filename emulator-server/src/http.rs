//! HTTP listener routes

use crate::context::HttpRequestContext;
use crate::state::AppState;
use axum::{
    extract::{Path, State},
    http::{HeaderMap, StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use emulator_core::AggregatedResponse;
use tower_http::trace::TraceLayer;
use tracing::debug;

/// Router of the HTTP listener.
///
/// Every configured endpoint answers `/{endpoint}` with any method; the root
/// answers with an empty response and any other path with 404.
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", any(root_handler))
        .route("/{endpoint}", any(endpoint_handler))
        .fallback(not_found_handler)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn root_handler() -> Json<AggregatedResponse> {
    Json(AggregatedResponse::default())
}

async fn endpoint_handler(
    State(state): State<AppState>,
    Path(name): Path<String>,
    headers: HeaderMap,
) -> Response {
    let Some(endpoint) = state.endpoint(&name) else {
        return not_found(&name);
    };

    let context = HttpRequestContext::new(headers);
    let response = state.handle(&context, endpoint).await;

    (StatusCode::OK, Json(response)).into_response()
}

async fn not_found_handler(uri: Uri) -> Response {
    not_found(uri.path().trim_start_matches('/'))
}

fn not_found(endpoint: &str) -> Response {
    debug!("Endpoint {} doesn't exist", endpoint);
    (StatusCode::NOT_FOUND, Json(AggregatedResponse::not_found(endpoint))).into_response()
}
