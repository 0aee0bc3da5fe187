use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::{Request, State};
use axum::http::header::{ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_ORIGIN};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;

use crate::analysis::{AnalysisRequest, AnalysisResult, Analyzer};
use crate::error::{AnalysisError, HttpError, HttpResult};

pub const ALLOWED_HEADERS: &str = "authorization, x-client-info, apikey, content-type";

#[derive(Clone)]
pub struct AppState {
    pub analyzer: Arc<Analyzer>,
}

impl AppState {
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer: Arc::new(analyzer),
        }
    }
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/analyze-job", post(handle_analyze_job))
        .route("/health", get(handle_health))
        .fallback(handle_not_found)
        .layer(middleware::from_fn(answer_preflight))
        .layer(TraceLayer::new_for_http())
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            HeaderValue::from_static("*"),
        ))
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_HEADERS,
            HeaderValue::from_static(ALLOWED_HEADERS),
        ))
        .with_state(state)
}

#[axum_macros::debug_handler]
async fn handle_analyze_job(
    State(state): State<AppState>,
    body: Bytes,
) -> HttpResult<Json<AnalysisResult>> {
    // Browsers posting a plain string send text/plain, so the body is
    // decoded as JSON whatever the content type says.
    let outcome = match serde_json::from_slice::<AnalysisRequest>(&body) {
        Ok(request) => state.analyzer.analyze(&request).await,
        Err(err) => Err(AnalysisError::InvalidBody(err.to_string())),
    };

    outcome.map(Json).map_err(|err| {
        err.log();
        HttpError::from(err)
    })
}

/// Every path answers OPTIONS with an empty 200, before routing.
async fn answer_preflight(request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return StatusCode::OK.into_response();
    }
    next.run(request).await
}

async fn handle_health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}

async fn handle_not_found() -> HttpError {
    HttpError::new(StatusCode::NOT_FOUND, "Not found")
}
