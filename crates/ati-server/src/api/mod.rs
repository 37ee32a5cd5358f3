mod analyze;
mod brands;
mod diagnostics;
mod market;
mod posts;

use std::sync::Arc;

use ati_analytics::{Analytics, AnalyticsError};
use ati_oracle::OracleClient;
use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::middleware::{request_id, RequestId};

#[derive(Clone)]
pub struct AppState {
    pub analytics: Arc<Analytics>,
    pub oracle: Option<Arc<OracleClient>>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    dataset: &'static str,
    posts: usize,
    brands: usize,
    skipped_rows: usize,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct ReloadData {
    posts: usize,
    brands: usize,
    skipped_rows: usize,
    sources: Vec<String>,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "bad_request" => StatusCode::BAD_REQUEST,
            "source_unavailable" | "scoring_unavailable" => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

/// Default 10, bounded to 1..=100.
pub(super) fn normalize_limit(limit: Option<usize>) -> usize {
    limit.unwrap_or(10).clamp(1, 100)
}

pub(super) fn map_analytics_error(request_id: &str, error: &AnalyticsError) -> ApiError {
    match error {
        AnalyticsError::UnknownBrand(brand) => {
            ApiError::new(request_id, "not_found", format!("brand '{brand}' not found"))
        }
        AnalyticsError::SourceUnavailable(e) => {
            tracing::warn!(error = %e, "post data unavailable");
            ApiError::new(request_id, "source_unavailable", "post data is unavailable")
        }
    }
}

/// Run an analytics query off the async runtime.
pub(super) async fn run_blocking<T, F>(
    state: &AppState,
    request_id: &str,
    query: F,
) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Analytics) -> Result<T, AnalyticsError> + Send + 'static,
{
    let analytics = Arc::clone(&state.analytics);
    tokio::task::spawn_blocking(move || query(&analytics))
        .await
        .map_err(|e| {
            tracing::error!(error = %e, "analytics task failed");
            ApiError::new(request_id, "internal_error", "analytics task failed")
        })?
        .map_err(|e| map_analytics_error(request_id, &e))
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE, HeaderName::from_static("x-request-id")])
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route("/api/v1/health", get(health))
        .route("/api/v1/brands", get(brands::list_brands))
        .route("/api/v1/brands/{brand}", get(brands::get_brand))
        .route("/api/v1/brands/{brand}/similar", get(brands::list_similar))
        .route("/api/v1/market/stats", get(market::get_stats))
        .route("/api/v1/market/trend", get(market::get_trend))
        .route("/api/v1/market/map", get(market::get_map))
        .route(
            "/api/v1/market/embedding-map",
            get(market::get_embedding_map),
        )
        .route("/api/v1/diagnostics/deciles", get(diagnostics::get_deciles))
        .route(
            "/api/v1/diagnostics/correlation",
            get(diagnostics::get_correlation),
        )
        .route(
            "/api/v1/diagnostics/engagement-scaling",
            get(diagnostics::get_engagement_scaling),
        )
        .route(
            "/api/v1/diagnostics/engagement-tail",
            get(diagnostics::get_engagement_tail),
        )
        .route("/api/v1/posts/outliers", get(posts::list_outliers))
        .route("/api/v1/posts/high-ati", get(posts::list_high_ati))
        .route("/api/v1/posts/scatter", get(posts::sample_scatter))
        .route("/api/v1/analyze", post(analyze::analyze_content))
        .route("/api/v1/admin/reload", post(reload))
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let loaded = run_blocking(&state, &req_id.0, |analytics| {
        analytics.dataset().map(|d| {
            (d.records().len(), d.aggregates().len(), d.skipped_rows())
        })
    })
    .await;

    match loaded {
        Ok((posts, brands, skipped_rows)) => (
            StatusCode::OK,
            Json(ApiResponse::new(
                HealthData {
                    status: "ok",
                    dataset: "ok",
                    posts,
                    brands,
                    skipped_rows,
                },
                req_id.0,
            )),
        ),
        Err(e) => {
            tracing::warn!(code = %e.error.code, "health check: dataset unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse::new(
                    HealthData {
                        status: "degraded",
                        dataset: "unavailable",
                        posts: 0,
                        brands: 0,
                        skipped_rows: 0,
                    },
                    req_id.0,
                )),
            )
        }
    }
}

async fn reload(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<ReloadData>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| {
        analytics.invalidate();
        let dataset = analytics.dataset()?;
        Ok(ReloadData {
            posts: dataset.records().len(),
            brands: dataset.aggregates().len(),
            skipped_rows: dataset.skipped_rows(),
            sources: dataset.source_ids().into_iter().map(String::from).collect(),
        })
    })
    .await?;

    tracing::info!(posts = data.posts, brands = data.brands, "dataset reloaded");
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

#[cfg(test)]
#[path = "api_test.rs"]
mod tests;
