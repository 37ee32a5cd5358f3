//! Distribution and correlation diagnostics.

use ati_analytics::{CorrelationResult, DecileBucket, EngagementScaling, EngagementTail, Metric};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{run_blocking, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct DecileQuery {
    pub metric: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CorrelationQuery {
    pub a: Option<String>,
    pub b: Option<String>,
}

/// Parse an optional metric name, falling back to `default`.
pub(super) fn parse_metric(
    request_id: &str,
    raw: Option<&str>,
    default: Metric,
) -> Result<Metric, ApiError> {
    match raw.map(str::trim).filter(|s| !s.is_empty()) {
        Some(name) => name
            .parse()
            .map_err(|message: String| ApiError::new(request_id, "bad_request", message)),
        None => Ok(default),
    }
}

pub(super) async fn get_deciles(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<DecileQuery>,
) -> Result<Json<ApiResponse<Vec<DecileBucket>>>, ApiError> {
    let metric = parse_metric(&req_id.0, query.metric.as_deref(), Metric::Ati)?;
    let data = run_blocking(&state, &req_id.0, move |analytics| analytics.deciles(metric)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_correlation(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<CorrelationQuery>,
) -> Result<Json<ApiResponse<CorrelationResult>>, ApiError> {
    let a = parse_metric(&req_id.0, query.a.as_deref(), Metric::Ati)?;
    let b = parse_metric(&req_id.0, query.b.as_deref(), Metric::Engagement)?;
    let data = run_blocking(&state, &req_id.0, move |analytics| analytics.correlation(a, b)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_engagement_scaling(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<EngagementScaling>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| analytics.engagement_scaling()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_engagement_tail(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<EngagementTail>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| analytics.engagement_tail()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
