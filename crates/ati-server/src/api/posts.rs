use ati_analytics::{RankedPost, ScatterPost};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{normalize_limit, run_blocking, ApiError, ApiResponse, AppState};

const DEFAULT_SCATTER_SIZE: usize = 100;
const MAX_SCATTER_SIZE: usize = 1000;

#[derive(Debug, Deserialize)]
pub(super) struct PostsQuery {
    pub limit: Option<usize>,
}

pub(super) async fn list_outliers(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<RankedPost>>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let data = run_blocking(&state, &req_id.0, move |analytics| analytics.tail_outliers(limit)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn list_high_ati(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<RankedPost>>>, ApiError> {
    let limit = normalize_limit(query.limit);
    let data =
        run_blocking(&state, &req_id.0, move |analytics| analytics.high_ati_posts(limit)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn sample_scatter(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<PostsQuery>,
) -> Result<Json<ApiResponse<Vec<ScatterPost>>>, ApiError> {
    let limit = query
        .limit
        .unwrap_or(DEFAULT_SCATTER_SIZE)
        .clamp(1, MAX_SCATTER_SIZE);
    let data =
        run_blocking(&state, &req_id.0, move |analytics| analytics.scatter_sample(limit)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
