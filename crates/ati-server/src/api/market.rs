use ati_analytics::{EmbeddingMap, MarketMap, MarketStats, TrendPoint};
use axum::{
    extract::{Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::{run_blocking, ApiError, ApiResponse, AppState};

const MAX_CLUSTERS: usize = 50;

#[derive(Debug, Deserialize)]
pub(super) struct MapQuery {
    pub k: Option<usize>,
}

pub(super) async fn get_stats(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<MarketStats>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| analytics.market_stats()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_trend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<TrendPoint>>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| analytics.market_trend()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_map(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MapQuery>,
) -> Result<Json<ApiResponse<MarketMap>>, ApiError> {
    let k = query.k.map(|k| k.clamp(1, MAX_CLUSTERS));
    let data = run_blocking(&state, &req_id.0, move |analytics| analytics.market_map(k)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn get_embedding_map(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<MapQuery>,
) -> Result<Json<ApiResponse<EmbeddingMap>>, ApiError> {
    let k = query.k.map(|k| k.clamp(1, MAX_CLUSTERS));
    let data = run_blocking(&state, &req_id.0, move |analytics| analytics.embedding_map(k)).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
