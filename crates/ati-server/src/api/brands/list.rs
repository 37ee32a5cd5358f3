use ati_analytics::BrandSummary;
use axum::{extract::State, Extension, Json};

use crate::middleware::RequestId;

use super::super::{run_blocking, ApiError, ApiResponse, AppState};

pub(in crate::api) async fn list_brands(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<BrandSummary>>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, |analytics| analytics.list_brands()).await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
