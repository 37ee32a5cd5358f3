use ati_analytics::BrandDetail;
use axum::{
    extract::{Path, State},
    Extension, Json,
};

use crate::middleware::RequestId;

use super::super::{run_blocking, ApiError, ApiResponse, AppState};

pub(in crate::api) async fn get_brand(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand): Path<String>,
) -> Result<Json<ApiResponse<BrandDetail>>, ApiError> {
    let data = run_blocking(&state, &req_id.0, move |analytics| {
        analytics.brand_detail(&brand)
    })
    .await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}
