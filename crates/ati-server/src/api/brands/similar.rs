use ati_analytics::SimilarBrand;
use axum::{
    extract::{Path, Query, State},
    Extension, Json,
};
use serde::Deserialize;

use crate::middleware::RequestId;

use super::super::{run_blocking, ApiError, ApiResponse, AppState};

const DEFAULT_SIMILAR: usize = 3;
const MAX_SIMILAR: usize = 50;

#[derive(Debug, Deserialize)]
pub(in crate::api) struct SimilarQuery {
    pub k: Option<usize>,
}

pub(in crate::api) fn normalize_k(k: Option<usize>) -> usize {
    k.unwrap_or(DEFAULT_SIMILAR).clamp(1, MAX_SIMILAR)
}

pub(in crate::api) async fn list_similar(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(brand): Path<String>,
    Query(query): Query<SimilarQuery>,
) -> Result<Json<ApiResponse<Vec<SimilarBrand>>>, ApiError> {
    let k = normalize_k(query.k);
    let data = run_blocking(&state, &req_id.0, move |analytics| {
        analytics.similar_brands(&brand, k)
    })
    .await?;
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn k_defaults_and_is_bounded() {
        assert_eq!(normalize_k(None), 3);
        assert_eq!(normalize_k(Some(0)), 1);
        assert_eq!(normalize_k(Some(500)), 50);
        assert_eq!(normalize_k(Some(7)), 7);
    }
}
