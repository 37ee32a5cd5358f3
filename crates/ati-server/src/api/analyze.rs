//! `POST /api/v1/analyze`: score content with the oracle and place it in the market.

use ati_analytics::ContentAssessment;
use ati_oracle::{ContentRequest, OracleScore};
use axum::{extract::State, Extension, Json};
use serde::Serialize;

use crate::middleware::RequestId;

use super::{run_blocking, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct AnalyzeData {
    score: OracleScore,
    assessment: ContentAssessment,
}

pub(super) async fn analyze_content(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(request): Json<ContentRequest>,
) -> Result<Json<ApiResponse<AnalyzeData>>, ApiError> {
    if request.is_empty() {
        return Err(ApiError::new(
            &req_id.0,
            "bad_request",
            "provide text or image_base64",
        ));
    }

    let Some(oracle) = state.oracle.as_ref() else {
        return Err(ApiError::new(
            &req_id.0,
            "scoring_unavailable",
            "scoring oracle is not configured",
        ));
    };

    let score = oracle.score(&request).await.map_err(|e| {
        tracing::warn!(error = %e, "oracle scoring failed");
        ApiError::new(&req_id.0, "scoring_unavailable", "scoring oracle request failed")
    })?;

    let ati = score.ati;
    let assessment = run_blocking(&state, &req_id.0, move |analytics| analytics.assess(ati)).await?;

    Ok(Json(ApiResponse::new(AnalyzeData { score, assessment }, req_id.0)))
}
