use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use roimatch_core::Recommendation;
use roimatch_model::RecommendationRequest;

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, ApiResponse, AppState, ResponseMeta};

pub(super) async fn recommend(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<RecommendationRequest>, JsonRejection>,
) -> Result<Json<ApiResponse<Vec<Recommendation>>>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let data = state
        .service
        .recommend(&request)
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    Ok(Json(ApiResponse {
        data,
        meta: ResponseMeta::new(req_id.0),
    }))
}
