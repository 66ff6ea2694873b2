use axum::{extract::rejection::JsonRejection, extract::State, Extension, Json};
use roimatch_model::{PredictionRequest, PredictionResponse};

use crate::middleware::RequestId;

use super::{map_service_error, ApiError, AppState};

/// Single-creator ROI prediction. Success returns the prediction body
/// without the `data`/`meta` envelope.
pub(super) async fn predict_roi(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    payload: Result<Json<PredictionRequest>, JsonRejection>,
) -> Result<Json<PredictionResponse>, ApiError> {
    let Json(request) =
        payload.map_err(|e| ApiError::new(req_id.0.clone(), "validation_error", e.body_text()))?;

    let response = state
        .service
        .predict_roi(&request)
        .map_err(|e| map_service_error(req_id.0.clone(), &e))?;

    tracing::debug!(
        request_id = %req_id.0,
        platform = %response.input_info.platform,
        predicted_roi = response.ai_analysis.predicted_roi,
        "prediction served"
    );
    Ok(Json(response))
}
