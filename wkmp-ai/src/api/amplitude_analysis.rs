//! Amplitude analysis API handlers
//!
//! **[IMPL008]** POST /analyze/amplitude

use axum::{
    extract::State,
    routing::post,
    Json, Router,
};

use crate::{
    error::ApiResult,
    models::{AmplitudeAnalysisRequest, AmplitudeAnalysisResponse},
    AppState,
};

/// **[IMPL008]** POST /analyze/amplitude
///
/// Analyze single file amplitude envelope.
pub async fn analyze_amplitude(
    State(_state): State<AppState>,
    Json(request): Json<AmplitudeAnalysisRequest>,
) -> ApiResult<Json<AmplitudeAnalysisResponse>> {
    // TODO: Implement amplitude analysis (SPEC025, IMPL009)
    tracing::info!(file_path = %request.file_path, "Amplitude analysis request (stub)");

    // Return stub response
    let response = AmplitudeAnalysisResponse {
        file_path: request.file_path,
        peak_rms: 0.85, // Stub value
        lead_in_duration: 2.5,
        lead_out_duration: 3.2,
        quick_ramp_up: false,
        quick_ramp_down: false,
        rms_profile: vec![0.1, 0.3, 0.6, 0.85, 0.82, 0.4, 0.2], // Stub profile
        analyzed_at: chrono::Utc::now(),
    };

    Ok(Json(response))
}

/// Build amplitude analysis routes
pub fn amplitude_routes() -> Router<AppState> {
    Router::new().route("/analyze/amplitude", post(analyze_amplitude))
}
