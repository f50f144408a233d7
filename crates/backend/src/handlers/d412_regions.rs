use axum::extract::{RawQuery, State};
use axum::Json;
use contracts::dashboards::d412_regions::{RegionsMetricsResponse, RegionsResponse};
use contracts::shared::table::TableParams;

use super::report_filters;
use crate::dashboards::d412_regions::service;
use crate::shared::api_error::ApiError;
use crate::system::state::AppState;

/// GET /api/d412/regions?sort_by=revenue&sort_order=desc
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<RegionsResponse>, ApiError> {
    let filters = report_filters(&state, query.as_deref());
    let params = TableParams::from_query(query.as_deref().unwrap_or_default())
        .map_err(|e| ApiError::BadRequest(format!("Invalid sort parameters: {}", e)))?;
    Ok(Json(service::list(&state, filters, &params).await))
}

/// GET /api/d412/regions/metrics
pub async fn metrics(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<RegionsMetricsResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::metrics(&state, filters).await)
}
