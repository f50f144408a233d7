use axum::extract::{RawQuery, State};
use axum::Json;
use contracts::dashboards::d410_sales::{DailySalesResponse, SalesMetricsResponse};

use super::report_filters;
use crate::dashboards::d410_sales::service;
use crate::system::state::AppState;

/// GET /api/d410/sales/metrics
pub async fn metrics(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<SalesMetricsResponse> {
    let filters = report_filters(&state, query.as_deref());
    tracing::info!("D410 Sales: metrics for {}", filters.display_range());
    Json(service::metrics(&state, filters).await)
}

/// GET /api/d410/sales/daily
pub async fn daily(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<DailySalesResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::daily(&state, filters).await)
}
