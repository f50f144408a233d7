use axum::extract::{RawQuery, State};
use axum::Json;
use contracts::dashboards::d413_finance::{
    CostAnalysisResponse, FinanceBreakdownResponse, FinanceReportResponse,
    LedgerCostAnalysisResponse, OperationStatsResponse,
};

use super::report_filters;
use crate::dashboards::d413_finance::service;
use crate::system::state::AppState;

/// GET /api/d413/finance/summary
pub async fn summary(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<FinanceReportResponse> {
    let filters = report_filters(&state, query.as_deref());
    tracing::info!("D413 Finance: summary for {}", filters.display_range());
    Json(service::report(&state, filters).await)
}

/// GET /api/d413/finance/breakdown
pub async fn breakdown(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<FinanceBreakdownResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::breakdown(&state, filters).await)
}

/// GET /api/d413/finance/cost-analysis
pub async fn cost_analysis(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<CostAnalysisResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::cost_analysis(&state, filters).await)
}

/// GET /api/d413/finance/ledger-cost-analysis
pub async fn ledger_cost_analysis(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<LedgerCostAnalysisResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::ledger_cost_analysis(&state, filters).await)
}

/// GET /api/d413/finance/operations
pub async fn operations(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<OperationStatsResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::operations(&state, filters).await)
}
