use axum::extract::{RawQuery, State};
use axum::response::Response;
use axum::Json;
use contracts::dashboards::d411_products::{
    products_view, ProductPerformance, ProductsMetricsResponse,
};
use contracts::shared::table::TableResponse;

use super::{report_filters, table_state};
use crate::dashboards::d411_products::service;
use crate::shared::api_error::ApiError;
use crate::shared::export::csv_response;
use crate::system::state::AppState;

/// GET /api/d411/products?page=0&page_size=20&search=..&sort_by=revenue&sort_order=desc
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<TableResponse<ProductPerformance>>, ApiError> {
    let filters = report_filters(&state, query.as_deref());
    let table = table_state(&products_view(), query.as_deref())?;
    Ok(Json(service::page(&state, &filters, table).await?))
}

/// GET /api/d411/products/metrics
pub async fn metrics(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Json<ProductsMetricsResponse> {
    let filters = report_filters(&state, query.as_deref());
    Json(service::metrics(&state, filters).await)
}

/// GET /api/d411/products/export.csv
pub async fn export_csv(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let filters = report_filters(&state, query.as_deref());
    let table = table_state(&products_view(), query.as_deref())?;
    let body = service::export(&state, &filters, &table).await?;
    let filename = format!("products_{}_{}.csv", filters.date_from, filters.date_to);
    Ok(csv_response(&filename, body))
}
