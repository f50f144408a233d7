use axum::extract::{RawQuery, State};
use axum::response::Response;
use axum::Json;
use contracts::dashboards::d414_transactions::{transactions_view, TransactionDetail};
use contracts::shared::table::TableResponse;

use super::{report_filters, table_state};
use crate::dashboards::d414_transactions::service;
use crate::shared::api_error::ApiError;
use crate::shared::export::csv_response;
use crate::system::state::AppState;

/// GET /api/d414/transactions?page=0&page_size=25&search=..&sort_by=operation_date
pub async fn list(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Json<TableResponse<TransactionDetail>>, ApiError> {
    let filters = report_filters(&state, query.as_deref());
    let table = table_state(&transactions_view(), query.as_deref())?;
    Ok(Json(service::page(&state, &filters, table).await?))
}

/// GET /api/d414/transactions/export.csv
pub async fn export_csv(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
) -> Result<Response, ApiError> {
    let filters = report_filters(&state, query.as_deref());
    let table = table_state(&transactions_view(), query.as_deref())?;
    let body = service::export(&state, &filters, &table).await?;
    let filename = format!("transactions_{}_{}.csv", filters.date_from, filters.date_to);
    Ok(csv_response(&filename, body))
}
