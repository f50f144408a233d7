pub mod a025_product_cost;
pub mod d410_sales;
pub mod d411_products;
pub mod d412_regions;
pub mod d413_finance;
pub mod d414_transactions;
pub mod filters;

use contracts::shared::filters::ReportFilters;
use contracts::shared::table::{TableParams, TableState, TableView};

use crate::shared::api_error::ApiError;
use crate::system::state::AppState;

/// Фильтры отчёта из строки запроса (`from`, `to`, `sku`, `region`, `dateType`)
pub fn report_filters(state: &AppState, query: Option<&str>) -> ReportFilters {
    ReportFilters::from_query(query.unwrap_or_default(), state.settings.anchor_date())
}

/// Состояние таблицы из той же строки запроса, приведённое к допустимому
pub fn table_state<T>(view: &TableView<T>, query: Option<&str>) -> Result<TableState, ApiError> {
    let params = TableParams::from_query(query.unwrap_or_default())
        .map_err(|e| ApiError::BadRequest(format!("Invalid table parameters: {}", e)))?;
    Ok(view.state_from(&params))
}
