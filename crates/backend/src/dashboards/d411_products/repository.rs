use contracts::dashboards::d411_products::{
    ProductPerformanceRow, ProductsMetricsRow, METRICS_RPC, PERFORMANCE_RPC,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::table::TableState;
use serde_json::Value;

use crate::dashboards::rpc_params;
use crate::shared::data::query::sanitize_search;
use crate::shared::data::{BackendError, PostgrestClient};

/// Колонка сортировки для процедуры: прибыль процедура не считает
fn rpc_sort_column(key: &str) -> &str {
    match key {
        "netProfit" => "revenue",
        other => other,
    }
}

/// Параметры процедуры производительности товаров
pub fn performance_params(
    filters: &ReportFilters,
    state: &TableState,
    offset: usize,
    limit: usize,
) -> Value {
    let mut params = rpc_params(filters);
    let search = sanitize_search(&state.search);
    params["search_term"] = if search.is_empty() {
        Value::Null
    } else {
        Value::String(search)
    };
    params["sort_by"] = Value::String(rpc_sort_column(&state.sort_by).to_string());
    params["sort_order"] = Value::String(state.sort_order.as_str().to_string());
    params["page_offset"] = Value::from(offset);
    params["page_size"] = Value::from(limit);
    params
}

pub async fn performance(
    client: &PostgrestClient,
    filters: &ReportFilters,
    state: &TableState,
    offset: usize,
    limit: usize,
) -> Result<Vec<ProductPerformanceRow>, BackendError> {
    client
        .rpc(PERFORMANCE_RPC, &performance_params(filters, state, offset, limit))
        .await
}

/// Итоги по товарам; процедура возвращает одну строку
pub async fn metrics(
    client: &PostgrestClient,
    filters: &ReportFilters,
) -> Result<Option<ProductsMetricsRow>, BackendError> {
    let rows: Vec<ProductsMetricsRow> = client.rpc(METRICS_RPC, &rpc_params(filters)).await?;
    Ok(rows.into_iter().next())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::dashboards::d411_products::products_view;

    #[test]
    fn test_performance_params() {
        let filters = ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
        let mut state = products_view().default_state();
        state.search = "крем*(".into();
        state.sort_by = "netProfit".into();

        let params = performance_params(&filters, &state, 40, 20);
        assert_eq!(params["search_term"], "крем");
        assert_eq!(params["sort_by"], "revenue");
        assert_eq!(params["sort_order"], "desc");
        assert_eq!(params["page_offset"], 40);
        assert_eq!(params["page_size"], 20);
        assert_eq!(params["start_date"], "2025-08-19");

        state.search = "   ".into();
        assert!(performance_params(&filters, &state, 0, 20)["search_term"].is_null());
    }
}
