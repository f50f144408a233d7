pub mod d410_sales;
pub mod d411_products;
pub mod d412_regions;
pub mod d413_finance;
pub mod d414_transactions;

use std::future::Future;

use contracts::shared::filters::ReportFilters;
use contracts::shared::outcome::{EmptyReason, ReportOutcome};
use contracts::shared::time::format_date;
use serde_json::{json, Value};

use crate::shared::cache::QueryCache;
use crate::shared::data::BackendError;
use crate::system::state::AppState;

/// Агрегирующий отчёт через кэш.
///
/// Сбой хранилища не поднимается выше: логируется и превращается в
/// нулевой результат с причиной `unavailable`. В кэш ошибка не попадает.
pub async fn cached_report<T, F, Fut>(
    state: &AppState,
    name: &str,
    filters: &ReportFilters,
    fetch: F,
) -> ReportOutcome<T>
where
    T: Clone + Default + Send + Sync + 'static,
    F: FnOnce() -> Fut,
    Fut: Future<Output = Result<ReportOutcome<T>, BackendError>>,
{
    let key = QueryCache::key(name, &filters.to_query());
    match state.cache.get_or_fetch(&key, fetch).await {
        Ok(outcome) => {
            if outcome.reason() == Some(EmptyReason::NoData) {
                tracing::warn!("{}: no data for {}", name, filters.display_range());
            }
            outcome
        }
        Err(e) => {
            tracing::error!("{}: failed for {}: {}", name, filters.to_query(), e);
            ReportOutcome::unavailable()
        }
    }
}

/// Пустая выборка даёт `no_data`, иначе значение агрегата
pub fn outcome_from<R, T, F>(rows: &[R], aggregate: F) -> ReportOutcome<T>
where
    T: Default,
    F: FnOnce(&[R]) -> T,
{
    if rows.is_empty() {
        ReportOutcome::no_data()
    } else {
        ReportOutcome::data(aggregate(rows))
    }
}

/// Параметры серверных процедур отчётов
pub fn rpc_params(filters: &ReportFilters) -> Value {
    json!({
        "start_date": format_date(filters.date_from),
        "end_date": format_date(filters.date_to),
        "date_type": filters.date_type.as_str(),
        "sku_filter": filters.sku_id(),
        "region_filter": filters.region_filter(),
    })
}
