use contracts::dashboards::d412_regions::{
    regions_view, sort_regions, RegionPerformance, RegionsMetrics, RegionsMetricsResponse,
    RegionsResponse,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::outcome::ReportOutcome;
use contracts::shared::table::TableParams;

use super::repository;
use crate::dashboards::{cached_report, outcome_from};
use crate::shared::data::BackendError;
use crate::system::state::AppState;

async fn fetch_regions(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<Vec<RegionPerformance>>, BackendError> {
    let rows = repository::performance(&state.client, filters).await?;
    Ok(outcome_from(&rows, |rows| {
        rows.iter().map(RegionPerformance::from).collect()
    }))
}

/// Регионы за период. Процедура отдаёт полный список, сортировка по
/// выбранной колонке выполняется здесь, поверх закэшированного результата.
pub async fn list(state: &AppState, filters: ReportFilters, params: &TableParams) -> RegionsResponse {
    let view = regions_view();
    let table = view.state_from(params);
    let regions = cached_report(state, "d412_regions", &filters, || {
        fetch_regions(state, &filters)
    })
    .await
    .map(|mut regions| {
        sort_regions(&mut regions, &table.sort_by, table.sort_order);
        regions
    });
    RegionsResponse {
        filters,
        sort_by: table.sort_by,
        sort_order: table.sort_order,
        headers: view.headers(),
        regions,
    }
}

async fn fetch_metrics(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<RegionsMetrics>, BackendError> {
    Ok(match repository::metrics(&state.client, filters).await? {
        Some(row) => ReportOutcome::data(RegionsMetrics::from(&row)),
        None => ReportOutcome::no_data(),
    })
}

pub async fn metrics(state: &AppState, filters: ReportFilters) -> RegionsMetricsResponse {
    let metrics = cached_report(state, "d412_regions_metrics", &filters, || {
        fetch_metrics(state, &filters)
    })
    .await;
    RegionsMetricsResponse { filters, metrics }
}
