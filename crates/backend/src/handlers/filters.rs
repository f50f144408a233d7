use axum::extract::{RawQuery, State};
use axum::Json;
use contracts::shared::filters::{FilterParams, FilterPatch, FiltersView, ReportFilters};

use super::report_filters;
use crate::system::state::AppState;

/// GET /api/filters?from=..&to=..&sku=..&region=..&dateType=..
///
/// Без `from` и `to` возвращается окно по умолчанию с флагом
/// `needs_initialization`: клиент записывает его в URL.
pub async fn current(State(state): State<AppState>, RawQuery(query): RawQuery) -> Json<FiltersView> {
    let needs_initialization = FilterParams::from_query(query.as_deref().unwrap_or_default())
        .map(|p| p.needs_initialization())
        .unwrap_or(true);
    let filters = report_filters(&state, query.as_deref());
    Json(FiltersView::new(filters, needs_initialization))
}

/// POST /api/filters/update?<текущие фильтры>
/// Тело: частичное обновление, остальные поля не меняются
pub async fn update(
    State(state): State<AppState>,
    RawQuery(query): RawQuery,
    Json(patch): Json<FilterPatch>,
) -> Json<FiltersView> {
    let filters = report_filters(&state, query.as_deref()).apply(&patch);
    tracing::debug!("filters updated: {}", filters.to_query());
    Json(FiltersView::new(filters, false))
}

/// POST /api/filters/reset
pub async fn reset(State(state): State<AppState>) -> Json<FiltersView> {
    let filters = ReportFilters::reset(state.settings.anchor_date());
    Json(FiltersView::new(filters, false))
}
