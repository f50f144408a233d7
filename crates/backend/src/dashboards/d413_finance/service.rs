use contracts::dashboards::d413_finance::{
    CostAnalysis, CostAnalysisResponse, FinanceBreakdownDay, FinanceBreakdownResponse,
    FinanceReport, FinanceReportResponse, LedgerCostAnalysis, LedgerCostAnalysisResponse,
    OperationStat, OperationStatsResponse,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::outcome::ReportOutcome;

use super::aggregator;
use crate::dashboards::{cached_report, outcome_from};
use crate::domain::a010_ozon_fbs_posting::repository as postings;
use crate::domain::a014_ozon_transactions::repository as transactions;
use crate::domain::a025_product_cost::service::load_cost_index;
use crate::shared::data::BackendError;
use crate::system::state::AppState;

/// Префикс ключей кэша финансовых отчётов (сбрасывается при изменении себестоимости)
pub const CACHE_PREFIX: &str = "d413_";

async fn fetch_report(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<FinanceReport>, BackendError> {
    let rows = transactions::list_transactions(&state.client, filters, &state.settings.zone).await?;
    let tax_rate = state.settings.tax_rate;
    Ok(outcome_from(&rows, |rows| aggregator::finance_report(rows, tax_rate)))
}

/// Сводка и круговая диаграмма по статьям
pub async fn report(state: &AppState, filters: ReportFilters) -> FinanceReportResponse {
    let report = cached_report(state, "d413_finance_report", &filters, || {
        fetch_report(state, &filters)
    })
    .await;
    tracing::info!(
        "d413: {} operations, net profit {:.2}",
        report.value().summary.operations,
        report.value().summary.net_profit
    );
    FinanceReportResponse { filters, report }
}

async fn fetch_breakdown(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<Vec<FinanceBreakdownDay>>, BackendError> {
    let zone = state.settings.zone;
    let rows = transactions::list_transactions(&state.client, filters, &zone).await?;
    let tax_rate = state.settings.tax_rate;
    Ok(outcome_from(&rows, |rows| {
        aggregator::daily_breakdown(rows, &filters.range(), &zone, tax_rate)
    }))
}

pub async fn breakdown(state: &AppState, filters: ReportFilters) -> FinanceBreakdownResponse {
    let days = cached_report(state, "d413_finance_breakdown", &filters, || {
        fetch_breakdown(state, &filters)
    })
    .await;
    FinanceBreakdownResponse { filters, days }
}

async fn fetch_cost_analysis(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<CostAnalysis>, BackendError> {
    let (rows, costs) = tokio::try_join!(
        postings::list_sold_items(&state.client, filters, &state.settings.zone),
        load_cost_index(state)
    )?;
    let tax_rate = state.settings.tax_rate;
    Ok(outcome_from(&rows, |rows| {
        aggregator::cost_analysis(rows, &costs, tax_rate)
    }))
}

/// Прибыль за вычетом себестоимости по отправлениям
pub async fn cost_analysis(state: &AppState, filters: ReportFilters) -> CostAnalysisResponse {
    let analysis = cached_report(state, "d413_cost_analysis", &filters, || {
        fetch_cost_analysis(state, &filters)
    })
    .await;
    if analysis.value().items_without_cost > 0 {
        tracing::warn!(
            "d413: {} sold items without cost price, counted as zero",
            analysis.value().items_without_cost
        );
    }
    CostAnalysisResponse { filters, analysis }
}

async fn fetch_ledger_cost_analysis(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<LedgerCostAnalysis>, BackendError> {
    let (items, costs) = tokio::try_join!(
        transactions::list_delivered_items(&state.client, filters, &state.settings.zone),
        load_cost_index(state)
    )?;
    let tax_rate = state.settings.tax_rate;
    Ok(outcome_from(&items, |items| {
        aggregator::ledger_cost_analysis(items, &costs, tax_rate)
    }))
}

/// Прибыль за вычетом себестоимости по журналу операций
pub async fn ledger_cost_analysis(
    state: &AppState,
    filters: ReportFilters,
) -> LedgerCostAnalysisResponse {
    let analysis = cached_report(state, "d413_ledger_cost_analysis", &filters, || {
        fetch_ledger_cost_analysis(state, &filters)
    })
    .await;
    LedgerCostAnalysisResponse { filters, analysis }
}

async fn fetch_operations(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<Vec<OperationStat>>, BackendError> {
    let rows = transactions::list_transactions(&state.client, filters, &state.settings.zone).await?;
    Ok(outcome_from(&rows, aggregator::operation_stats))
}

/// Диагностика категоризации: какие типы операций пришли за период
pub async fn operations(state: &AppState, filters: ReportFilters) -> OperationStatsResponse {
    let operations = cached_report(state, "d413_operations", &filters, || {
        fetch_operations(state, &filters)
    })
    .await;
    OperationStatsResponse {
        filters,
        operations,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::test_support::state_for;
    use chrono::NaiveDate;
    use contracts::shared::outcome::EmptyReason;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn filters() -> ReportFilters {
        ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
    }

    #[tokio::test]
    async fn test_report_failure_gives_zero_summary() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/rest/v1/finance_transactions".into()))
            .with_status(500)
            .with_body("oops")
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = report(&state, filters()).await;
        assert_eq!(response.report.reason(), Some(EmptyReason::Unavailable));
        assert_eq!(response.report.value(), &FinanceReport::default());
        assert!(response.report.value().categories.is_empty());
    }

    #[tokio::test]
    async fn test_report_from_ledger() {
        let mut server = Server::new_async().await;
        let ledger = server
            .mock("GET", Matcher::Regex("^/rest/v1/finance_transactions".into()))
            .match_query(Matcher::UrlEncoded(
                "operation_date".into(),
                "lt.2025-08-26T00:00:00+03:00".into(),
            ))
            .with_status(200)
            .with_body(
                json!([
                    {"id": 1, "operation_type": "OperationAgentDeliveredToCustomer",
                     "accruals_for_sale": "1000", "sale_commission": "-150", "amount": "780"},
                    {"id": 2, "operation_type": "OperationElectronicServiceStencil", "amount": -30}
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = report(&state, filters()).await;
        let summary = &response.report.value().summary;
        assert_eq!(summary.sales, 1000.0);
        assert_eq!(summary.ads, 30.0);
        assert_eq!(summary.net_profit, 750.0);
        assert_eq!(response.report.value().categories.len(), 4);

        // повторный запрос с теми же фильтрами обслуживается из кэша
        report(&state, filters()).await;
        ledger.assert_async().await;
    }

    #[tokio::test]
    async fn test_cost_analysis_joins_sold_items_with_costs() {
        let mut server = Server::new_async().await;
        server
            .mock("GET", Matcher::Regex("^/rest/v1/postings_fbs".into()))
            .with_status(200)
            .with_body(
                json!([
                    {"sku": 1, "offer_id": "A", "quantity": 2, "payout": 500, "status": "delivered"},
                    {"sku": 2, "offer_id": "B", "quantity": 1, "payout": 300, "status": "cancelled"},
                    {"sku": 3, "offer_id": "C", "quantity": 1, "payout": 100, "status": "in_delivery"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex("^/rest/v1/product_costs".into()))
            .with_status(200)
            .with_body(json!([{"sku": 1, "offer_id": "A", "cost_price": "120.50"}]).to_string())
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = cost_analysis(&state, filters()).await;
        let analysis = response.analysis.value();
        assert_eq!(analysis.total_revenue, 600.0);
        assert_eq!(analysis.total_cost_price, 241.0);
        assert_eq!(analysis.items_without_cost, 1);
        assert_eq!(analysis.net_profit_after_costs, 359.0);
    }
}
