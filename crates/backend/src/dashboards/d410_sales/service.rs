use contracts::dashboards::d410_sales::{
    DailySalesPoint, DailySalesResponse, SalesChanges, SalesMetrics, SalesMetricsResponse,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::outcome::ReportOutcome;

use super::{aggregator, repository};
use crate::dashboards::{cached_report, outcome_from};
use crate::domain::a010_ozon_fbs_posting::repository as postings;
use crate::shared::data::BackendError;
use crate::system::state::AppState;

async fn fetch_metrics(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<SalesMetrics>, BackendError> {
    let rows = postings::list_postings(&state.client, filters, &state.settings.zone).await?;
    Ok(outcome_from(&rows, aggregator::sales_metrics))
}

async fn period_metrics(state: &AppState, filters: &ReportFilters) -> ReportOutcome<SalesMetrics> {
    cached_report(state, "d410_sales_metrics", filters, || {
        fetch_metrics(state, filters)
    })
    .await
}

/// Метрики текущего и предыдущего периода одинаковой длины
pub async fn metrics(state: &AppState, filters: ReportFilters) -> SalesMetricsResponse {
    let previous_filters = filters.previous_period();
    let (current, previous) = tokio::join!(
        period_metrics(state, &filters),
        period_metrics(state, &previous_filters)
    );
    let changes = SalesChanges::between(current.value(), previous.value());
    SalesMetricsResponse {
        filters,
        current,
        previous,
        changes,
    }
}

async fn fetch_daily(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<Vec<DailySalesPoint>>, BackendError> {
    let rows = repository::list_daily_sales(&state.client, filters).await?;
    Ok(outcome_from(&rows, |rows| {
        rows.iter().map(DailySalesPoint::from).collect()
    }))
}

pub async fn daily(state: &AppState, filters: ReportFilters) -> DailySalesResponse {
    let points = cached_report(state, "d410_daily_sales", &filters, || {
        fetch_daily(state, &filters)
    })
    .await;
    DailySalesResponse { filters, points }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::test_support::state_for;
    use chrono::NaiveDate;
    use contracts::shared::numeric::Trend;
    use contracts::shared::outcome::EmptyReason;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn filters() -> ReportFilters {
        ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
    }

    #[tokio::test]
    async fn test_metrics_compare_with_previous_period() {
        let mut server = Server::new_async().await;
        let current = server
            .mock("GET", "/rest/v1/postings_fbs")
            .match_query(Matcher::UrlEncoded(
                "shipment_date".into(),
                "gte.2025-08-19T00:00:00+03:00".into(),
            ))
            .with_status(200)
            .with_body(
                json!([
                    {"order_id": 1, "quantity": 1, "payout": 100, "price_total": 120, "status": "delivered"},
                    {"order_id": 1, "quantity": 2, "payout": 150, "price_total": 180, "status": "delivered"},
                    {"order_id": 1, "quantity": 1, "payout": 50, "price_total": 60, "status": "delivered"}
                ])
                .to_string(),
            )
            .create_async()
            .await;
        let previous = server
            .mock("GET", "/rest/v1/postings_fbs")
            .match_query(Matcher::UrlEncoded(
                "shipment_date".into(),
                "gte.2025-08-12T00:00:00+03:00".into(),
            ))
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = metrics(&state, filters()).await;

        assert_eq!(response.current.value().total_orders, 1.0);
        assert_eq!(response.current.value().total_units, 4.0);
        assert_eq!(response.current.value().total_revenue, 300.0);
        assert_eq!(response.previous.reason(), Some(EmptyReason::NoData));
        assert_eq!(response.changes.revenue.percentage, 100.0);
        assert_eq!(response.changes.orders.trend, Trend::Up);
        current.assert_async().await;
        previous.assert_async().await;
    }

    #[tokio::test]
    async fn test_backend_failure_falls_back_to_zeroes() {
        let mut server = Server::new_async().await;
        let failing = server
            .mock("GET", Matcher::Regex("^/rest/v1/postings_fbs".into()))
            .with_status(500)
            .with_body("{\"message\":\"boom\"}")
            .expect(2)
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = metrics(&state, filters()).await;

        assert_eq!(response.current.reason(), Some(EmptyReason::Unavailable));
        assert_eq!(response.current.value(), &SalesMetrics::default());
        assert_eq!(response.changes.revenue.trend, Trend::Neutral);
        // агрегаты не повторяются: по одному запросу на период
        failing.assert_async().await;
    }

    #[tokio::test]
    async fn test_daily_points_are_cached() {
        let mut server = Server::new_async().await;
        let view = server
            .mock("GET", "/rest/v1/vw_daily_sales_by_date_type")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(
                json!([
                    {"date_msk": "2025-08-19", "delivered_orders": 2, "delivered_units": 3, "delivered_gmv": 400, "delivered_revenue": 320},
                    {"date_msk": "2025-08-20", "delivered_orders": 0, "delivered_gmv": 0}
                ])
                .to_string(),
            )
            .expect(1)
            .create_async()
            .await;

        let state = state_for(&server.url());
        let first = daily(&state, filters()).await;
        let second = daily(&state, filters()).await;

        let points = first.points.value();
        assert_eq!(points.len(), 2);
        assert_eq!(points[0].avg_order_value, 200.0);
        assert_eq!(points[1].avg_order_value, 0.0);
        assert_eq!(first.points, second.points);
        view.assert_async().await;
    }
}
