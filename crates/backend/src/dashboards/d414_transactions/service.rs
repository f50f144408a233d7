use contracts::dashboards::d414_transactions::{transactions_view, TransactionDetail};
use contracts::shared::filters::ReportFilters;
use contracts::shared::table::{TablePage, TableResponse, TableState};

use crate::domain::a014_ozon_transactions::repository;
use crate::shared::api_error::ApiError;
use crate::shared::cache::QueryCache;
use crate::shared::data::retry::run_with_retry;
use crate::shared::data::BackendError;
use crate::shared::export::to_csv;
use crate::system::state::AppState;

async fn fetch_page(
    state: &AppState,
    filters: &ReportFilters,
    table: &TableState,
) -> Result<TablePage<TransactionDetail>, BackendError> {
    let (rows, total) = run_with_retry(state.settings.retry_attempts, "d414 transactions", || {
        repository::transactions_page(&state.client, filters, &state.settings.zone, table)
    })
    .await?;
    let items = rows.iter().map(TransactionDetail::from).collect();
    Ok(TablePage::new(items, total, table))
}

/// Страница журнала операций с категориями.
/// Ошибка хранилища возвращается клиенту, чтобы он мог повторить запрос.
pub async fn page(
    state: &AppState,
    filters: &ReportFilters,
    table: TableState,
) -> Result<TableResponse<TransactionDetail>, ApiError> {
    let key = QueryCache::key(
        "d414_transactions_page",
        &format!("{}&{}", filters.to_query(), table.cache_key()),
    );
    let page = state
        .cache
        .get_or_fetch(&key, || fetch_page(state, filters, &table))
        .await?;
    tracing::info!(
        "d414: {} of {} transactions ({})",
        page.items.len(),
        page.total_count,
        filters.display_range()
    );
    Ok(TableResponse::new(&transactions_view(), table, page))
}

/// CSV по текущему поиску и сортировке, все страницы
pub async fn export(
    state: &AppState,
    filters: &ReportFilters,
    table: &TableState,
) -> Result<String, ApiError> {
    let rows = run_with_retry(state.settings.retry_attempts, "d414 export", || {
        repository::list_transactions_sorted(&state.client, filters, &state.settings.zone, table)
    })
    .await?;
    let details: Vec<TransactionDetail> = rows.iter().map(TransactionDetail::from).collect();
    tracing::info!("d414: exporting {} transactions", details.len());
    Ok(to_csv(&transactions_view(), &details)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::test_support::state_for;
    use chrono::NaiveDate;
    use contracts::domain::a014_ozon_transactions::aggregate::TransactionCategory;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn filters() -> ReportFilters {
        ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
    }

    #[tokio::test]
    async fn test_page_with_exact_count() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/finance_transactions")
            .match_query(Matcher::AllOf(vec![
                Matcher::UrlEncoded("offset".into(), "0".into()),
                Matcher::UrlEncoded("limit".into(), "25".into()),
            ]))
            .match_header("Prefer", "count=exact")
            .with_status(206)
            .with_header("Content-Range", "0-1/57")
            .with_body(
                json!([
                    {"id": 1, "operation_date": "2025-08-20T10:00:00+03:00",
                     "operation_type": "OperationAgentDeliveredToCustomer", "amount": 780},
                    {"id": 2, "operation_date": "2025-08-20T11:00:00+03:00",
                     "operation_type": "OperationItemReturn", "amount": -100}
                ])
                .to_string(),
            )
            .create_async()
            .await;

        let state = state_for(&server.url());
        let response = page(&state, &filters(), transactions_view().default_state())
            .await
            .unwrap();

        assert_eq!(response.page.total_count, 57);
        assert_eq!(response.page.total_pages, 3);
        assert_eq!(response.visible_to, 25);
        assert_eq!(
            response.page.items[0].category,
            TransactionCategory::SalesDeliveryCommission
        );
        assert_eq!(response.page.items[1].category_label, "возвраты");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_client_error_is_not_retried() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex("^/rest/v1/finance_transactions".into()))
            .with_status(400)
            .with_body("{\"message\":\"column does not exist\"}")
            .expect(1)
            .create_async()
            .await;

        let state = state_for(&server.url());
        let error = page(&state, &filters(), transactions_view().default_state())
            .await
            .unwrap_err();
        assert!(!error.is_retryable());
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_server_error_is_retried_and_reported() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", Matcher::Regex("^/rest/v1/finance_transactions".into()))
            .with_status(503)
            .expect(2)
            .create_async()
            .await;

        let state = state_for(&server.url());
        let error = page(&state, &filters(), transactions_view().default_state())
            .await
            .unwrap_err();
        assert!(error.is_retryable());
        assert_eq!(error.status_code(), axum::http::StatusCode::BAD_GATEWAY);
        mock.assert_async().await;
    }
}
