use contracts::dashboards::d414_transactions::SEARCH_COLUMNS;
use contracts::domain::a014_ozon_transactions::aggregate::{
    TransactionItemRow, TransactionRow, DELIVERED_TO_CUSTOMER, ITEMS_TABLE,
    ITEMS_WITH_TRANSACTION_SELECT, TABLE,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::table::{SortOrder, TableState};
use contracts::shared::time::CivilZone;

use crate::shared::data::{BackendError, PostgrestClient, TableQuery};

pub const TRANSACTION_COLUMNS: &str = "id,transaction_id,operation_id,operation_date,operation_type,operation_type_name,posting_number,accruals_for_sale,sale_commission,amount,delivery_charge,return_delivery_charge";

/// Операции за период по `operation_date`.
/// Журнал не содержит SKU и склада, поэтому фильтруется только по датам.
fn window_query(filters: &ReportFilters, zone: &CivilZone, date_column: &str) -> TableQuery {
    let (start, end) = filters.range().instants(zone);
    TableQuery::new()
        .gte(date_column, start.to_rfc3339())
        .lt(date_column, end.to_rfc3339())
}

pub async fn list_transactions(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
) -> Result<Vec<TransactionRow>, BackendError> {
    let query = window_query(filters, zone, "operation_date")
        .select(TRANSACTION_COLUMNS)
        .order("operation_date", SortOrder::Asc)
        .order("id", SortOrder::Asc);
    client.select_all(TABLE, &query).await
}

/// Запрос страницы журнала: поиск, сортировка, диапазон строк
pub fn page_query(filters: &ReportFilters, zone: &CivilZone, state: &TableState) -> TableQuery {
    let (from, to) = state.range();
    window_query(filters, zone, "operation_date")
        .select(TRANSACTION_COLUMNS)
        .or_ilike(&SEARCH_COLUMNS, &state.search)
        .order(&state.sort_by, state.sort_order)
        .order("id", state.sort_order)
        .range(from, to)
}

/// Страница журнала и общее количество строк по фильтрам
pub async fn transactions_page(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
    state: &TableState,
) -> Result<(Vec<TransactionRow>, usize), BackendError> {
    client
        .select_with_count(TABLE, &page_query(filters, zone, state))
        .await
}

/// Все строки журнала с поиском и сортировкой (для выгрузки)
pub async fn list_transactions_sorted(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
    state: &TableState,
) -> Result<Vec<TransactionRow>, BackendError> {
    let query = window_query(filters, zone, "operation_date")
        .select(TRANSACTION_COLUMNS)
        .or_ilike(&SEARCH_COLUMNS, &state.search)
        .order(&state.sort_by, state.sort_order)
        .order("id", state.sort_order);
    client.select_all(TABLE, &query).await
}

/// Позиции операций доставки покупателю вместе с самой операцией
pub async fn list_delivered_items(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
) -> Result<Vec<TransactionItemRow>, BackendError> {
    let query = window_query(filters, zone, "finance_transactions.operation_date")
        .select(ITEMS_WITH_TRANSACTION_SELECT)
        .eq("finance_transactions.operation_type", DELIVERED_TO_CUSTOMER)
        .order("id", SortOrder::Asc);
    client.select_all(ITEMS_TABLE, &query).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::dashboards::d414_transactions::transactions_view;

    #[test]
    fn test_page_query_has_search_sort_and_range() {
        let filters = ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
        let mut state = transactions_view().default_state();
        state.page = 1;
        state.search = "0123-45".into();

        let pairs = page_query(&filters, &CivilZone::moscow(), &state).to_pairs();
        assert!(pairs.contains(&(
            "or".to_string(),
            "(posting_number.ilike.*0123-45*,operation_type.ilike.*0123-45*,operation_type_name.ilike.*0123-45*)"
                .to_string()
        )));
        assert!(pairs.contains(&("order".to_string(), "operation_date.desc,id.desc".to_string())));
        assert!(pairs.contains(&("offset".to_string(), "25".to_string())));
        assert!(pairs.contains(&("limit".to_string(), "25".to_string())));
    }

    #[tokio::test]
    async fn test_delivered_items_are_read_in_stable_order() {
        let mut server = mockito::Server::new_async().await;
        let mock = server
            .mock("GET", "/rest/v1/finance_transaction_items")
            .match_query(mockito::Matcher::AllOf(vec![
                mockito::Matcher::UrlEncoded("order".into(), "id.asc".into()),
                mockito::Matcher::UrlEncoded(
                    "finance_transactions.operation_type".into(),
                    format!("eq.{}", DELIVERED_TO_CUSTOMER),
                ),
            ]))
            .with_status(200)
            .with_body("[]")
            .expect(1)
            .create_async()
            .await;

        let config = crate::shared::config::BackendConfig {
            url: server.url(),
            api_key: "test-key".into(),
            ..Default::default()
        };
        let client = PostgrestClient::new(&config).unwrap();
        let filters = ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
        let items = list_delivered_items(&client, &filters, &CivilZone::moscow())
            .await
            .unwrap();
        assert!(items.is_empty());
        mock.assert_async().await;
    }
}
