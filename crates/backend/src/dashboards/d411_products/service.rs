use contracts::dashboards::d411_products::{
    products_view, ProductPerformance, ProductsMetrics, ProductsMetricsResponse,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::outcome::ReportOutcome;
use contracts::shared::table::{TablePage, TableResponse, TableState};

use super::repository;
use crate::dashboards::cached_report;
use crate::domain::a025_product_cost::service::{load_cost_index, CostIndex};
use crate::shared::api_error::ApiError;
use crate::shared::cache::QueryCache;
use crate::shared::data::retry::run_with_retry;
use crate::shared::data::BackendError;
use crate::shared::export::to_csv;
use crate::system::state::AppState;

pub const CACHE_PREFIX: &str = "d411_";

/// Верхняя граница строк в выгрузке
const EXPORT_LIMIT: usize = 10_000;

/// Прибыль товара: выручка минус себестоимость проданных единиц.
/// Без введённой себестоимости прибыль неизвестна.
fn attach_net_profit(products: &mut [ProductPerformance], costs: &CostIndex) {
    for product in products {
        product.net_profit = costs
            .cost_for(product.sku, &product.offer_id)
            .map(|cost| product.revenue - cost * product.units);
    }
}

/// Себестоимость не обязательна для таблицы: при сбое колонка остаётся пустой
async fn with_net_profit(
    state: &AppState,
    mut products: Vec<ProductPerformance>,
) -> Vec<ProductPerformance> {
    match load_cost_index(state).await {
        Ok(costs) => attach_net_profit(&mut products, &costs),
        Err(e) => tracing::warn!("d411: cost prices unavailable: {}", e),
    }
    products
}

async fn fetch_page(
    state: &AppState,
    filters: &ReportFilters,
    table: &TableState,
) -> Result<TablePage<ProductPerformance>, BackendError> {
    let (offset, _) = table.range();
    let attempts = state.settings.retry_attempts;
    let (rows, totals) = tokio::try_join!(
        run_with_retry(attempts, "d411 products page", || {
            repository::performance(&state.client, filters, table, offset, table.page_size)
        }),
        run_with_retry(attempts, "d411 products total", || {
            repository::metrics(&state.client, filters)
        })
    )?;
    let items: Vec<ProductPerformance> = rows.iter().map(ProductPerformance::from).collect();
    let total = totals
        .map(|t| t.total_products.value().max(0.0) as usize)
        .unwrap_or(offset + items.len());
    Ok(TablePage::new(items, total, table))
}

/// Страница таблицы товаров: сортировка, поиск и пагинация на стороне процедуры
pub async fn page(
    state: &AppState,
    filters: &ReportFilters,
    table: TableState,
) -> Result<TableResponse<ProductPerformance>, ApiError> {
    let key = QueryCache::key(
        "d411_products_page",
        &format!("{}&{}", filters.to_query(), table.cache_key()),
    );
    let mut page = state
        .cache
        .get_or_fetch(&key, || fetch_page(state, filters, &table))
        .await?;
    page.items = with_net_profit(state, page.items).await;
    tracing::info!(
        "d411: page {} of {} ({} products total)",
        page.page + 1,
        page.total_pages.max(1),
        page.total_count
    );
    Ok(TableResponse::new(&products_view(), table, page))
}

async fn fetch_metrics(
    state: &AppState,
    filters: &ReportFilters,
) -> Result<ReportOutcome<ProductsMetrics>, BackendError> {
    Ok(match repository::metrics(&state.client, filters).await? {
        Some(row) => ReportOutcome::data(ProductsMetrics::from(&row)),
        None => ReportOutcome::no_data(),
    })
}

pub async fn metrics(state: &AppState, filters: ReportFilters) -> ProductsMetricsResponse {
    let metrics = cached_report(state, "d411_products_metrics", &filters, || {
        fetch_metrics(state, &filters)
    })
    .await;
    ProductsMetricsResponse { filters, metrics }
}

/// CSV по текущему поиску и сортировке, без пагинации
pub async fn export(
    state: &AppState,
    filters: &ReportFilters,
    table: &TableState,
) -> Result<String, ApiError> {
    let rows = run_with_retry(state.settings.retry_attempts, "d411 products export", || {
        repository::performance(&state.client, filters, table, 0, EXPORT_LIMIT)
    })
    .await?;
    let products = with_net_profit(state, rows.iter().map(ProductPerformance::from).collect()).await;
    tracing::info!("d411: exporting {} products", products.len());
    Ok(to_csv(&products_view(), &products)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboards::test_support::state_for;
    use chrono::NaiveDate;
    use contracts::domain::a025_product_cost::aggregate::ProductCostRow;
    use mockito::{Matcher, Server};
    use serde_json::json;

    fn filters() -> ReportFilters {
        ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap())
    }

    fn product(sku: i64, offer_id: &str, revenue: f64, units: f64) -> ProductPerformance {
        ProductPerformance {
            sku,
            offer_id: offer_id.into(),
            product_name: String::new(),
            orders: 1.0,
            units,
            gmv: revenue,
            revenue,
            commissions: 0.0,
            net_profit: None,
            avg_price: 0.0,
        }
    }

    #[test]
    fn test_net_profit_only_with_known_cost() {
        let rows: Vec<ProductCostRow> = serde_json::from_value(json!([
            {"sku": 1, "offer_id": "A", "cost_price": 30}
        ]))
        .unwrap();
        let mut products = vec![product(1, "A", 500.0, 4.0), product(2, "B", 100.0, 1.0)];
        attach_net_profit(&mut products, &CostIndex::from_rows(&rows));
        assert_eq!(products[0].net_profit, Some(380.0));
        assert_eq!(products[1].net_profit, None);
    }

    #[tokio::test]
    async fn test_page_uses_metrics_total() {
        let mut server = Server::new_async().await;
        let performance = server
            .mock("POST", "/rest/v1/rpc/get_products_performance")
            .match_body(Matcher::PartialJson(json!({"page_offset": 20, "page_size": 20})))
            .with_status(200)
            .with_body(
                json!([{"sku": 7, "offer_id": "X", "product_name": "Маска", "delivered_units": 2, "delivered_revenue": 900}])
                    .to_string(),
            )
            .create_async()
            .await;
        server
            .mock("POST", "/rest/v1/rpc/get_products_metrics")
            .with_status(200)
            .with_body(json!({"total_products": 41}).to_string())
            .create_async()
            .await;
        server
            .mock("GET", Matcher::Regex("^/rest/v1/product_costs".into()))
            .with_status(200)
            .with_body(json!([{"sku": 7, "offer_id": "X", "cost_price": 100}]).to_string())
            .create_async()
            .await;

        let state = state_for(&server.url());
        let mut table = products_view().default_state();
        table.page = 1;
        let response = page(&state, &filters(), table).await.unwrap();

        assert_eq!(response.page.total_count, 41);
        assert_eq!(response.page.total_pages, 3);
        assert_eq!(response.visible_from, 21);
        assert_eq!(response.visible_to, 40);
        assert_eq!(response.page.items[0].net_profit, Some(700.0));
        performance.assert_async().await;
    }
}
