use serde::{Deserialize, Serialize};

use crate::shared::filters::ReportFilters;
use crate::shared::format::{format_currency, format_number, MISSING};
use crate::shared::numeric::{de_opt_i64, Numeric};
use crate::shared::outcome::ReportOutcome;
use crate::shared::table::{Column, SortOrder, TableView};

pub const PERFORMANCE_RPC: &str = "get_products_performance";
pub const METRICS_RPC: &str = "get_products_metrics";

/// Строка результата `get_products_performance`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformanceRow {
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub sku: Option<i64>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub delivered_orders: Numeric,
    #[serde(default)]
    pub delivered_units: Numeric,
    #[serde(default)]
    pub delivered_gmv: Numeric,
    #[serde(default)]
    pub delivered_revenue: Numeric,
    #[serde(default)]
    pub delivered_commissions: Numeric,
    #[serde(default)]
    pub avg_price: Numeric,
}

/// Показатели товара за период (только доставленные заказы)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProductPerformance {
    pub sku: i64,
    pub offer_id: String,
    pub product_name: String,
    pub orders: f64,
    pub units: f64,
    pub gmv: f64,
    pub revenue: f64,
    pub commissions: f64,
    /// Пока не рассчитывается
    pub net_profit: Option<f64>,
    pub avg_price: f64,
}

impl From<&ProductPerformanceRow> for ProductPerformance {
    fn from(row: &ProductPerformanceRow) -> Self {
        Self {
            sku: row.sku.unwrap_or(0),
            offer_id: row.offer_id.clone().unwrap_or_default(),
            product_name: row.product_name.clone().unwrap_or_default(),
            orders: row.delivered_orders.value(),
            units: row.delivered_units.value(),
            gmv: row.delivered_gmv.value(),
            revenue: row.delivered_revenue.value(),
            // хранилище отдаёт комиссию со знаком минус
            commissions: row.delivered_commissions.value().abs(),
            net_profit: None,
            avg_price: row.avg_price.value(),
        }
    }
}

/// Строка результата `get_products_metrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductsMetricsRow {
    #[serde(default)]
    pub total_products: Numeric,
    #[serde(default)]
    pub total_revenue: Numeric,
    #[serde(default)]
    pub total_units: Numeric,
    #[serde(default)]
    pub total_orders: Numeric,
    #[serde(default)]
    pub avg_revenue_per_product: Numeric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProductsMetrics {
    pub total_products: f64,
    pub total_revenue: f64,
    pub total_units: f64,
    pub total_orders: f64,
    pub avg_revenue_per_product: f64,
}

impl From<&ProductsMetricsRow> for ProductsMetrics {
    fn from(row: &ProductsMetricsRow) -> Self {
        Self {
            total_products: row.total_products.value(),
            total_revenue: row.total_revenue.value(),
            total_units: row.total_units.value(),
            total_orders: row.total_orders.value(),
            avg_revenue_per_product: row.avg_revenue_per_product.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProductsMetricsResponse {
    pub filters: ReportFilters,
    pub metrics: ReportOutcome<ProductsMetrics>,
}

/// Колонки таблицы товаров
pub fn products_view() -> TableView<ProductPerformance> {
    TableView {
        columns: vec![
            Column {
                key: "sku",
                label: "SKU",
                sortable: true,
                render: |p: &ProductPerformance| p.sku.to_string(),
            },
            Column {
                key: "offer_id",
                label: "Offer ID",
                sortable: false,
                render: |p: &ProductPerformance| p.offer_id.clone(),
            },
            Column {
                key: "product_name",
                label: "Название товара",
                sortable: false,
                render: |p: &ProductPerformance| p.product_name.clone(),
            },
            Column {
                key: "units",
                label: "Единицы",
                sortable: true,
                render: |p: &ProductPerformance| format_number(p.units),
            },
            Column {
                key: "gmv",
                label: "GMV",
                sortable: true,
                render: |p: &ProductPerformance| format_currency(p.gmv),
            },
            Column {
                key: "revenue",
                label: "Выручка",
                sortable: true,
                render: |p: &ProductPerformance| format_currency(p.revenue),
            },
            Column {
                key: "netProfit",
                label: "Чистая прибыль",
                sortable: false,
                render: |p: &ProductPerformance| {
                    p.net_profit
                        .map(format_currency)
                        .unwrap_or_else(|| MISSING.to_string())
                },
            },
        ],
        default_sort: "revenue",
        default_order: SortOrder::Desc,
        default_page_size: 20,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::table::TableParams;
    use serde_json::json;

    #[test]
    fn test_row_transform_takes_absolute_commission() {
        let row: ProductPerformanceRow = serde_json::from_value(json!({
            "sku": 42,
            "offer_id": "ART-42",
            "product_name": "Сыворотка",
            "delivered_orders": 3,
            "delivered_units": "5",
            "delivered_gmv": 1500,
            "delivered_revenue": 1200,
            "delivered_commissions": -300,
            "avg_price": 300
        }))
        .unwrap();
        let product = ProductPerformance::from(&row);
        assert_eq!(product.commissions, 300.0);
        assert_eq!(product.units, 5.0);
        assert_eq!(product.net_profit, None);
    }

    #[test]
    fn test_net_profit_column_is_not_sortable() {
        let view = products_view();
        assert!(!view.is_sortable("netProfit"));
        let state = view.state_from(&TableParams {
            sort_by: Some("netProfit".into()),
            ..Default::default()
        });
        assert_eq!(state.sort_by, "revenue");
        assert_eq!(state.page_size, 20);
    }
}
