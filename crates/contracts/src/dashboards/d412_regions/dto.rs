use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

use crate::shared::filters::ReportFilters;
use crate::shared::format::{format_currency, format_number};
use crate::shared::numeric::{ratio_or_zero, Numeric};
use crate::shared::outcome::ReportOutcome;
use crate::shared::table::{Column, ColumnHeader, SortOrder, TableView};

pub const PERFORMANCE_RPC: &str = "get_regions_performance";
pub const METRICS_RPC: &str = "get_regions_metrics";

/// Подпись для строк без региона
pub const UNKNOWN_REGION: &str = "Не указан";

/// Строка результата `get_regions_performance`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionRow {
    #[serde(default)]
    pub region: Option<String>,
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
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionPerformance {
    pub region: String,
    pub orders: f64,
    pub units: f64,
    pub gmv: f64,
    pub revenue: f64,
    pub commissions: f64,
    pub net_profit: Option<f64>,
    pub avg_order_value: f64,
}

impl From<&RegionRow> for RegionPerformance {
    fn from(row: &RegionRow) -> Self {
        let orders = row.delivered_orders.value();
        let gmv = row.delivered_gmv.value();
        Self {
            region: row
                .region
                .clone()
                .filter(|r| !r.trim().is_empty())
                .unwrap_or_else(|| UNKNOWN_REGION.to_string()),
            orders,
            units: row.delivered_units.value(),
            gmv,
            revenue: row.delivered_revenue.value(),
            commissions: row.delivered_commissions.value().abs(),
            net_profit: None,
            avg_order_value: ratio_or_zero(gmv, orders),
        }
    }
}

impl RegionPerformance {
    fn compare_by(&self, other: &Self, key: &str) -> Ordering {
        let numeric = |r: &Self| match key {
            "orders" => Some(r.orders),
            "units" => Some(r.units),
            "gmv" => Some(r.gmv),
            "revenue" => Some(r.revenue),
            "commissions" => Some(r.commissions),
            "avg_order_value" => Some(r.avg_order_value),
            _ => None,
        };
        match (numeric(self), numeric(other)) {
            (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
            _ => self.region.cmp(&other.region),
        }
    }
}

/// Сортировка регионов по колонке. Сортировка устойчивая.
pub fn sort_regions(regions: &mut [RegionPerformance], key: &str, order: SortOrder) {
    regions.sort_by(|a, b| {
        let ord = a.compare_by(b, key);
        if order.is_ascending() {
            ord
        } else {
            ord.reverse()
        }
    });
}

/// Строка результата `get_regions_metrics`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionsMetricsRow {
    #[serde(default)]
    pub total_regions: Numeric,
    #[serde(default)]
    pub total_revenue: Numeric,
    #[serde(default)]
    pub total_units: Numeric,
    #[serde(default)]
    pub total_orders: Numeric,
    #[serde(default)]
    pub total_gmv: Numeric,
    #[serde(default)]
    pub avg_revenue_per_region: Numeric,
    #[serde(default)]
    pub top_region: Option<String>,
    #[serde(default)]
    pub top_region_revenue: Numeric,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegionsMetrics {
    pub total_regions: f64,
    pub total_revenue: f64,
    pub total_units: f64,
    pub total_orders: f64,
    pub total_gmv: f64,
    pub avg_revenue_per_region: f64,
    pub top_region: Option<String>,
    pub top_region_revenue: f64,
}

impl From<&RegionsMetricsRow> for RegionsMetrics {
    fn from(row: &RegionsMetricsRow) -> Self {
        Self {
            total_regions: row.total_regions.value(),
            total_revenue: row.total_revenue.value(),
            total_units: row.total_units.value(),
            total_orders: row.total_orders.value(),
            total_gmv: row.total_gmv.value(),
            avg_revenue_per_region: row.avg_revenue_per_region.value(),
            top_region: row.top_region.clone(),
            top_region_revenue: row.top_region_revenue.value(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsResponse {
    pub filters: ReportFilters,
    pub sort_by: String,
    pub sort_order: SortOrder,
    pub headers: Vec<ColumnHeader>,
    pub regions: ReportOutcome<Vec<RegionPerformance>>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RegionsMetricsResponse {
    pub filters: ReportFilters,
    pub metrics: ReportOutcome<RegionsMetrics>,
}

pub fn regions_view() -> TableView<RegionPerformance> {
    TableView {
        columns: vec![
            Column {
                key: "region",
                label: "Регион",
                sortable: true,
                render: |r: &RegionPerformance| r.region.clone(),
            },
            Column {
                key: "orders",
                label: "Заказы",
                sortable: true,
                render: |r: &RegionPerformance| format_number(r.orders),
            },
            Column {
                key: "units",
                label: "Единицы",
                sortable: true,
                render: |r: &RegionPerformance| format_number(r.units),
            },
            Column {
                key: "gmv",
                label: "GMV",
                sortable: true,
                render: |r: &RegionPerformance| format_currency(r.gmv),
            },
            Column {
                key: "revenue",
                label: "Выручка",
                sortable: true,
                render: |r: &RegionPerformance| format_currency(r.revenue),
            },
            Column {
                key: "avg_order_value",
                label: "Средний чек",
                sortable: true,
                render: |r: &RegionPerformance| format_currency(r.avg_order_value),
            },
        ],
        default_sort: "revenue",
        default_order: SortOrder::Desc,
        default_page_size: 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn region(name: &str, revenue: f64) -> RegionPerformance {
        RegionPerformance {
            region: name.into(),
            orders: 1.0,
            units: 1.0,
            gmv: revenue,
            revenue,
            commissions: 0.0,
            net_profit: None,
            avg_order_value: revenue,
        }
    }

    #[test]
    fn test_missing_region_gets_placeholder() {
        let row: RegionRow = serde_json::from_value(json!({
            "region": null,
            "delivered_orders": 0,
            "delivered_gmv": 100
        }))
        .unwrap();
        let perf = RegionPerformance::from(&row);
        assert_eq!(perf.region, UNKNOWN_REGION);
        assert_eq!(perf.avg_order_value, 0.0);
    }

    #[test]
    fn test_sort_regions() {
        let mut regions = vec![region("Москва", 100.0), region("Казань", 300.0), region("Омск", 200.0)];
        sort_regions(&mut regions, "revenue", SortOrder::Desc);
        let names: Vec<_> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, ["Казань", "Омск", "Москва"]);

        sort_regions(&mut regions, "region", SortOrder::Asc);
        let names: Vec<_> = regions.iter().map(|r| r.region.as_str()).collect();
        assert_eq!(names, ["Казань", "Москва", "Омск"]);
    }
}
