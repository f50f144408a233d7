use serde::{Deserialize, Serialize};

use crate::shared::filters::ReportFilters;
use crate::shared::numeric::{calculate_change, ratio_or_zero, Change, Numeric};
use crate::shared::outcome::ReportOutcome;

/// Представление дневных продаж по выбранной оси дат
pub const DAILY_SALES_VIEW: &str = "vw_daily_sales_by_date_type";

/// Метрики продаж за период.
///
/// Выручка здесь: выплата продавцу (payout), комиссия уже вычтена.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SalesMetrics {
    pub total_orders: f64,
    pub total_units: f64,
    /// GMV: сумма price_total
    pub total_gmv: f64,
    pub total_revenue: f64,
    pub total_commissions: f64,
    pub avg_order_value: f64,
    pub delivered_orders: f64,
    pub delivered_units: f64,
    pub delivered_gmv: f64,
    pub delivered_revenue: f64,
    pub delivered_commissions: f64,
    pub cancelled_gmv: f64,
    pub in_delivery_gmv: f64,
    pub net_profit: f64,
}

/// Изменения ключевых метрик относительно предыдущего периода
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SalesChanges {
    pub orders: Change,
    pub units: Change,
    pub gmv: Change,
    pub revenue: Change,
    pub avg_order_value: Change,
    pub net_profit: Change,
}

impl SalesChanges {
    pub fn between(current: &SalesMetrics, previous: &SalesMetrics) -> Self {
        Self {
            orders: calculate_change(current.total_orders, previous.total_orders),
            units: calculate_change(current.total_units, previous.total_units),
            gmv: calculate_change(current.total_gmv, previous.total_gmv),
            revenue: calculate_change(current.total_revenue, previous.total_revenue),
            avg_order_value: calculate_change(current.avg_order_value, previous.avg_order_value),
            net_profit: calculate_change(current.net_profit, previous.net_profit),
        }
    }
}

/// Ответ `/api/d410/sales/metrics`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SalesMetricsResponse {
    pub filters: ReportFilters,
    pub current: ReportOutcome<SalesMetrics>,
    pub previous: ReportOutcome<SalesMetrics>,
    pub changes: SalesChanges,
}

/// Строка представления дневных продаж
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DailySalesRow {
    #[serde(default)]
    pub date_msk: Option<String>,
    #[serde(default)]
    pub date_type: Option<String>,
    #[serde(default)]
    pub delivered_orders: Numeric,
    #[serde(default)]
    pub delivered_units: Numeric,
    #[serde(default)]
    pub delivered_gmv: Numeric,
    #[serde(default)]
    pub delivered_revenue: Numeric,
}

/// Точка графика дневных продаж
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailySalesPoint {
    pub date: String,
    pub orders: f64,
    pub units: f64,
    pub gmv: f64,
    pub revenue: f64,
    pub avg_order_value: f64,
}

impl From<&DailySalesRow> for DailySalesPoint {
    fn from(row: &DailySalesRow) -> Self {
        let orders = row.delivered_orders.value();
        let gmv = row.delivered_gmv.value();
        Self {
            date: row.date_msk.clone().unwrap_or_default(),
            orders,
            units: row.delivered_units.value(),
            gmv,
            revenue: row.delivered_revenue.value(),
            // не меньше одного заказа в знаменателе
            avg_order_value: ratio_or_zero(gmv, orders.max(1.0)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailySalesResponse {
    pub filters: ReportFilters,
    pub points: ReportOutcome<Vec<DailySalesPoint>>,
}
