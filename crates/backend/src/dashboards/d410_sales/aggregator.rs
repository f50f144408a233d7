use contracts::dashboards::d410_sales::SalesMetrics;
use contracts::domain::a010_ozon_fbs_posting::aggregate::{
    consolidate_orders, ConsolidatedOrder, PostingRow, PostingStatus,
};
use contracts::shared::numeric::ratio_or_zero;

/// Метрики продаж по строкам отправлений.
///
/// Строки сначала собираются в заказы по `order_id`, статус заказа берётся
/// с последней строки. Выручка считается по выплате (payout), поэтому
/// чистая прибыль равна выручке: комиссия в payout уже вычтена.
pub fn sales_metrics(rows: &[PostingRow]) -> SalesMetrics {
    let orders = consolidate_orders(rows);
    let mut metrics = SalesMetrics::default();

    for order in &orders {
        add_order(&mut metrics, order);
    }

    metrics.total_orders = orders.len() as f64;
    metrics.avg_order_value = ratio_or_zero(metrics.total_gmv, metrics.total_orders);
    metrics.net_profit = metrics.total_revenue;
    metrics
}

fn add_order(metrics: &mut SalesMetrics, order: &ConsolidatedOrder) {
    metrics.total_units += order.quantity;
    metrics.total_gmv += order.price_total;
    metrics.total_revenue += order.payout;
    metrics.total_commissions += order.commission_amount;

    match order.status {
        PostingStatus::Delivered => {
            metrics.delivered_orders += 1.0;
            metrics.delivered_units += order.quantity;
            metrics.delivered_gmv += order.price_total;
            metrics.delivered_revenue += order.payout;
            metrics.delivered_commissions += order.commission_amount;
        }
        PostingStatus::Cancelled => metrics.cancelled_gmv += order.price_total,
        PostingStatus::InDelivery => metrics.in_delivery_gmv += order.price_total,
        PostingStatus::Other => {}
    }
}
