use axum::{
    routing::{get, post, put},
    Router,
};

use crate::handlers;
use crate::system::state::AppState;

/// Конфигурация всех роутов приложения
pub fn configure_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(|| async { "ok" }))
        // Глобальные фильтры отчётов
        .route("/api/filters", get(handlers::filters::current))
        .route("/api/filters/update", post(handlers::filters::update))
        .route("/api/filters/reset", post(handlers::filters::reset))
        // D410 Sales
        .route("/api/d410/sales/metrics", get(handlers::d410_sales::metrics))
        .route("/api/d410/sales/daily", get(handlers::d410_sales::daily))
        // D411 Products
        .route("/api/d411/products", get(handlers::d411_products::list))
        .route(
            "/api/d411/products/metrics",
            get(handlers::d411_products::metrics),
        )
        .route(
            "/api/d411/products/export.csv",
            get(handlers::d411_products::export_csv),
        )
        // D412 Regions
        .route("/api/d412/regions", get(handlers::d412_regions::list))
        .route(
            "/api/d412/regions/metrics",
            get(handlers::d412_regions::metrics),
        )
        // D413 Finance
        .route(
            "/api/d413/finance/summary",
            get(handlers::d413_finance::summary),
        )
        .route(
            "/api/d413/finance/breakdown",
            get(handlers::d413_finance::breakdown),
        )
        .route(
            "/api/d413/finance/cost-analysis",
            get(handlers::d413_finance::cost_analysis),
        )
        .route(
            "/api/d413/finance/ledger-cost-analysis",
            get(handlers::d413_finance::ledger_cost_analysis),
        )
        .route(
            "/api/d413/finance/operations",
            get(handlers::d413_finance::operations),
        )
        // D414 Transactions
        .route(
            "/api/d414/transactions",
            get(handlers::d414_transactions::list),
        )
        .route(
            "/api/d414/transactions/export.csv",
            get(handlers::d414_transactions::export_csv),
        )
        // A025 Product costs
        .route(
            "/api/a025/product-costs",
            get(handlers::a025_product_cost::list_all).post(handlers::a025_product_cost::upsert),
        )
        .route(
            "/api/a025/product-costs/stats",
            get(handlers::a025_product_cost::stats),
        )
        .route(
            "/api/a025/product-costs/:id",
            put(handlers::a025_product_cost::update).delete(handlers::a025_product_cost::delete),
        )
        .with_state(state)
}
