use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use contracts::domain::a025_product_cost::aggregate::{
    ProductCostForm, ProductCostRow, ProductCostStats, ProductCostUpdateForm, ProductCostView,
};

use crate::domain::a025_product_cost::service;
use crate::shared::api_error::ApiError;
use crate::system::state::AppState;

/// GET /api/a025/product-costs
/// Каталог товаров с введённой себестоимостью
pub async fn list_all(State(state): State<AppState>) -> Result<Json<Vec<ProductCostView>>, ApiError> {
    Ok(Json(service::list_views(&state).await?))
}

/// GET /api/a025/product-costs/stats
pub async fn stats(State(state): State<AppState>) -> Result<Json<ProductCostStats>, ApiError> {
    Ok(Json(service::stats(&state).await?))
}

/// POST /api/a025/product-costs
/// Создание или замена записи по (sku, offer_id)
pub async fn upsert(
    State(state): State<AppState>,
    Json(form): Json<ProductCostForm>,
) -> Result<Json<ProductCostRow>, ApiError> {
    Ok(Json(service::save(&state, &form).await?))
}

/// PUT /api/a025/product-costs/:id
pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(form): Json<ProductCostUpdateForm>,
) -> Result<Json<ProductCostRow>, ApiError> {
    Ok(Json(service::update(&state, id, &form).await?))
}

/// DELETE /api/a025/product-costs/:id
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    service::delete(&state, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
