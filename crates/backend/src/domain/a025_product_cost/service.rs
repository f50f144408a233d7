use std::collections::HashMap;

use chrono::{DateTime, FixedOffset};
use contracts::domain::a010_ozon_fbs_posting::aggregate::CatalogEntry;
use contracts::domain::a025_product_cost::aggregate::{
    ProductCostForm, ProductCostRow, ProductCostStats, ProductCostUpdateForm, ProductCostView,
};

use super::repository;
use crate::domain::a010_ozon_fbs_posting::repository as postings;
use crate::shared::api_error::ApiError;
use crate::shared::cache::QueryCache;
use crate::shared::data::retry::run_with_retry;
use crate::shared::data::BackendError;
use crate::system::state::AppState;

const COSTS_KEY: &str = "a025_product_costs";
const CATALOG_KEY: &str = "a025_catalog";

/// Себестоимость по (sku, offer_id) и по одному sku.
/// При нескольких записях на ключ берётся самая свежая по `updated_at`.
#[derive(Debug, Clone, Default)]
pub struct CostIndex {
    by_product: HashMap<(i64, String), Stamped>,
    by_sku: HashMap<i64, Stamped>,
}

#[derive(Debug, Clone)]
struct Stamped {
    cost: f64,
    updated_at: Option<DateTime<FixedOffset>>,
}

impl Stamped {
    fn is_newer_than(&self, other: &Stamped) -> bool {
        is_newer(self.updated_at, other.updated_at)
    }
}

/// Запись без даты не вытесняет датированную; при равенстве остаётся первая
fn is_newer(candidate: Option<DateTime<FixedOffset>>, kept: Option<DateTime<FixedOffset>>) -> bool {
    match (candidate, kept) {
        (Some(a), Some(b)) => a > b,
        (Some(_), None) => true,
        _ => false,
    }
}

/// Время изменения записи: `updated_at`, иначе `created_at`
fn record_time(row: &ProductCostRow) -> Option<DateTime<FixedOffset>> {
    row.updated_at
        .as_deref()
        .or(row.created_at.as_deref())
        .and_then(|s| DateTime::parse_from_rfc3339(s.trim()).ok())
}

fn keep_newest<K: std::hash::Hash + Eq>(map: &mut HashMap<K, Stamped>, key: K, value: Stamped) {
    match map.get(&key) {
        Some(existing) if !value.is_newer_than(existing) => {}
        _ => {
            map.insert(key, value);
        }
    }
}

impl CostIndex {
    pub fn from_rows(rows: &[ProductCostRow]) -> Self {
        let mut index = CostIndex::default();
        for row in rows {
            let (Some(sku), Some(cost)) = (row.sku, row.cost()) else {
                continue;
            };
            let stamped = Stamped {
                cost,
                updated_at: record_time(row),
            };
            if let Some(offer_id) = &row.offer_id {
                keep_newest(&mut index.by_product, (sku, offer_id.clone()), stamped.clone());
            }
            keep_newest(&mut index.by_sku, sku, stamped);
        }
        index
    }

    pub fn cost_for(&self, sku: i64, offer_id: &str) -> Option<f64> {
        self.by_product
            .get(&(sku, offer_id.to_string()))
            .map(|s| s.cost)
    }

    pub fn cost_for_sku(&self, sku: i64) -> Option<f64> {
        self.by_sku.get(&sku).map(|s| s.cost)
    }

    pub fn len(&self) -> usize {
        self.by_product.len()
    }
}

/// Каталог, дополненный себестоимостью; сортировка по sku по убыванию
pub fn merge_catalog(catalog: &[CatalogEntry], costs: &[ProductCostRow]) -> Vec<ProductCostView> {
    // дубликаты разрешаются так же, как в CostIndex: побеждает самая свежая
    // запись с введённой себестоимостью
    let mut by_product: HashMap<(i64, &str), &ProductCostRow> = HashMap::new();
    for row in costs {
        let (Some(sku), Some(offer_id)) = (row.sku, row.offer_id.as_deref()) else {
            continue;
        };
        let newer = by_product
            .get(&(sku, offer_id))
            .map_or(true, |kept| match (row.cost(), kept.cost()) {
                (Some(_), None) => true,
                (None, Some(_)) => false,
                _ => is_newer(record_time(row), record_time(kept)),
            });
        if newer {
            by_product.insert((sku, offer_id), row);
        }
    }

    let mut views: Vec<ProductCostView> = catalog
        .iter()
        .map(|entry| {
            let cost = by_product.get(&(entry.sku, entry.offer_id.as_str()));
            ProductCostView {
                id: cost.and_then(|c| c.id),
                sku: entry.sku,
                offer_id: entry.offer_id.clone(),
                product_name: entry.product_name.clone(),
                unit_price: entry.price,
                cost_price: cost.and_then(|c| c.cost()),
                updated_at: cost.and_then(|c| c.updated_at.clone()),
                created_at: cost.and_then(|c| c.created_at.clone()),
            }
        })
        .collect();
    views.sort_by(|a, b| b.sku.cmp(&a.sku).then_with(|| a.offer_id.cmp(&b.offer_id)));
    views
}

async fn cost_rows(state: &AppState) -> Result<Vec<ProductCostRow>, BackendError> {
    state
        .cache
        .get_or_fetch(&QueryCache::key(COSTS_KEY, "all"), || {
            run_with_retry(state.settings.retry_attempts, "product costs", || {
                repository::list_costs(&state.client)
            })
        })
        .await
}

/// Индекс себестоимости для расчётов прибыли
pub async fn load_cost_index(state: &AppState) -> Result<CostIndex, BackendError> {
    let rows = cost_rows(state).await?;
    let index = CostIndex::from_rows(&rows);
    tracing::debug!("cost index: {} products", index.len());
    Ok(index)
}

pub async fn list_views(state: &AppState) -> Result<Vec<ProductCostView>, ApiError> {
    let catalog: Vec<CatalogEntry> = state
        .cache
        .get_or_fetch(&QueryCache::key(CATALOG_KEY, "all"), || {
            run_with_retry(state.settings.retry_attempts, "catalog", || {
                postings::latest_catalog(&state.client)
            })
        })
        .await?;
    let costs = cost_rows(state).await?;
    Ok(merge_catalog(&catalog, &costs))
}

pub async fn stats(state: &AppState) -> Result<ProductCostStats, ApiError> {
    let views = list_views(state).await?;
    Ok(ProductCostStats::from_views(&views))
}

/// Себестоимость участвует в прибыли товаров и финансовых отчётах: сбрасываем и их
fn invalidate(state: &AppState) {
    let dropped = [
        COSTS_KEY,
        crate::dashboards::d411_products::service::CACHE_PREFIX,
        crate::dashboards::d413_finance::service::CACHE_PREFIX,
    ]
    .iter()
    .map(|prefix| state.cache.invalidate_prefix(prefix))
    .sum::<usize>();
    tracing::debug!("cost prices changed, {} cached queries dropped", dropped);
}

pub async fn save(state: &AppState, form: &ProductCostForm) -> Result<ProductCostRow, ApiError> {
    let input = form.validate()?;
    let row = repository::upsert_cost(&state.client, &input).await?;
    tracing::info!(
        "Saved cost price {} for sku {} / {}",
        input.cost_price,
        input.sku,
        input.offer_id
    );
    invalidate(state);
    Ok(row)
}

pub async fn update(
    state: &AppState,
    id: i64,
    form: &ProductCostUpdateForm,
) -> Result<ProductCostRow, ApiError> {
    let patch = form.validate()?;
    let row = repository::update_cost(&state.client, id, &patch)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("Product cost {} not found", id)))?;
    tracing::info!("Updated cost price of record {} to {}", id, patch.cost_price);
    invalidate(state);
    Ok(row)
}

pub async fn delete(state: &AppState, id: i64) -> Result<(), ApiError> {
    repository::delete_cost(&state.client, id).await?;
    tracing::info!("Deleted cost price record {}", id);
    invalidate(state);
    Ok(())
}
