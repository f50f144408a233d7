use std::collections::HashSet;

use contracts::domain::a010_ozon_fbs_posting::aggregate::{
    CatalogEntry, PostingRow, PostingStatus, CATALOG_COLUMNS, SALES_COLUMNS, SOLD_ITEM_COLUMNS,
    TABLE,
};
use contracts::shared::filters::ReportFilters;
use contracts::shared::table::SortOrder;
use contracts::shared::time::CivilZone;
use serde::Deserialize;

use crate::shared::data::{BackendError, PostgrestClient, TableQuery};

/// Запрос отправлений за период по выбранной оси дат.
///
/// Границы: `[from 00:00, to+1 00:00)` в гражданской зоне. SKU сравнивается
/// точно, регион ищется подстрокой в названии склада.
pub fn window_query(filters: &ReportFilters, zone: &CivilZone, columns: &str) -> TableQuery {
    let axis = filters.date_type.as_str();
    let (start, end) = filters.range().instants(zone);

    let mut query = TableQuery::new()
        .select(columns)
        .gte(axis, start.to_rfc3339())
        .lt(axis, end.to_rfc3339());
    if let Some(sku) = filters.sku_id() {
        query = query.eq("sku", sku);
    }
    if let Some(region) = filters.region_filter() {
        query = query.ilike("warehouse_name", region);
    }
    query
}

/// Строки отправлений для метрик продаж.
/// Упорядочены по дате оси, чтобы статус заказа брался с последней строки.
pub async fn list_postings(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
) -> Result<Vec<PostingRow>, BackendError> {
    let query = window_query(filters, zone, SALES_COLUMNS)
        .order(filters.date_type.as_str(), SortOrder::Asc)
        .order("id", SortOrder::Asc);
    client.select_all(TABLE, &query).await
}

/// Проданные позиции (без отменённых) для расчёта себестоимости
pub async fn list_sold_items(
    client: &PostgrestClient,
    filters: &ReportFilters,
    zone: &CivilZone,
) -> Result<Vec<PostingRow>, BackendError> {
    let query = window_query(filters, zone, SOLD_ITEM_COLUMNS)
        .order(filters.date_type.as_str(), SortOrder::Asc)
        .order("id", SortOrder::Asc);
    let rows: Vec<PostingRow> = client.select_all(TABLE, &query).await?;
    Ok(rows
        .into_iter()
        .filter(|row| row.status != PostingStatus::Cancelled)
        .collect())
}

#[derive(Debug, Deserialize)]
struct CatalogRow {
    #[serde(default, deserialize_with = "contracts::shared::numeric::de_opt_i64")]
    sku: Option<i64>,
    #[serde(default)]
    offer_id: Option<String>,
    #[serde(default)]
    product_name: Option<String>,
    #[serde(default)]
    price: contracts::shared::numeric::Numeric,
}

/// Первая встреченная строка на пару (sku, offer_id); строки без ключа пропускаются
fn latest_per_product(rows: Vec<CatalogRow>) -> Vec<CatalogEntry> {
    let mut seen: HashSet<(i64, String)> = HashSet::new();
    let mut entries = Vec::new();
    for row in rows {
        let (Some(sku), Some(offer_id)) = (row.sku, row.offer_id) else {
            continue;
        };
        if !seen.insert((sku, offer_id.clone())) {
            continue;
        }
        entries.push(CatalogEntry {
            sku,
            offer_id,
            product_name: row.product_name.unwrap_or_default(),
            price: row.price.value(),
        });
    }
    entries
}

/// Каталог товаров по последним отправлениям (новые сначала)
pub async fn latest_catalog(client: &PostgrestClient) -> Result<Vec<CatalogEntry>, BackendError> {
    let query = TableQuery::new()
        .select(CATALOG_COLUMNS)
        .is_not_null("product_name")
        .order("id", SortOrder::Desc);
    let rows: Vec<CatalogRow> = client.select_all(TABLE, &query).await?;
    let entries = latest_per_product(rows);
    tracing::debug!("catalog: {} products", entries.len());
    Ok(entries)
}
