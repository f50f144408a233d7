use contracts::domain::a025_product_cost::aggregate::{
    ProductCostInput, ProductCostPatch, ProductCostRow, CONFLICT_KEY, TABLE,
};
use contracts::shared::table::SortOrder;

use crate::shared::data::{BackendError, PostgrestClient, TableQuery};

pub async fn list_costs(client: &PostgrestClient) -> Result<Vec<ProductCostRow>, BackendError> {
    let query = TableQuery::new()
        .select("*")
        .order("updated_at", SortOrder::Desc);
    client.select_all(TABLE, &query).await
}

/// Вставка или обновление по (sku, offer_id)
pub async fn upsert_cost(
    client: &PostgrestClient,
    input: &ProductCostInput,
) -> Result<ProductCostRow, BackendError> {
    let rows: Vec<ProductCostRow> = client.upsert(TABLE, input, CONFLICT_KEY).await?;
    rows.into_iter()
        .next()
        .ok_or_else(|| BackendError::Decode("upsert returned no rows".into()))
}

/// `None`, если записи с таким id нет
pub async fn update_cost(
    client: &PostgrestClient,
    id: i64,
    patch: &ProductCostPatch,
) -> Result<Option<ProductCostRow>, BackendError> {
    let rows: Vec<ProductCostRow> = client
        .update(TABLE, &TableQuery::new().eq("id", id), patch)
        .await?;
    Ok(rows.into_iter().next())
}

pub async fn delete_cost(client: &PostgrestClient, id: i64) -> Result<(), BackendError> {
    client.delete(TABLE, &TableQuery::new().eq("id", id)).await
}
