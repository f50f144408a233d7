use serde::{Deserialize, Serialize};

use crate::shared::filters::DateType;
use crate::shared::numeric::{de_opt_i64, de_opt_key, Numeric};

/// Таблица отправлений FBS в хранилище
pub const TABLE: &str = "postings_fbs";

/// Статус отправления FBS
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PostingStatus {
    Delivered,
    Cancelled,
    InDelivery,
    #[default]
    #[serde(other)]
    Other,
}

impl PostingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PostingStatus::Delivered => "delivered",
            PostingStatus::Cancelled => "cancelled",
            PostingStatus::InDelivery => "in_delivery",
            PostingStatus::Other => "other",
        }
    }
}

/// Строка отправления FBS (одна позиция заказа)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PostingRow {
    #[serde(default, deserialize_with = "de_opt_key")]
    pub order_id: Option<String>,
    #[serde(default)]
    pub posting_number: Option<String>,
    #[serde(default, deserialize_with = "de_opt_i64")]
    pub sku: Option<i64>,
    #[serde(default)]
    pub offer_id: Option<String>,
    #[serde(default)]
    pub product_name: Option<String>,
    #[serde(default)]
    pub quantity: Numeric,
    /// Цена за единицу
    #[serde(default)]
    pub price: Numeric,
    /// Цена позиции (GMV)
    #[serde(default)]
    pub price_total: Numeric,
    /// К выплате продавцу (после комиссии)
    #[serde(default)]
    pub payout: Numeric,
    #[serde(default)]
    pub commission_amount: Numeric,
    #[serde(default, deserialize_with = "de_status")]
    pub status: PostingStatus,
    #[serde(default)]
    pub shipment_date: Option<String>,
    #[serde(default)]
    pub delivering_date: Option<String>,
    #[serde(default)]
    pub in_process_at: Option<String>,
    #[serde(default)]
    pub warehouse_name: Option<String>,
}

impl PostingRow {
    /// Значение выбранной оси дат
    pub fn date_on(&self, axis: DateType) -> Option<&str> {
        match axis {
            DateType::ShipmentDate => self.shipment_date.as_deref(),
            DateType::DeliveringDate => self.delivering_date.as_deref(),
            DateType::InProcessAt => self.in_process_at.as_deref(),
        }
    }
}

/// `null` в статусе трактуется как прочий статус
fn de_status<'de, D>(deserializer: D) -> Result<PostingStatus, D::Error>
where
    D: serde::Deserializer<'de>,
{
    Ok(Option::<PostingStatus>::deserialize(deserializer)?.unwrap_or_default())
}

/// Поля, выбираемые для расчёта метрик продаж
pub const SALES_COLUMNS: &str = "order_id,sku,quantity,price_total,payout,commission_amount,status,in_process_at,shipment_date,delivering_date,warehouse_name";

/// Поля проданных позиций для расчёта себестоимости
pub const SOLD_ITEM_COLUMNS: &str = "sku,offer_id,quantity,payout,status";

/// Поля каталога для справочника себестоимости
pub const CATALOG_COLUMNS: &str = "id,sku,offer_id,product_name,price";

/// Последние данные каталога по паре (sku, offer_id)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CatalogEntry {
    pub sku: i64,
    pub offer_id: String,
    pub product_name: String,
    pub price: f64,
}

/// Заказ, собранный из всех строк одного `order_id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConsolidatedOrder {
    pub order_id: String,
    pub quantity: f64,
    pub price_total: f64,
    pub payout: f64,
    pub commission_amount: f64,
    /// Статус последней строки заказа
    pub status: PostingStatus,
    pub lines: usize,
}

impl ConsolidatedOrder {
    fn start(order_id: String, row: &PostingRow) -> Self {
        Self {
            order_id,
            quantity: row.quantity.value(),
            price_total: row.price_total.value(),
            payout: row.payout.value(),
            commission_amount: row.commission_amount.value(),
            status: row.status,
            lines: 1,
        }
    }

    fn absorb(&mut self, row: &PostingRow) {
        self.quantity += row.quantity.value();
        self.price_total += row.price_total.value();
        self.payout += row.payout.value();
        self.commission_amount += row.commission_amount.value();
        self.status = row.status;
        self.lines += 1;
    }
}

/// Группировка строк по `order_id` в порядке первого появления.
/// Строка без `order_id` считается отдельным заказом.
pub fn consolidate_orders(rows: &[PostingRow]) -> Vec<ConsolidatedOrder> {
    let mut orders: Vec<ConsolidatedOrder> = Vec::new();
    let mut index: std::collections::HashMap<String, usize> = std::collections::HashMap::new();

    for (i, row) in rows.iter().enumerate() {
        let key = row
            .order_id
            .clone()
            .unwrap_or_else(|| format!("__row_{}", i));
        match index.get(&key) {
            Some(&pos) => orders[pos].absorb(row),
            None => {
                index.insert(key.clone(), orders.len());
                orders.push(ConsolidatedOrder::start(key, row));
            }
        }
    }
    orders
}
