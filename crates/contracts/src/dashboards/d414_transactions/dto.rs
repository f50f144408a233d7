use serde::{Deserialize, Serialize};

use crate::domain::a014_ozon_transactions::aggregate::{TransactionCategory, TransactionRow};
use crate::shared::format::format_currency;
use crate::shared::table::{Column, SortOrder, TableView};

/// Колонки, по которым хранилище умеет искать подстроку
pub const SEARCH_COLUMNS: [&str; 3] = ["posting_number", "operation_type", "operation_type_name"];

/// Строка журнала операций с категорией
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TransactionDetail {
    pub transaction_id: i64,
    pub operation_date: String,
    pub posting_number: String,
    pub operation_type: String,
    pub operation_type_name: String,
    pub accruals_for_sale: f64,
    pub sale_commission: f64,
    pub amount: f64,
    pub category: TransactionCategory,
    pub category_label: String,
}

impl From<&TransactionRow> for TransactionDetail {
    fn from(row: &TransactionRow) -> Self {
        let category = row.category();
        Self {
            transaction_id: row.display_id(),
            operation_date: row.operation_date.clone().unwrap_or_default(),
            posting_number: row.posting_number.clone().unwrap_or_default(),
            operation_type: row.operation_type().to_string(),
            operation_type_name: row.operation_type_name.clone().unwrap_or_default(),
            accruals_for_sale: row.accruals_for_sale.value(),
            sale_commission: row.sale_commission.value(),
            amount: row.amount.value(),
            category_label: category.label().to_string(),
            category,
        }
    }
}

fn render_date(t: &TransactionDetail) -> String {
    // "2025-08-20T10:15:00+03:00" → "2025-08-20 10:15"
    let date = t.operation_date.get(..10).unwrap_or(&t.operation_date);
    match t.operation_date.get(11..16) {
        Some(time) => format!("{} {}", date, time),
        None => date.to_string(),
    }
}

pub fn transactions_view() -> TableView<TransactionDetail> {
    TableView {
        columns: vec![
            Column {
                key: "operation_date",
                label: "Дата операции",
                sortable: true,
                render: render_date,
            },
            Column {
                key: "posting_number",
                label: "Номер отправления",
                sortable: false,
                render: |t: &TransactionDetail| t.posting_number.clone(),
            },
            Column {
                key: "operation_type",
                label: "Тип операции",
                sortable: false,
                render: |t: &TransactionDetail| t.operation_type.clone(),
            },
            Column {
                key: "operation_type_name",
                label: "Название операции",
                sortable: false,
                render: |t: &TransactionDetail| t.operation_type_name.clone(),
            },
            Column {
                key: "accruals_for_sale",
                label: "Выручка",
                sortable: true,
                render: |t: &TransactionDetail| format_currency(t.accruals_for_sale),
            },
            Column {
                key: "sale_commission",
                label: "Комиссия",
                sortable: true,
                render: |t: &TransactionDetail| format_currency(t.sale_commission),
            },
            Column {
                key: "amount",
                label: "Сумма операции",
                sortable: true,
                render: |t: &TransactionDetail| format_currency(t.amount),
            },
            Column {
                key: "category",
                label: "Категория",
                sortable: false,
                render: |t: &TransactionDetail| t.category.badge().to_string(),
            },
        ],
        default_sort: "operation_date",
        default_order: SortOrder::Desc,
        default_page_size: 25,
    }
}
