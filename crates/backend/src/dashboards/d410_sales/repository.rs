use contracts::dashboards::d410_sales::{DailySalesRow, DAILY_SALES_VIEW};
use contracts::shared::filters::ReportFilters;
use contracts::shared::table::SortOrder;
use contracts::shared::time::format_date;

use crate::shared::data::{BackendError, PostgrestClient, TableQuery};

/// Запрос к представлению дневных продаж.
/// Даты в представлении уже гражданские (МСК), границы включительные.
/// SKU и регион представление не различает.
pub fn daily_query(filters: &ReportFilters) -> TableQuery {
    TableQuery::new()
        .select("*")
        .gte("date_msk", format_date(filters.date_from))
        .lte("date_msk", format_date(filters.date_to))
        .eq("date_type", filters.date_type.as_str())
        .order("date_msk", SortOrder::Asc)
}

pub async fn list_daily_sales(
    client: &PostgrestClient,
    filters: &ReportFilters,
) -> Result<Vec<DailySalesRow>, BackendError> {
    client.select_all(DAILY_SALES_VIEW, &daily_query(filters)).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use contracts::shared::filters::DateType;

    #[test]
    fn test_daily_query() {
        let mut filters = ReportFilters::default_range(NaiveDate::from_ymd_opt(2025, 8, 25).unwrap());
        filters.date_type = DateType::InProcessAt;
        filters.sku = "55".into();
        let pairs = daily_query(&filters).to_pairs();
        assert!(pairs.contains(&("date_msk".to_string(), "gte.2025-08-19".to_string())));
        assert!(pairs.contains(&("date_msk".to_string(), "lte.2025-08-25".to_string())));
        assert!(pairs.contains(&("date_type".to_string(), "eq.in_process_at".to_string())));
        assert!(!pairs.iter().any(|(k, _)| k == "sku"));
    }
}
