use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::time::{format_date, format_display_range, parse_date, DateRange};

/// Ось дат отправления, по которой фильтруются и группируются отчёты
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DateType {
    DeliveringDate,
    #[default]
    ShipmentDate,
    InProcessAt,
}

impl DateType {
    pub const ALL: [DateType; 3] = [
        DateType::DeliveringDate,
        DateType::ShipmentDate,
        DateType::InProcessAt,
    ];

    /// Имя колонки в postings_fbs (и значение параметра dateType)
    pub fn as_str(&self) -> &'static str {
        match self {
            DateType::DeliveringDate => "delivering_date",
            DateType::ShipmentDate => "shipment_date",
            DateType::InProcessAt => "in_process_at",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            DateType::DeliveringDate => "Дата доставки",
            DateType::ShipmentDate => "Дата отгрузки",
            DateType::InProcessAt => "Дата обработки",
        }
    }

    /// Неизвестное значение трактуется как ось по умолчанию
    pub fn parse_lenient(value: &str) -> Self {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == value.trim())
            .unwrap_or_default()
    }
}

/// Сырые параметры URL: `from`, `to`, `sku`, `region`, `dateType`
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub from: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sku: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub region: Option<String>,
    #[serde(rename = "dateType", default, skip_serializing_if = "Option::is_none")]
    pub date_type: Option<String>,
}

impl FilterParams {
    pub fn from_query(query: &str) -> Result<Self, serde_qs::Error> {
        serde_qs::from_str(query.trim_start_matches('?'))
    }

    /// Нет ни `from`, ни `to`: при первой загрузке нужно записать окно по умолчанию
    pub fn needs_initialization(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }
}

/// Частичное обновление фильтров. Отсутствующее поле не меняется,
/// пустая строка в `sku`/`region` очищает фильтр.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterPatch {
    #[serde(default)]
    pub date_from: Option<NaiveDate>,
    #[serde(default)]
    pub date_to: Option<NaiveDate>,
    #[serde(default)]
    pub sku: Option<String>,
    #[serde(default)]
    pub region: Option<String>,
    #[serde(default)]
    pub date_type: Option<DateType>,
}

/// Текущее состояние фильтров отчётов
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReportFilters {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    #[serde(default)]
    pub sku: String,
    #[serde(default)]
    pub region: String,
    #[serde(default)]
    pub date_type: DateType,
}

/// Перепутанные границы меняем местами
fn ordered(from: NaiveDate, to: NaiveDate) -> (NaiveDate, NaiveDate) {
    if from > to {
        (to, from)
    } else {
        (from, to)
    }
}

impl ReportFilters {
    /// Фильтры по умолчанию: 7 дней, заканчивая `anchor`
    pub fn default_range(anchor: NaiveDate) -> Self {
        let range = DateRange::trailing_week(anchor);
        Self {
            date_from: range.from,
            date_to: range.to,
            sku: String::new(),
            region: String::new(),
            date_type: DateType::default(),
        }
    }

    /// Разбор параметров URL. Отсутствующие или некорректные даты
    /// заменяются границами окна по умолчанию.
    pub fn from_params(params: &FilterParams, anchor: NaiveDate) -> Self {
        let defaults = Self::default_range(anchor);

        let date_from = params
            .from
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(defaults.date_from);
        let date_to = params
            .to
            .as_deref()
            .and_then(parse_date)
            .unwrap_or(defaults.date_to);

        let (date_from, date_to) = ordered(date_from, date_to);

        Self {
            date_from,
            date_to,
            sku: params.sku.clone().unwrap_or_default().trim().to_string(),
            region: params.region.clone().unwrap_or_default().trim().to_string(),
            date_type: params
                .date_type
                .as_deref()
                .map(DateType::parse_lenient)
                .unwrap_or_default(),
        }
    }

    pub fn from_query(query: &str, anchor: NaiveDate) -> Self {
        let params = FilterParams::from_query(query).unwrap_or_default();
        Self::from_params(&params, anchor)
    }

    /// Применение частичного обновления; исходный объект не меняется
    pub fn apply(&self, patch: &FilterPatch) -> Self {
        let mut next = self.clone();
        if let Some(from) = patch.date_from {
            next.date_from = from;
        }
        if let Some(to) = patch.date_to {
            next.date_to = to;
        }
        if let Some(sku) = &patch.sku {
            next.sku = sku.trim().to_string();
        }
        if let Some(region) = &patch.region {
            next.region = region.trim().to_string();
        }
        if let Some(date_type) = patch.date_type {
            next.date_type = date_type;
        }
        (next.date_from, next.date_to) = ordered(next.date_from, next.date_to);
        next
    }

    /// Сброс: окно по умолчанию, без SKU и региона
    pub fn reset(anchor: NaiveDate) -> Self {
        Self::default_range(anchor)
    }

    pub fn to_params(&self) -> FilterParams {
        FilterParams {
            from: Some(format_date(self.date_from)),
            to: Some(format_date(self.date_to)),
            sku: non_empty(&self.sku),
            region: non_empty(&self.region),
            date_type: Some(self.date_type.as_str().to_string()),
        }
    }

    /// Каноническая строка запроса. Используется и в URL, и как ключ кэша.
    pub fn to_query(&self) -> String {
        serde_qs::to_string(&self.to_params()).unwrap_or_default()
    }

    pub fn range(&self) -> DateRange {
        DateRange::new(self.date_from, self.date_to)
    }

    /// SKU для точного совпадения. Нечисловое значение фильтром не считается.
    pub fn sku_id(&self) -> Option<i64> {
        self.sku.trim().parse::<i64>().ok()
    }

    /// Подстрока для поиска по складу/региону
    pub fn region_filter(&self) -> Option<&str> {
        let trimmed = self.region.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed)
        }
    }

    pub fn is_single_day(&self) -> bool {
        self.date_from == self.date_to
    }

    /// Те же фильтры для предыдущего периода такой же длины
    pub fn previous_period(&self) -> Self {
        let prev = self.range().previous();
        Self {
            date_from: prev.from,
            date_to: prev.to,
            ..self.clone()
        }
    }

    pub fn display_range(&self) -> String {
        format_display_range(&self.range())
    }
}

fn non_empty(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

/// Ответ `/api/filters`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FiltersView {
    pub filters: ReportFilters,
    /// Строка запроса для записи в URL
    pub query: String,
    /// Клиент должен заменить URL (replace) на `query`
    #[serde(default)]
    pub needs_initialization: bool,
    pub display_range: String,
    pub previous_from: NaiveDate,
    pub previous_to: NaiveDate,
    pub is_single_day: bool,
}

impl FiltersView {
    pub fn new(filters: ReportFilters, needs_initialization: bool) -> Self {
        let previous = filters.range().previous();
        Self {
            query: filters.to_query(),
            display_range: filters.display_range(),
            previous_from: previous.from,
            previous_to: previous.to,
            is_single_day: filters.is_single_day(),
            needs_initialization,
            filters,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    fn anchor() -> NaiveDate {
        d(2025, 8, 25)
    }

    #[test]
    fn test_missing_params_use_default_window() {
        let params = FilterParams::default();
        assert!(params.needs_initialization());

        let filters = ReportFilters::from_params(&params, anchor());
        assert_eq!(filters.date_from, d(2025, 8, 19));
        assert_eq!(filters.date_to, d(2025, 8, 25));
        assert_eq!(filters.date_type, DateType::ShipmentDate);
        assert!(filters.sku.is_empty());
    }

    #[test]
    fn test_query_roundtrip_keeps_url_contract() {
        let filters = ReportFilters::from_query(
            "from=2025-08-01&to=2025-08-10&sku=123456&region=%D0%9C%D0%BE%D1%81%D0%BA%D0%B2%D0%B0&dateType=delivering_date",
            anchor(),
        );
        assert_eq!(filters.date_from, d(2025, 8, 1));
        assert_eq!(filters.date_to, d(2025, 8, 10));
        assert_eq!(filters.sku_id(), Some(123456));
        assert_eq!(filters.region_filter(), Some("Москва"));
        assert_eq!(filters.date_type, DateType::DeliveringDate);

        let again = ReportFilters::from_query(&filters.to_query(), anchor());
        assert_eq!(again, filters);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let filters =
            ReportFilters::from_query("from=garbage&to=2025-08-20&dateType=unknown", anchor());
        assert_eq!(filters.date_from, d(2025, 8, 19));
        assert_eq!(filters.date_to, d(2025, 8, 20));
        assert_eq!(filters.date_type, DateType::ShipmentDate);
    }

    #[test]
    fn test_swapped_bounds_are_ordered() {
        let filters = ReportFilters::from_query("from=2025-08-20&to=2025-08-10", anchor());
        assert_eq!(filters.date_from, d(2025, 8, 10));
        assert_eq!(filters.date_to, d(2025, 8, 20));

        // частичное обновление тоже не оставляет перевёрнутый диапазон
        let patched = ReportFilters::default_range(anchor()).apply(&FilterPatch {
            date_from: Some(d(2025, 9, 1)),
            ..Default::default()
        });
        assert_eq!(patched.date_from, d(2025, 8, 25));
        assert_eq!(patched.date_to, d(2025, 9, 1));
        assert_eq!(FiltersView::new(patched, false).display_range, "25.08.2025 - 01.09.2025");
    }

    #[test]
    fn test_apply_changes_only_patched_fields() {
        let base = ReportFilters::from_query("sku=42&region=Казань", anchor());
        let next = base.apply(&FilterPatch {
            date_type: Some(DateType::InProcessAt),
            ..Default::default()
        });
        assert_eq!(next.sku, "42");
        assert_eq!(next.region, "Казань");
        assert_eq!(next.date_from, base.date_from);
        assert_eq!(next.date_type, DateType::InProcessAt);
        // исходный объект не изменился
        assert_eq!(base.date_type, DateType::ShipmentDate);

        let cleared = next.apply(&FilterPatch {
            sku: Some(String::new()),
            ..Default::default()
        });
        assert!(cleared.sku.is_empty());
        assert_eq!(cleared.region, "Казань");
        assert!(!cleared.to_query().contains("sku="));
    }

    #[test]
    fn test_reset_restores_default_window() {
        let custom = ReportFilters::from_query(
            "from=2025-01-01&to=2025-01-31&sku=1&region=x&dateType=in_process_at",
            anchor(),
        );
        let reset = ReportFilters::reset(anchor());
        assert_ne!(custom, reset);
        assert_eq!(reset.date_from, d(2025, 8, 19));
        assert_eq!(reset.date_to, d(2025, 8, 25));
        assert!(reset.sku.is_empty());
        assert!(reset.region.is_empty());
        assert_eq!(reset.range().days(), 7);
    }

    #[test]
    fn test_non_numeric_sku_is_ignored() {
        let filters = ReportFilters::from_query("sku=abc", anchor());
        assert_eq!(filters.sku, "abc");
        assert_eq!(filters.sku_id(), None);
    }

    #[test]
    fn test_previous_period_keeps_other_filters() {
        let filters =
            ReportFilters::from_query("from=2025-08-19&to=2025-08-25&sku=7", anchor());
        let prev = filters.previous_period();
        assert_eq!(prev.date_from, d(2025, 8, 12));
        assert_eq!(prev.date_to, d(2025, 8, 18));
        assert_eq!(prev.sku, "7");
    }

    #[test]
    fn test_filters_view_marks_initialization() {
        let view = FiltersView::new(ReportFilters::default_range(anchor()), true);
        assert!(view.needs_initialization);
        assert!(view.query.starts_with("from=2025-08-19&to=2025-08-25"));
        assert_eq!(view.display_range, "19.08.2025 - 25.08.2025");
        assert_eq!(view.previous_to, d(2025, 8, 18));
    }
}
