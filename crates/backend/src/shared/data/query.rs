use contracts::shared::table::SortOrder;

/// Символы, зарезервированные в синтаксисе фильтров PostgREST
const RESERVED: [char; 6] = [',', '(', ')', '"', '*', '\\'];

/// Очищает поисковую строку от зарезервированных символов
pub fn sanitize_search(term: &str) -> String {
    term.chars()
        .filter(|c| !RESERVED.contains(c))
        .collect::<String>()
        .trim()
        .to_string()
}

/// Построитель запроса к таблице/представлению PostgREST.
///
/// Фильтры кодируются как параметры строки запроса:
/// `col=eq.value`, `col=gte.value`, `or=(a.ilike.*x*,b.ilike.*x*)` и т.д.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TableQuery {
    select: Option<String>,
    filters: Vec<(String, String)>,
    order: Vec<String>,
    range: Option<(usize, usize)>,
}

impl TableQuery {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn select(mut self, columns: &str) -> Self {
        self.select = Some(columns.to_string());
        self
    }

    fn filter(mut self, column: &str, op: &str, value: impl ToString) -> Self {
        self.filters
            .push((column.to_string(), format!("{}.{}", op, value.to_string())));
        self
    }

    pub fn eq(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "eq", value)
    }

    pub fn gte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "gte", value)
    }

    pub fn lt(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lt", value)
    }

    pub fn lte(self, column: &str, value: impl ToString) -> Self {
        self.filter(column, "lte", value)
    }

    /// Подстрока без учёта регистра; пустой терм игнорируется
    pub fn ilike(self, column: &str, term: &str) -> Self {
        let term = sanitize_search(term);
        if term.is_empty() {
            return self;
        }
        self.filter(column, "ilike", format!("*{}*", term))
    }

    pub fn is_not_null(self, column: &str) -> Self {
        self.filter(column, "not.is", "null")
    }

    /// Поиск подстроки по любой из колонок
    pub fn or_ilike(mut self, columns: &[&str], term: &str) -> Self {
        let term = sanitize_search(term);
        if term.is_empty() || columns.is_empty() {
            return self;
        }
        let parts: Vec<String> = columns
            .iter()
            .map(|c| format!("{}.ilike.*{}*", c, term))
            .collect();
        self.filters
            .push(("or".to_string(), format!("({})", parts.join(","))));
        self
    }

    pub fn order(mut self, column: &str, order: SortOrder) -> Self {
        self.order.push(format!("{}.{}", column, order.as_str()));
        self
    }

    /// Включительный диапазон строк
    pub fn range(mut self, from: usize, to: usize) -> Self {
        self.range = Some((from, to.max(from)));
        self
    }

    pub fn has_range(&self) -> bool {
        self.range.is_some()
    }

    pub fn has_order(&self) -> bool {
        !self.order.is_empty()
    }

    pub fn to_pairs(&self) -> Vec<(String, String)> {
        let mut pairs = Vec::new();
        if let Some(select) = &self.select {
            pairs.push(("select".to_string(), select.clone()));
        }
        pairs.extend(self.filters.iter().cloned());
        if !self.order.is_empty() {
            pairs.push(("order".to_string(), self.order.join(",")));
        }
        if let Some((from, to)) = self.range {
            pairs.push(("offset".to_string(), from.to_string()));
            let limit = to.saturating_sub(from).saturating_add(1);
            pairs.push(("limit".to_string(), limit.to_string()));
        }
        pairs
    }

    pub fn to_query_string(&self) -> String {
        self.to_pairs()
            .iter()
            .map(|(k, v)| format!("{}={}", urlencoding::encode(k), urlencoding::encode(v)))
            .collect::<Vec<_>>()
            .join("&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_search() {
        assert_eq!(sanitize_search(" a,b(c)\"d*e\\ "), "abcde");
        assert_eq!(sanitize_search("12345-6789-1"), "12345-6789-1");
        assert_eq!(sanitize_search("***"), "");
    }

    #[test]
    fn test_pairs_in_order() {
        let q = TableQuery::new()
            .select("id,amount")
            .gte("operation_date", "2025-08-19T00:00:00+03:00")
            .lt("operation_date", "2025-08-26T00:00:00+03:00")
            .eq("sku", 42)
            .is_not_null("product_name")
            .order("operation_date", SortOrder::Desc)
            .range(25, 49);
        let pairs = q.to_pairs();
        assert_eq!(pairs[0], ("select".into(), "id,amount".into()));
        assert_eq!(
            pairs[1],
            ("operation_date".into(), "gte.2025-08-19T00:00:00+03:00".into())
        );
        assert_eq!(pairs[3], ("sku".into(), "eq.42".into()));
        assert_eq!(pairs[4], ("product_name".into(), "not.is.null".into()));
        assert_eq!(pairs[5], ("order".into(), "operation_date.desc".into()));
        assert_eq!(pairs[6], ("offset".into(), "25".into()));
        assert_eq!(pairs[7], ("limit".into(), "25".into()));
    }

    #[test]
    fn test_range_at_usize_limit() {
        let q = TableQuery::new().range(usize::MAX, usize::MAX);
        let pairs = q.to_pairs();
        assert_eq!(pairs[0], ("offset".into(), usize::MAX.to_string()));
        assert_eq!(pairs[1], ("limit".into(), "1".into()));

        let q = TableQuery::new().range(0, usize::MAX);
        assert_eq!(q.to_pairs()[1], ("limit".into(), usize::MAX.to_string()));
    }

    #[test]
    fn test_or_ilike_strips_reserved() {
        let q = TableQuery::new().or_ilike(&["posting_number", "operation_type"], "(123)*");
        assert_eq!(
            q.to_pairs(),
            vec![(
                "or".to_string(),
                "(posting_number.ilike.*123*,operation_type.ilike.*123*)".to_string()
            )]
        );
        // пустой поиск фильтр не добавляет
        assert!(TableQuery::new().or_ilike(&["a"], " * ").to_pairs().is_empty());
    }

    #[test]
    fn test_query_string_is_encoded() {
        let q = TableQuery::new().gte("d", "2025-08-19T00:00:00+03:00");
        assert_eq!(q.to_query_string(), "d=gte.2025-08-19T00%3A00%3A00%2B03%3A00");
    }
}
