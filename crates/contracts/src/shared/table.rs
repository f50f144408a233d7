use serde::{Deserialize, Serialize};

/// Допустимые размеры страницы
pub const PAGE_SIZES: [usize; 4] = [10, 20, 50, 100];

/// Номер страницы ограничен: смещение должно помещаться в запрос к хранилищу
pub const MAX_PAGE: usize = 1_000_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

impl SortOrder {
    pub fn as_str(&self) -> &'static str {
        match self {
            SortOrder::Asc => "asc",
            SortOrder::Desc => "desc",
        }
    }

    pub fn is_ascending(&self) -> bool {
        matches!(self, SortOrder::Asc)
    }

    pub fn toggled(&self) -> Self {
        match self {
            SortOrder::Asc => SortOrder::Desc,
            SortOrder::Desc => SortOrder::Asc,
        }
    }
}

/// Параметры таблицы из строки запроса (все необязательные)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableParams {
    #[serde(default)]
    pub page: Option<usize>,
    #[serde(default)]
    pub page_size: Option<usize>,
    #[serde(default)]
    pub search: Option<String>,
    #[serde(default)]
    pub sort_by: Option<String>,
    #[serde(default)]
    pub sort_order: Option<SortOrder>,
}

impl TableParams {
    /// Разбор из строки запроса; параметры фильтров в той же строке игнорируются
    pub fn from_query(query: &str) -> Result<Self, serde_qs::Error> {
        serde_qs::from_str(query.trim_start_matches('?'))
    }
}

/// Состояние табличного представления: страница, поиск, сортировка
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TableState {
    pub page: usize,
    pub page_size: usize,
    pub search: String,
    pub sort_by: String,
    pub sort_order: SortOrder,
}

impl TableState {
    /// Смещение первой строки страницы
    pub fn offset(&self) -> usize {
        self.page.saturating_mul(self.page_size)
    }

    /// Включительный диапазон строк `(from, to)` для запроса к хранилищу
    pub fn range(&self) -> (usize, usize) {
        let from = self.offset();
        (from, from.saturating_add(self.page_size.max(1) - 1))
    }

    pub fn total_pages(&self, total_count: usize) -> usize {
        if self.page_size == 0 {
            return 0;
        }
        total_count.div_ceil(self.page_size)
    }

    /// Номера первой и последней показанной строки ("Показано 21–40 из 95")
    pub fn visible_span(&self, total_count: usize) -> (usize, usize) {
        if total_count == 0 {
            return (0, 0);
        }
        let first = self.offset().saturating_add(1).min(total_count);
        let last = self.offset().saturating_add(self.page_size).min(total_count);
        (first, last)
    }

    /// Ключ для кэша запросов
    pub fn cache_key(&self) -> String {
        format!(
            "page={}&size={}&search={}&sort={}.{}",
            self.page,
            self.page_size,
            self.search,
            self.sort_by,
            self.sort_order.as_str()
        )
    }
}

/// Описание колонки: ключ сортировки, заголовок, отрисовка ячейки
pub struct Column<T> {
    pub key: &'static str,
    pub label: &'static str,
    pub sortable: bool,
    pub render: fn(&T) -> String,
}

impl<T> Clone for Column<T> {
    fn clone(&self) -> Self {
        Self {
            key: self.key,
            label: self.label,
            sortable: self.sortable,
            render: self.render,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ColumnHeader {
    pub key: String,
    pub label: String,
    pub sortable: bool,
}

/// Табличное представление поверх страницы строк из хранилища.
/// Сортировка, поиск и пагинация выполняются на стороне хранилища.
pub struct TableView<T> {
    pub columns: Vec<Column<T>>,
    pub default_sort: &'static str,
    pub default_order: SortOrder,
    pub default_page_size: usize,
}

impl<T> TableView<T> {
    pub fn default_state(&self) -> TableState {
        TableState {
            page: 0,
            page_size: self.default_page_size,
            search: String::new(),
            sort_by: self.default_sort.to_string(),
            sort_order: self.default_order,
        }
    }

    pub fn headers(&self) -> Vec<ColumnHeader> {
        self.columns
            .iter()
            .map(|c| ColumnHeader {
                key: c.key.to_string(),
                label: c.label.to_string(),
                sortable: c.sortable,
            })
            .collect()
    }

    pub fn is_sortable(&self, key: &str) -> bool {
        self.columns.iter().any(|c| c.key == key && c.sortable)
    }

    /// Ячейки строк в порядке колонок
    pub fn render_rows(&self, rows: &[T]) -> Vec<Vec<String>> {
        rows.iter()
            .map(|row| self.columns.iter().map(|c| (c.render)(row)).collect())
            .collect()
    }

    /// Клик по заголовку: та же колонка меняет направление,
    /// другая сортируется по возрастанию. Страница сбрасывается.
    pub fn toggle_sort(&self, state: &TableState, key: &str) -> TableState {
        if !self.is_sortable(key) {
            return state.clone();
        }
        let sort_order = if state.sort_by == key {
            state.sort_order.toggled()
        } else {
            SortOrder::Asc
        };
        TableState {
            page: 0,
            sort_by: key.to_string(),
            sort_order,
            ..state.clone()
        }
    }

    /// Приводит состояние к допустимому: неизвестная колонка сортировки и
    /// недопустимый размер страницы заменяются значениями по умолчанию.
    pub fn sanitize(&self, state: TableState) -> TableState {
        let (sort_by, sort_order) = if self.is_sortable(&state.sort_by) {
            (state.sort_by, state.sort_order)
        } else {
            (self.default_sort.to_string(), self.default_order)
        };
        let page_size = if PAGE_SIZES.contains(&state.page_size)
            || state.page_size == self.default_page_size
        {
            state.page_size
        } else {
            self.default_page_size
        };
        TableState {
            page: state.page.min(MAX_PAGE),
            page_size,
            search: state.search.trim().to_string(),
            sort_by,
            sort_order,
        }
    }

    pub fn state_from(&self, params: &TableParams) -> TableState {
        let defaults = self.default_state();
        let sort_by = params.sort_by.clone().unwrap_or(defaults.sort_by);
        // без явного направления колонка сортируется по умолчанию для представления
        let sort_order = params.sort_order.unwrap_or(defaults.sort_order);
        self.sanitize(TableState {
            page: params.page.unwrap_or(0),
            page_size: params.page_size.unwrap_or(defaults.page_size),
            search: params.search.clone().unwrap_or_default(),
            sort_by,
            sort_order,
        })
    }
}

/// Страница результатов с общим количеством строк
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TablePage<T> {
    pub items: Vec<T>,
    pub total_count: usize,
    pub total_pages: usize,
    pub page: usize,
    pub page_size: usize,
}

impl<T> TablePage<T> {
    pub fn new(items: Vec<T>, total_count: usize, state: &TableState) -> Self {
        Self {
            items,
            total_count,
            total_pages: state.total_pages(total_count),
            page: state.page,
            page_size: state.page_size,
        }
    }

    pub fn empty(state: &TableState) -> Self {
        Self::new(Vec::new(), 0, state)
    }

    pub fn has_more(&self) -> bool {
        self.page + 1 < self.total_pages
    }
}

/// Ответ табличного отчёта: состояние, заголовки и страница строк
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableResponse<T> {
    pub state: TableState,
    pub headers: Vec<ColumnHeader>,
    pub page: TablePage<T>,
    /// Первая и последняя показанная строка
    pub visible_from: usize,
    pub visible_to: usize,
}

impl<T> TableResponse<T> {
    pub fn new(view: &TableView<T>, state: TableState, page: TablePage<T>) -> Self {
        let (visible_from, visible_to) = state.visible_span(page.total_count);
        Self {
            headers: view.headers(),
            state,
            page,
            visible_from,
            visible_to,
        }
    }
}
