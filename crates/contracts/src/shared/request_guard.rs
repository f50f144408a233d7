/// Отсечение устаревших ответов.
///
/// Каждый запрос получает билет с номером и ключом фильтров. Ответ
/// принимается, только если его билет последний и ключ совпадает с
/// текущими фильтрами; ответы на вытесненные запросы отбрасываются.
/// Отмены запросов нет: они просто дорабатывают.
#[derive(Debug, Default)]
pub struct RequestGuard {
    latest: u64,
    current_key: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Ticket {
    seq: u64,
    key: String,
}

impl Ticket {
    pub fn key(&self) -> &str {
        &self.key
    }
}

impl RequestGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Новый запрос для ключа; все ранее выданные билеты устаревают
    pub fn begin(&mut self, key: impl Into<String>) -> Ticket {
        self.latest += 1;
        let key = key.into();
        self.current_key = Some(key.clone());
        Ticket {
            seq: self.latest,
            key,
        }
    }

    /// Фильтры изменились без нового запроса (например, ответ взят из кэша)
    pub fn observe(&mut self, key: impl Into<String>) {
        self.current_key = Some(key.into());
    }

    pub fn accept(&self, ticket: &Ticket) -> bool {
        ticket.seq == self.latest && self.current_key.as_deref() == Some(ticket.key.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_latest_ticket_is_accepted() {
        let mut guard = RequestGuard::new();
        let first = guard.begin("from=2025-08-19&to=2025-08-25");
        let second = guard.begin("from=2025-08-01&to=2025-08-25");
        assert!(!guard.accept(&first));
        assert!(guard.accept(&second));
    }

    #[test]
    fn test_key_change_discards_response() {
        let mut guard = RequestGuard::new();
        let ticket = guard.begin("sku=1");
        guard.observe("sku=2");
        assert!(!guard.accept(&ticket));
        guard.observe("sku=1");
        assert!(guard.accept(&ticket));
    }
}
