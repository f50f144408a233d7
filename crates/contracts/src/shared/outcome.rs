use serde::{Deserialize, Serialize};

/// Почему отчёт вернул значение по умолчанию
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EmptyReason {
    /// За период нет строк
    NoData,
    /// Запрос к хранилищу не удался; ошибка залогирована
    Unavailable,
}

/// Результат агрегирующего отчёта.
///
/// Отсутствие данных здесь штатная ситуация, поэтому оно выражено
/// вариантом, а не ошибкой: и в `Empty` всегда есть нулевое значение,
/// которое можно отрисовать.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ReportOutcome<T> {
    Data { value: T },
    Empty { value: T, reason: EmptyReason },
}

impl<T> ReportOutcome<T> {
    pub fn data(value: T) -> Self {
        ReportOutcome::Data { value }
    }

    pub fn value(&self) -> &T {
        match self {
            ReportOutcome::Data { value } | ReportOutcome::Empty { value, .. } => value,
        }
    }

    pub fn into_value(self) -> T {
        match self {
            ReportOutcome::Data { value } | ReportOutcome::Empty { value, .. } => value,
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, ReportOutcome::Empty { .. })
    }

    pub fn reason(&self) -> Option<EmptyReason> {
        match self {
            ReportOutcome::Data { .. } => None,
            ReportOutcome::Empty { reason, .. } => Some(*reason),
        }
    }

    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> ReportOutcome<U> {
        match self {
            ReportOutcome::Data { value } => ReportOutcome::Data { value: f(value) },
            ReportOutcome::Empty { value, reason } => ReportOutcome::Empty {
                value: f(value),
                reason,
            },
        }
    }
}

impl<T: Default> ReportOutcome<T> {
    pub fn no_data() -> Self {
        ReportOutcome::Empty {
            value: T::default(),
            reason: EmptyReason::NoData,
        }
    }

    pub fn unavailable() -> Self {
        ReportOutcome::Empty {
            value: T::default(),
            reason: EmptyReason::Unavailable,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
    struct Totals {
        revenue: f64,
    }

    #[test]
    fn test_outcome_serializes_with_status_tag() {
        let data = ReportOutcome::data(Totals { revenue: 10.0 });
        let json = serde_json::to_value(&data).unwrap();
        assert_eq!(json["status"], "data");
        assert_eq!(json["value"]["revenue"], 10.0);

        let empty: ReportOutcome<Totals> = ReportOutcome::unavailable();
        let json = serde_json::to_value(&empty).unwrap();
        assert_eq!(json["status"], "empty");
        assert_eq!(json["reason"], "unavailable");
        assert_eq!(json["value"]["revenue"], 0.0);
    }

    #[test]
    fn test_empty_still_carries_default_value() {
        let empty: ReportOutcome<Totals> = ReportOutcome::no_data();
        assert!(empty.is_empty());
        assert_eq!(empty.reason(), Some(EmptyReason::NoData));
        assert_eq!(empty.value().revenue, 0.0);
        let mapped = empty.map(|t| t.revenue + 1.0);
        assert_eq!(mapped.into_value(), 1.0);
    }
}
