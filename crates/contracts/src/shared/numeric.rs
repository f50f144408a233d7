use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Безопасное преобразование значения из базы в число.
///
/// `null`, NaN, бесконечность и нечисловые строки дают 0.
/// NaN никогда не попадает в суммы.
pub fn to_number(value: &Value) -> f64 {
    let parsed = match value {
        Value::Number(n) => n.as_f64().unwrap_or(0.0),
        Value::String(s) => s.trim().parse::<f64>().unwrap_or(0.0),
        _ => 0.0,
    };
    finite_or_zero(parsed)
}

pub fn finite_or_zero(value: f64) -> f64 {
    if value.is_finite() {
        value
    } else {
        0.0
    }
}

/// Числовое поле строки из базы.
///
/// Десериализуется из числа, числовой строки или `null`; всё
/// нераспознанное становится нулём. Единственная точка приведения типов
/// на границе с хранилищем.
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd)]
pub struct Numeric(pub f64);

impl Numeric {
    pub fn value(self) -> f64 {
        self.0
    }
}

impl From<f64> for Numeric {
    fn from(value: f64) -> Self {
        Self(finite_or_zero(value))
    }
}

impl<'de> Deserialize<'de> for Numeric {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = Value::deserialize(deserializer)?;
        Ok(Self(to_number(&raw)))
    }
}

impl Serialize for Numeric {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_f64(self.0)
    }
}

/// Целочисленный идентификатор (SKU и т.п.): число или числовая строка
pub fn de_opt_i64<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => n.as_i64().or_else(|| n.as_f64().map(|f| f as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    })
}

/// Ключ группировки (order_id и т.п.): число или строка, приведённые к строке
pub fn de_opt_key<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Value::deserialize(deserializer)?;
    Ok(match raw {
        Value::Number(n) => Some(n.to_string()),
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        _ => None,
    })
}

/// Доля `amount` от `total` в процентах, округлённая до целого.
/// Нулевой или некорректный итог даёт 0.
pub fn percentage(amount: f64, total: f64) -> i64 {
    if total == 0.0 || !total.is_finite() || !amount.is_finite() {
        return 0;
    }
    (amount / total * 100.0).round() as i64
}

/// Деление с защитой от нуля
pub fn ratio_or_zero(numerator: f64, denominator: f64) -> f64 {
    if denominator == 0.0 || !denominator.is_finite() {
        0.0
    } else {
        finite_or_zero(numerator / denominator)
    }
}

/// Чистая прибыль после налога: `net × (1 − rate)`
pub fn apply_tax(net_profit: f64, tax_rate: f64) -> f64 {
    finite_or_zero(net_profit * (1.0 - tax_rate))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Neutral,
}

/// Изменение показателя относительно предыдущего периода
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Change {
    pub value: f64,
    pub percentage: f64,
    pub trend: Trend,
}

pub fn calculate_change(current: f64, previous: f64) -> Change {
    let value = current - previous;
    let percentage = if previous == 0.0 {
        if current > 0.0 {
            100.0
        } else {
            0.0
        }
    } else {
        value / previous.abs() * 100.0
    };

    let trend = if value > 0.0 {
        Trend::Up
    } else if value < 0.0 {
        Trend::Down
    } else {
        Trend::Neutral
    };

    Change {
        value,
        percentage: finite_or_zero(percentage),
        trend,
    }
}
