//! Форматирование значений для отображения (локаль ru-RU)

/// Неразрывный пробел: разделитель групп разрядов в ru-RU
const GROUP_SEPARATOR: char = '\u{a0}';

/// Отображение отсутствующего значения
pub const MISSING: &str = "—";

fn group_digits(integer: u64) -> String {
    let s = integer.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push(GROUP_SEPARATOR);
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}

/// Число с заданным количеством знаков после запятой (лишние нули отбрасываются)
fn format_decimal(value: f64, max_fraction: usize) -> String {
    let factor = 10f64.powi(max_fraction as i32);
    let rounded = (value.abs() * factor).round() / factor;
    let integer = rounded.trunc() as u64;
    let fraction = ((rounded - rounded.trunc()) * factor).round() as u64;

    let negative = value < 0.0 && rounded != 0.0;
    let mut out = String::new();
    if negative {
        out.push('-');
    }
    out.push_str(&group_digits(integer));
    if fraction > 0 {
        let digits = format!("{:0width$}", fraction, width = max_fraction);
        out.push(',');
        out.push_str(digits.trim_end_matches('0'));
    }
    out
}

/// 1234567.4 → "1 234 567"
pub fn format_number(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    format_decimal(value, 0)
}

/// 1234.5 → "1 235 ₽"
pub fn format_currency(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    format!("{}{}₽", format_decimal(value, 0), GROUP_SEPARATOR)
}

pub fn format_optional_currency(value: Option<f64>) -> String {
    value.map(format_currency).unwrap_or_else(|| MISSING.to_string())
}

/// Сокращённая запись: 1 250 000 → "1,3 млн ₽"
pub fn format_compact_currency(value: f64) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let abs = value.abs();
    let (scaled, suffix) = if abs >= 1e9 {
        (value / 1e9, " млрд")
    } else if abs >= 1e6 {
        (value / 1e6, " млн")
    } else if abs >= 1e3 {
        (value / 1e3, " тыс.")
    } else {
        (value, "")
    };
    format!(
        "{}{}{}₽",
        format_decimal(scaled, 1),
        suffix.replace(' ', "\u{a0}"),
        GROUP_SEPARATOR
    )
}

/// Процент со знаком: 12.34 → "+12,3 %"
pub fn format_percentage(value: f64, show_sign: bool) -> String {
    if !value.is_finite() {
        return MISSING.to_string();
    }
    let body = format_decimal(value, 1);
    let signed = if show_sign && !body.starts_with('-') {
        format!("+{}", body)
    } else {
        body
    };
    format!("{}{}%", signed, GROUP_SEPARATOR)
}

/// Размер в байтах для логов: 1234567 → "1.234.567"
pub fn format_number_dots(n: usize) -> String {
    let s = n.to_string();
    let mut result = String::new();
    for (i, ch) in s.chars().rev().enumerate() {
        if i > 0 && i % 3 == 0 {
            result.push('.');
        }
        result.push(ch);
    }
    result.chars().rev().collect()
}
