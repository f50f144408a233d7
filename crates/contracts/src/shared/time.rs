use chrono::{DateTime, Duration, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};

/// Смещение гражданского времени отчётов (Europe/Moscow, без перехода на летнее время)
pub const DEFAULT_UTC_OFFSET_HOURS: i32 = 3;

/// Формат дат в URL и запросах к базе
pub const DATE_FORMAT: &str = "%Y-%m-%d";

/// Формат дат для отображения пользователю
pub const DISPLAY_DATE_FORMAT: &str = "%d.%m.%Y";

/// Гражданская временная зона отчётов.
///
/// Все границы периода (from/to) трактуются как календарные даты в этой зоне.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CivilZone {
    offset: FixedOffset,
}

impl CivilZone {
    pub fn from_hours(hours: i32) -> Option<Self> {
        FixedOffset::east_opt(hours * 3600).map(|offset| Self { offset })
    }

    pub fn moscow() -> Self {
        Self::from_hours(DEFAULT_UTC_OFFSET_HOURS).unwrap_or(Self { offset: Utc.fix() })
    }

    pub fn offset(&self) -> FixedOffset {
        self.offset
    }

    /// Текущая календарная дата в зоне
    pub fn today(&self, now: DateTime<Utc>) -> NaiveDate {
        now.with_timezone(&self.offset).date_naive()
    }

    /// Начало суток (00:00) указанной даты в зоне
    pub fn day_start(&self, date: NaiveDate) -> DateTime<FixedOffset> {
        let midnight = date.and_time(NaiveTime::default());
        self.offset
            .from_local_datetime(&midnight)
            .single()
            .unwrap_or_else(|| self.offset.from_utc_datetime(&midnight))
    }

    /// Календарная дата момента времени в этой зоне
    pub fn date_of(&self, instant: DateTime<FixedOffset>) -> NaiveDate {
        instant.with_timezone(&self.offset).date_naive()
    }
}

impl Default for CivilZone {
    fn default() -> Self {
        Self::moscow()
    }
}

/// Период отчёта: календарные даты включительно
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub from: NaiveDate,
    pub to: NaiveDate,
}

impl DateRange {
    pub fn new(from: NaiveDate, to: NaiveDate) -> Self {
        Self { from, to }
    }

    /// Последние 7 дней, включая `anchor`
    pub fn trailing_week(anchor: NaiveDate) -> Self {
        Self {
            from: anchor - Duration::days(6),
            to: anchor,
        }
    }

    /// Количество дней в периоде (обе границы включены)
    pub fn days(&self) -> i64 {
        (self.to - self.from).num_days() + 1
    }

    pub fn is_single_day(&self) -> bool {
        self.from == self.to
    }

    /// Предыдущий период той же длины, заканчивающийся накануне `from`
    pub fn previous(&self) -> Self {
        let length = self.days().max(1);
        let prev_to = self.from - Duration::days(1);
        let prev_from = prev_to - Duration::days(length - 1);
        Self {
            from: prev_from,
            to: prev_to,
        }
    }

    /// Первый день после периода (исключающая верхняя граница)
    pub fn end_exclusive(&self) -> NaiveDate {
        self.to + Duration::days(1)
    }

    /// Полуинтервал моментов времени `[from 00:00, to+1 00:00)` в зоне
    pub fn instants(&self, zone: &CivilZone) -> (DateTime<FixedOffset>, DateTime<FixedOffset>) {
        (zone.day_start(self.from), zone.day_start(self.end_exclusive()))
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.from && date <= self.to
    }
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn parse_date(value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    // Допускаем полные метки времени: берём только дату
    let date_part = trimmed.get(..10).unwrap_or(trimmed);
    NaiveDate::parse_from_str(date_part, DATE_FORMAT).ok()
}

/// Календарная дата значения из базы в зоне отчётов.
///
/// Метки времени с часовым поясом переводятся в зону; "голые" даты и
/// метки без пояса считаются уже гражданскими.
pub fn civil_date(zone: &CivilZone, value: &str) -> Option<NaiveDate> {
    let trimmed = value.trim();
    if let Ok(instant) = DateTime::parse_from_rfc3339(trimmed) {
        return Some(zone.date_of(instant));
    }
    if let Ok(instant) = DateTime::parse_from_str(trimmed, "%Y-%m-%d %H:%M:%S%#z") {
        return Some(zone.date_of(instant));
    }
    parse_date(trimmed)
}

/// "dd.MM.yyyy - dd.MM.yyyy"
pub fn format_display_range(range: &DateRange) -> String {
    format!(
        "{} - {}",
        range.from.format(DISPLAY_DATE_FORMAT),
        range.to.format(DISPLAY_DATE_FORMAT)
    )
}
