use std::sync::Arc;

use chrono::{NaiveDate, Utc};
use contracts::shared::time::CivilZone;

use crate::shared::cache::QueryCache;
use crate::shared::config::{Config, ReportingConfig};
use crate::shared::data::PostgrestClient;

/// Параметры расчёта отчётов
#[derive(Debug, Clone)]
pub struct ReportingSettings {
    pub tax_rate: f64,
    pub zone: CivilZone,
    /// Фиксированная "сегодняшняя" дата; без неё берётся текущая дата в зоне
    pub anchor: Option<NaiveDate>,
    pub retry_attempts: u32,
}

impl ReportingSettings {
    pub fn from_config(reporting: &ReportingConfig, retry_attempts: u32) -> anyhow::Result<Self> {
        let zone = CivilZone::from_hours(reporting.utc_offset_hours).ok_or_else(|| {
            anyhow::anyhow!("Invalid utc_offset_hours: {}", reporting.utc_offset_hours)
        })?;
        Ok(Self {
            tax_rate: reporting.tax_rate,
            zone,
            anchor: reporting.anchor_date,
            retry_attempts: retry_attempts.max(1),
        })
    }

    pub fn anchor_date(&self) -> NaiveDate {
        self.anchor.unwrap_or_else(|| self.zone.today(Utc::now()))
    }
}

impl Default for ReportingSettings {
    fn default() -> Self {
        Self {
            tax_rate: 0.06,
            zone: CivilZone::moscow(),
            anchor: None,
            retry_attempts: 3,
        }
    }
}

#[derive(Clone)]
pub struct AppState {
    pub client: Arc<PostgrestClient>,
    pub cache: Arc<QueryCache>,
    pub settings: Arc<ReportingSettings>,
}

impl AppState {
    pub fn new(client: PostgrestClient, cache: QueryCache, settings: ReportingSettings) -> Self {
        Self {
            client: Arc::new(client),
            cache: Arc::new(cache),
            settings: Arc::new(settings),
        }
    }

    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let client = PostgrestClient::new(&config.backend)?;
        let cache = QueryCache::from_config(&config.cache);
        let settings = ReportingSettings::from_config(&config.reporting, config.cache.retry_attempts)?;
        Ok(Self::new(client, cache, settings))
    }
}
