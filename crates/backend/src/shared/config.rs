use chrono::NaiveDate;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub backend: BackendConfig,
    #[serde(default)]
    pub reporting: ReportingConfig,
    #[serde(default)]
    pub cache: CacheConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Подключение к хранилищу (REST-шлюз Supabase/PostgREST)
#[derive(Debug, Deserialize, Clone)]
pub struct BackendConfig {
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_schema")]
    pub schema: String,
    /// Размер порции при выборке всех строк (ограничение max-rows на сервере)
    #[serde(default = "default_page_size")]
    pub page_size: usize,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ReportingConfig {
    #[serde(default = "default_tax_rate")]
    pub tax_rate: f64,
    /// Фиксированная "текущая" дата для окна по умолчанию
    #[serde(default)]
    pub anchor_date: Option<NaiveDate>,
    #[serde(default = "default_utc_offset_hours")]
    pub utc_offset_hours: i32,
}

#[derive(Debug, Deserialize, Clone)]
pub struct CacheConfig {
    #[serde(default = "default_stale_secs")]
    pub stale_secs: u64,
    #[serde(default = "default_gc_secs")]
    pub gc_secs: u64,
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,
}

fn default_host() -> String {
    "0.0.0.0".to_string()
}
fn default_port() -> u16 {
    3000
}
fn default_timeout_secs() -> u64 {
    30
}
fn default_schema() -> String {
    "public".to_string()
}
fn default_page_size() -> usize {
    1000
}
fn default_tax_rate() -> f64 {
    0.06
}
fn default_utc_offset_hours() -> i32 {
    contracts::shared::time::DEFAULT_UTC_OFFSET_HOURS
}
fn default_stale_secs() -> u64 {
    300
}
fn default_gc_secs() -> u64 {
    600
}
fn default_retry_attempts() -> u32 {
    3
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            api_key: String::new(),
            timeout_secs: default_timeout_secs(),
            schema: default_schema(),
            page_size: default_page_size(),
        }
    }
}

impl Default for ReportingConfig {
    fn default() -> Self {
        Self {
            tax_rate: default_tax_rate(),
            anchor_date: None,
            utc_offset_hours: default_utc_offset_hours(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            stale_secs: default_stale_secs(),
            gc_secs: default_gc_secs(),
            retry_attempts: default_retry_attempts(),
        }
    }
}

/// Default configuration embedded in the binary
const DEFAULT_CONFIG: &str = r#"
[server]
host = "0.0.0.0"
port = 3000

[backend]
# url и api_key обычно задаются через SUPABASE_URL / SUPABASE_ANON_KEY
url = ""
api_key = ""
timeout_secs = 30
schema = "public"
page_size = 1000

[reporting]
tax_rate = 0.06
anchor_date = 2025-08-25
utc_offset_hours = 3

[cache]
stale_secs = 300
gc_secs = 600
retry_attempts = 3
"#;

pub const ENV_BACKEND_URL: &str = "SUPABASE_URL";
pub const ENV_BACKEND_KEY: &str = "SUPABASE_ANON_KEY";

/// Load configuration from config.toml file
///
/// Search order:
/// 1. Next to the executable (for production)
/// 2. Falls back to embedded default config
///
/// Затем применяются переменные окружения и проверяются обязательные поля.
pub fn load_config() -> anyhow::Result<Config> {
    let mut config = read_config_file()?;
    apply_env_overrides(&mut config, |name| std::env::var(name).ok());
    validate(&config)?;
    Ok(config)
}

fn read_config_file() -> anyhow::Result<Config> {
    // Try to find config.toml next to the executable
    if let Ok(exe_path) = std::env::current_exe() {
        if let Some(exe_dir) = exe_path.parent() {
            let config_path = exe_dir.join("config.toml");

            if config_path.exists() {
                tracing::info!("Loading config from: {}", config_path.display());
                let contents = std::fs::read_to_string(&config_path)?;
                let config: Config = toml::from_str(&contents)?;
                return Ok(config);
            } else {
                tracing::warn!("config.toml not found at: {}", config_path.display());
            }
        }
    }

    // Fall back to default config
    tracing::info!("Using default embedded configuration");
    let config: Config = toml::from_str(DEFAULT_CONFIG)?;
    Ok(config)
}

/// Переменные окружения имеют приоритет над файлом
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup(ENV_BACKEND_URL).filter(|v| !v.trim().is_empty()) {
        config.backend.url = url.trim().to_string();
    }
    if let Some(key) = lookup(ENV_BACKEND_KEY).filter(|v| !v.trim().is_empty()) {
        config.backend.api_key = key.trim().to_string();
    }
}

pub fn validate(config: &Config) -> anyhow::Result<()> {
    if config.backend.url.trim().is_empty() || config.backend.api_key.trim().is_empty() {
        anyhow::bail!(
            "Missing Supabase environment variables ({} / {})",
            ENV_BACKEND_URL,
            ENV_BACKEND_KEY
        );
    }
    if !(0.0..1.0).contains(&config.reporting.tax_rate) {
        anyhow::bail!("reporting.tax_rate must be in [0, 1): {}", config.reporting.tax_rate);
    }
    if config.reporting.utc_offset_hours.abs() > 14 {
        anyhow::bail!(
            "reporting.utc_offset_hours is out of range: {}",
            config.reporting.utc_offset_hours
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_loads() {
        let config: Result<Config, _> = toml::from_str(DEFAULT_CONFIG);
        assert!(config.is_ok());
        let config = config.unwrap();
        assert_eq!(config.server.port, 3000);
        assert_eq!(config.reporting.tax_rate, 0.06);
        assert_eq!(
            config.reporting.anchor_date,
            NaiveDate::from_ymd_opt(2025, 8, 25)
        );
        assert_eq!(config.cache.stale_secs, 300);
        assert_eq!(config.cache.retry_attempts, 3);
    }

    #[test]
    fn test_missing_sections_use_defaults() {
        let config: Config = toml::from_str("[backend]\nurl = \"http://localhost\"\n").unwrap();
        assert_eq!(config.backend.schema, "public");
        assert_eq!(config.backend.page_size, 1000);
        assert_eq!(config.reporting.utc_offset_hours, 3);
        assert_eq!(config.cache.gc_secs, 600);
        assert!(config.reporting.anchor_date.is_none());
    }

    #[test]
    fn test_env_overrides_and_validation() {
        let mut config: Config = toml::from_str(DEFAULT_CONFIG).unwrap();
        assert!(validate(&config).is_err());

        apply_env_overrides(&mut config, |name| match name {
            ENV_BACKEND_URL => Some("https://project.supabase.co".to_string()),
            ENV_BACKEND_KEY => Some("anon-key".to_string()),
            _ => None,
        });
        assert_eq!(config.backend.url, "https://project.supabase.co");
        assert!(validate(&config).is_ok());

        // пустая переменная не затирает значение из файла
        apply_env_overrides(&mut config, |_| Some("  ".to_string()));
        assert_eq!(config.backend.api_key, "anon-key");
    }
}
