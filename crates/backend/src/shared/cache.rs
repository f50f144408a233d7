use std::any::Any;
use std::collections::HashMap;
use std::future::Future;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use crate::shared::config::CacheConfig;

struct Entry {
    value: Arc<dyn Any + Send + Sync>,
    stored_at: Instant,
}

type Slot = Arc<tokio::sync::Mutex<Option<Entry>>>;

/// Кэш результатов запросов к хранилищу.
///
/// Ключ: имя запроса + каноническая строка фильтров/таблицы. Свежая запись
/// (моложе `stale`) отдаётся без запроса; на один ключ одновременно идёт не
/// более одного запроса, остальные ждут его результата. Ошибки не кэшируются.
pub struct QueryCache {
    slots: Mutex<HashMap<String, Slot>>,
    stale: Duration,
    gc: Duration,
}

impl QueryCache {
    pub fn new(stale: Duration, gc: Duration) -> Self {
        Self {
            slots: Mutex::new(HashMap::new()),
            stale,
            gc: gc.max(stale),
        }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(
            Duration::from_secs(config.stale_secs),
            Duration::from_secs(config.gc_secs),
        )
    }

    /// `"d410_sales_metrics::from=...&to=..."`
    pub fn key(name: &str, parts: &str) -> String {
        format!("{}::{}", name, parts)
    }

    fn slot(&self, key: &str) -> Slot {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        slots.entry(key.to_string()).or_default().clone()
    }

    pub async fn get_or_fetch<T, E, F, Fut>(&self, key: &str, fetch: F) -> Result<T, E>
    where
        T: Clone + Send + Sync + 'static,
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let slot = self.slot(key);
        // Замок слота держится на время запроса: параллельные вызовы ждут здесь
        let mut guard = slot.lock().await;

        if let Some(entry) = guard.as_ref() {
            if entry.stored_at.elapsed() < self.stale {
                if let Some(value) = entry.value.downcast_ref::<T>() {
                    tracing::debug!("cache hit: {}", key);
                    return Ok(value.clone());
                }
            }
        }

        tracing::debug!("cache miss: {}", key);
        let value = fetch().await?;
        *guard = Some(Entry {
            value: Arc::new(value.clone()),
            stored_at: Instant::now(),
        });
        Ok(value)
    }

    /// Сбрасывает все записи запросов с префиксом (после изменения данных)
    pub fn invalidate_prefix(&self, prefix: &str) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        slots.retain(|key, _| !key.starts_with(prefix));
        let removed = before - slots.len();
        if removed > 0 {
            tracing::debug!("cache invalidated {} entries with prefix {}", removed, prefix);
        }
        removed
    }

    /// Удаляет записи старше `gc` и пустые слоты. Занятые запросом слоты не трогает.
    pub fn sweep(&self) -> usize {
        let mut slots = self.slots.lock().unwrap_or_else(|e| e.into_inner());
        let before = slots.len();
        let gc = self.gc;
        slots.retain(|_, slot| match slot.try_lock() {
            Ok(guard) => guard
                .as_ref()
                .map(|entry| entry.stored_at.elapsed() < gc)
                .unwrap_or(false),
            Err(_) => true,
        });
        before - slots.len()
    }

    pub fn len(&self) -> usize {
        self.slots.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    pub fn spawn_sweeper(self: Arc<Self>, every: Duration) -> tokio::task::JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(every.max(Duration::from_secs(1)));
            loop {
                interval.tick().await;
                let removed = self.sweep();
                if removed > 0 {
                    tracing::debug!(
                        "cache sweep removed {} entries, {} left",
                        removed,
                        self.len()
                    );
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn cache() -> QueryCache {
        QueryCache::new(Duration::from_secs(300), Duration::from_secs(600))
    }

    #[tokio::test]
    async fn test_fresh_value_is_served_without_fetch() {
        let cache = cache();
        let calls = AtomicUsize::new(0);
        for _ in 0..3 {
            let value: Result<i32, ()> = cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(42)
                })
                .await;
            assert_eq!(value, Ok(42));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_stale_value_is_refetched() {
        let cache = QueryCache::new(Duration::ZERO, Duration::from_secs(600));
        let calls = AtomicUsize::new(0);
        for _ in 0..2 {
            let _: Result<i32, ()> = cache
                .get_or_fetch("k", || async {
                    calls.fetch_add(1, Ordering::SeqCst);
                    Ok(1)
                })
                .await;
        }
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_errors_are_not_cached() {
        let cache = cache();
        let failed: Result<i32, &str> = cache.get_or_fetch("k", || async { Err("down") }).await;
        assert_eq!(failed, Err("down"));
        let ok: Result<i32, &str> = cache.get_or_fetch("k", || async { Ok(5) }).await;
        assert_eq!(ok, Ok(5));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_fetch() {
        let cache = Arc::new(cache());
        let calls = Arc::new(AtomicUsize::new(0));

        let mut handles = Vec::new();
        for _ in 0..5 {
            let cache = cache.clone();
            let calls = calls.clone();
            handles.push(tokio::spawn(async move {
                cache
                    .get_or_fetch("shared", || async {
                        calls.fetch_add(1, Ordering::SeqCst);
                        tokio::time::sleep(Duration::from_millis(20)).await;
                        Ok::<_, ()>(String::from("value"))
                    })
                    .await
            }));
        }
        for handle in handles {
            assert_eq!(handle.await.unwrap(), Ok("value".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_invalidate_prefix_and_sweep() {
        let cache = QueryCache::new(Duration::from_secs(300), Duration::ZERO);
        let _: Result<i32, ()> = cache
            .get_or_fetch(&QueryCache::key("a025_costs", "all"), || async { Ok(1) })
            .await;
        let _: Result<i32, ()> = cache
            .get_or_fetch(&QueryCache::key("d410_sales", "q"), || async { Ok(2) })
            .await;
        assert_eq!(cache.len(), 2);

        assert_eq!(cache.invalidate_prefix("a025_"), 1);
        assert_eq!(cache.len(), 1);

        // gc не может быть меньше stale, поэтому запись ещё жива
        assert_eq!(cache.sweep(), 0);

        let expiring = QueryCache::new(Duration::ZERO, Duration::ZERO);
        let _: Result<i32, ()> = expiring.get_or_fetch("x", || async { Ok(3) }).await;
        assert_eq!(expiring.sweep(), 1);
        assert_eq!(expiring.len(), 0);
    }
}
