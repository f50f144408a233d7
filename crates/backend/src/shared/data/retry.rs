use std::future::Future;

use super::error::BackendError;

/// Что делать с ошибкой при повторе запроса
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorRetryStrategy {
    /// Повторить запрос (ошибка сервера или сети)
    Retry,
    /// Ошибка постоянная (некорректный запрос), повтор не поможет
    Fail,
}

/// Выполняет запрос до `attempts` раз, пока ошибка считается временной.
/// Пауз между попытками нет.
pub async fn run_with_retry<T, F, Fut>(
    attempts: u32,
    label: &str,
    mut op: F,
) -> Result<T, BackendError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<T, BackendError>>,
{
    let attempts = attempts.max(1);
    let mut attempt = 1;
    loop {
        match op().await {
            Ok(value) => return Ok(value),
            Err(e) => {
                if attempt >= attempts || !e.is_retryable() {
                    if let Some(status) = e.status().filter(|s| s.is_client_error()) {
                        tracing::debug!("{}: not retried, backend answered {}", label, status);
                    }
                    return Err(e);
                }
                tracing::warn!(
                    "{}: attempt {}/{} failed, retrying: {}",
                    label,
                    attempt,
                    attempts,
                    e
                );
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn server_error() -> BackendError {
        BackendError::Http {
            status: StatusCode::BAD_GATEWAY,
            body: String::new(),
        }
    }

    #[tokio::test]
    async fn test_retries_transient_errors_until_success() {
        let calls = AtomicU32::new(0);
        let result = run_with_retry(3, "test", || async {
            let n = calls.fetch_add(1, Ordering::SeqCst);
            if n < 2 {
                Err(server_error())
            } else {
                Ok(n)
            }
        })
        .await;
        assert_eq!(result.unwrap(), 2);
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_gives_up_after_attempts() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_retry(3, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(server_error())
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn test_permanent_error_is_not_retried() {
        let calls = AtomicU32::new(0);
        let result: Result<(), _> = run_with_retry(3, "test", || async {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(BackendError::Http {
                status: StatusCode::NOT_FOUND,
                body: String::new(),
            })
        })
        .await;
        assert!(result.is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }
}
