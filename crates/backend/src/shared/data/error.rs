use reqwest::StatusCode;
use thiserror::Error;

use super::retry::ErrorRetryStrategy;

/// Ошибка обращения к хранилищу (REST-шлюз)
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("backend returned {status}: {body}")]
    Http { status: StatusCode, body: String },

    #[error("network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("failed to decode backend response: {0}")]
    Decode(String),

    #[error("backend misconfigured: {0}")]
    Config(String),
}

impl BackendError {
    /// Стратегия повтора для ошибки
    pub fn retry_strategy(&self) -> ErrorRetryStrategy {
        match self {
            // 5xx - хранилище временно недоступно
            BackendError::Http { status, .. } if status.is_server_error() => {
                ErrorRetryStrategy::Retry
            }
            // 4xx - некорректный запрос, повтор не поможет
            BackendError::Http { .. } => ErrorRetryStrategy::Fail,
            BackendError::Network(e) if e.is_decode() => ErrorRetryStrategy::Fail,
            BackendError::Network(_) => ErrorRetryStrategy::Retry,
            BackendError::Decode(_) => ErrorRetryStrategy::Fail,
            BackendError::Config(_) => ErrorRetryStrategy::Fail,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self.retry_strategy(), ErrorRetryStrategy::Retry)
    }

    pub fn status(&self) -> Option<StatusCode> {
        match self {
            BackendError::Http { status, .. } => Some(*status),
            BackendError::Network(e) => e.status(),
            _ => None,
        }
    }
}

impl From<serde_json::Error> for BackendError {
    fn from(e: serde_json::Error) -> Self {
        BackendError::Decode(e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retry_classification() {
        let server = BackendError::Http {
            status: StatusCode::SERVICE_UNAVAILABLE,
            body: String::new(),
        };
        assert!(server.is_retryable());

        let client = BackendError::Http {
            status: StatusCode::BAD_REQUEST,
            body: "column does not exist".into(),
        };
        assert!(!client.is_retryable());
        assert_eq!(client.status(), Some(StatusCode::BAD_REQUEST));

        assert!(!BackendError::Decode("eof".into()).is_retryable());
        assert!(!BackendError::Config("url".into()).is_retryable());
    }
}
