use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION, CONTENT_RANGE};
use reqwest::{Method, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::Serialize;
use contracts::shared::table::SortOrder;
use serde_json::Value;

use super::error::BackendError;
use super::query::TableQuery;
use crate::shared::config::BackendConfig;

/// HTTP-клиент хранилища (REST-шлюз PostgREST/Supabase).
///
/// Таблицы: `{url}/rest/v1/{table}`, функции: `{url}/rest/v1/rpc/{name}`.
pub struct PostgrestClient {
    client: reqwest::Client,
    base_url: String,
    page_size: usize,
}

impl PostgrestClient {
    pub fn new(config: &BackendConfig) -> Result<Self, BackendError> {
        let base_url = config.url.trim().trim_end_matches('/').to_string();
        if base_url.is_empty() {
            return Err(BackendError::Config("backend url is empty".into()));
        }

        let mut headers = HeaderMap::new();
        headers.insert("apikey", header_value(&config.api_key)?);
        headers.insert(
            AUTHORIZATION,
            header_value(&format!("Bearer {}", config.api_key))?,
        );
        headers.insert("Accept-Profile", header_value(&config.schema)?);
        headers.insert("Content-Profile", header_value(&config.schema)?);

        let client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs.max(1)))
            .default_headers(headers)
            .build()?;

        Ok(Self {
            client,
            base_url,
            page_size: config.page_size.max(1),
        })
    }

    fn table_url(&self, table: &str, query: &TableQuery) -> String {
        let qs = query.to_query_string();
        if qs.is_empty() {
            format!("{}/rest/v1/{}", self.base_url, table)
        } else {
            format!("{}/rest/v1/{}?{}", self.base_url, table, qs)
        }
    }

    fn request(&self, method: Method, url: String) -> RequestBuilder {
        self.client.request(method, url)
    }

    /// Строки таблицы/представления по запросу
    pub async fn select<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .request(Method::GET, self.table_url(table, query))
            .send()
            .await?;
        let rows: Vec<T> = decode_rows(check(response).await?).await?;
        tracing::debug!("select {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    /// Все строки запроса порциями по `page_size`.
    /// Сервер ограничивает размер ответа, поэтому без порций хвост терялся бы.
    /// Порции по смещению стабильны только при заданном порядке: без `order`
    /// строки упорядочиваются по `id`.
    pub async fn select_all<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<Vec<T>, BackendError> {
        if query.has_range() {
            return self.select(table, query).await;
        }
        let query = if query.has_order() {
            query.clone()
        } else {
            tracing::warn!("select_all {} without order, falling back to id", table);
            query.clone().order("id", SortOrder::Asc)
        };

        let mut all = Vec::new();
        let mut offset = 0;
        loop {
            let chunk_query = query.clone().range(offset, offset + self.page_size - 1);
            let chunk: Vec<T> = self.select(table, &chunk_query).await?;
            let received = chunk.len();
            all.extend(chunk);
            if received < self.page_size {
                break;
            }
            offset += self.page_size;
        }
        Ok(all)
    }

    /// Страница строк и общее количество (`Prefer: count=exact`)
    pub async fn select_with_count<T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
    ) -> Result<(Vec<T>, usize), BackendError> {
        let response = self
            .request(Method::GET, self.table_url(table, query))
            .header("Prefer", "count=exact")
            .send()
            .await?;
        let response = check(response).await?;
        let total = response
            .headers()
            .get(CONTENT_RANGE)
            .and_then(|v| v.to_str().ok())
            .and_then(parse_content_range_total);
        let rows: Vec<T> = decode_rows(response).await?;
        let total = total.unwrap_or(rows.len());
        tracing::debug!("select {} -> {} rows of {}", table, rows.len(), total);
        Ok((rows, total))
    }

    /// Вызов функции хранилища. Функция может вернуть массив или один объект.
    pub async fn rpc<T: DeserializeOwned>(
        &self,
        function: &str,
        params: &Value,
    ) -> Result<Vec<T>, BackendError> {
        let url = format!("{}/rest/v1/rpc/{}", self.base_url, function);
        let response = self.request(Method::POST, url).json(params).send().await?;
        let body = check(response).await?.text().await?;
        let value: Value = serde_json::from_str(&body).map_err(|e| decode_error(e, &body))?;
        let rows: Vec<T> = match value {
            Value::Null => Vec::new(),
            Value::Array(items) => items
                .into_iter()
                .map(serde_json::from_value)
                .collect::<Result<_, _>>()?,
            single => vec![serde_json::from_value(single)?],
        };
        tracing::debug!("rpc {} -> {} rows", function, rows.len());
        Ok(rows)
    }

    /// Вставка или обновление по ключу уникальности
    pub async fn upsert<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        body: &B,
        on_conflict: &str,
    ) -> Result<Vec<T>, BackendError> {
        let url = format!(
            "{}/rest/v1/{}?on_conflict={}",
            self.base_url,
            table,
            urlencoding::encode(on_conflict)
        );
        let response = self
            .request(Method::POST, url)
            .header("Prefer", "resolution=merge-duplicates,return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<T> = decode_rows(check(response).await?).await?;
        tracing::debug!("upsert {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    /// Изменение строк, отобранных фильтрами запроса
    pub async fn update<B: Serialize + ?Sized, T: DeserializeOwned>(
        &self,
        table: &str,
        query: &TableQuery,
        body: &B,
    ) -> Result<Vec<T>, BackendError> {
        let response = self
            .request(Method::PATCH, self.table_url(table, query))
            .header("Prefer", "return=representation")
            .json(body)
            .send()
            .await?;
        let rows: Vec<T> = decode_rows(check(response).await?).await?;
        tracing::debug!("update {} -> {} rows", table, rows.len());
        Ok(rows)
    }

    pub async fn delete(&self, table: &str, query: &TableQuery) -> Result<(), BackendError> {
        let response = self
            .request(Method::DELETE, self.table_url(table, query))
            .send()
            .await?;
        check(response).await?;
        tracing::debug!("delete {}", table);
        Ok(())
    }
}

fn header_value(value: &str) -> Result<HeaderValue, BackendError> {
    HeaderValue::from_str(value.trim())
        .map_err(|e| BackendError::Config(format!("invalid header value: {}", e)))
}

/// Неуспешный статус превращается в `BackendError::Http` с телом ответа
async fn check(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    tracing::error!("Backend request failed with status {}: {}", status, body);
    Err(BackendError::Http { status, body })
}

async fn decode_rows<T: DeserializeOwned>(response: Response) -> Result<Vec<T>, BackendError> {
    let body = response.text().await?;
    if body.trim().is_empty() {
        return Ok(Vec::new());
    }
    serde_json::from_str::<Vec<T>>(&body).map_err(|e| decode_error(e, &body))
}

fn decode_error(e: serde_json::Error, body: &str) -> BackendError {
    let preview: String = body.chars().take(300).collect();
    tracing::error!("Failed to parse backend response: {}. Body: {}", e, preview);
    BackendError::Decode(format!("{} (body: {})", e, preview))
}

/// `0-24/95` → 95, `*/0` → 0
fn parse_content_range_total(value: &str) -> Option<usize> {
    value.rsplit('/').next()?.trim().parse().ok()
}
