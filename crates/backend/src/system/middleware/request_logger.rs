use axum::body::to_bytes;
use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;
use chrono::Utc;
use contracts::shared::format::format_number_dots;
use contracts::shared::time::CivilZone;

/// Middleware для логирования HTTP запросов
///
/// Пишет в лог время (МСК), длительность, размер ответа, статус,
/// метод и путь с параметрами.
pub async fn request_logger(req: Request<Body>, next: Next) -> Response {
    let start = std::time::Instant::now();
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let (parts, body) = response.into_parts();
    let timestamp = Utc::now().with_timezone(&CivilZone::moscow().offset());

    // Читаем тело ответа, чтобы узнать реальный размер
    let bytes = match to_bytes(body, usize::MAX).await {
        Ok(b) => b,
        Err(e) => {
            tracing::error!(
                "{} | {:>5}ms | {:>12} | {} {:>6} {} | body error: {}",
                timestamp.format("%H:%M:%S"),
                start.elapsed().as_millis(),
                "error",
                parts.status.as_u16(),
                method,
                uri,
                e
            );
            return Response::from_parts(parts, Body::default());
        }
    };

    let line = format!(
        "{} | {:>5}ms | {:>12} | {} {:>6} {}",
        timestamp.format("%H:%M:%S"),
        start.elapsed().as_millis(),
        format_number_dots(bytes.len()),
        parts.status.as_u16(),
        method,
        uri
    );
    if parts.status.is_server_error() {
        tracing::error!("{}", line);
    } else if parts.status.is_client_error() {
        tracing::warn!("{}", line);
    } else {
        tracing::info!("{}", line);
    }

    Response::from_parts(parts, Body::from(bytes))
}
