use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
};
use contracts::shared::table::TableView;

/// CSV по колонкам представления: строка заголовков, затем ячейки
pub fn to_csv<T>(view: &TableView<T>, rows: &[T]) -> anyhow::Result<String> {
    let mut writer = csv::WriterBuilder::new().from_writer(Vec::new());
    writer.write_record(view.columns.iter().map(|c| c.label))?;
    for record in view.render_rows(rows) {
        writer.write_record(&record)?;
    }
    let bytes = writer
        .into_inner()
        .map_err(|e| anyhow::anyhow!("csv writer: {}", e.error()))?;
    Ok(String::from_utf8(bytes)?)
}

/// Ответ с CSV-файлом для скачивания
pub fn csv_response(filename: &str, body: String) -> Response {
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{}\"", filename),
            ),
        ],
        body,
    )
        .into_response()
}
