use axum::extract::multipart::MultipartRejection;
use axum::extract::rejection::JsonRejection;
use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Map, Value};
use tracing::info;

use crate::data::entry::{fields_from_json, submit_record};
use crate::data::import::import_workbook;
use crate::data::record::Record;
use crate::data::store::CollectionStatus;
use crate::server::error::ApiError;
use crate::server::AppState;

/// Multipart field carrying the uploaded workbook.
pub const UPLOAD_FIELD: &str = "excelFile";

pub async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "statdash-api",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

pub async fn status(State(state): State<AppState>) -> Result<Json<Vec<CollectionStatus>>, ApiError> {
    let store = state.store.clone();
    let status = run_blocking(move || store.status()).await?;
    Ok(Json(status))
}

/// GET /api/{kind}: the whole collection as a JSON array.
pub async fn list<R: Record>(State(state): State<AppState>) -> Result<Json<Vec<R>>, ApiError> {
    let store = state.store.clone();
    let records = run_blocking(move || store.read_all::<R>()).await?;
    Ok(Json(records))
}

/// POST /api/{kind}: one manually entered record.
pub async fn submit<R: Record>(
    State(state): State<AppState>,
    body: Result<Json<Map<String, Value>>, JsonRejection>,
) -> Result<(StatusCode, Json<Value>), ApiError> {
    let Json(body) = body.map_err(|rejection| ApiError::BadRequest(rejection.body_text()))?;
    let fields = fields_from_json(&body);
    let store = state.store.clone();
    run_blocking(move || submit_record::<R>(&store, &fields)).await?;
    info!(kind = %R::KIND, "record added");
    Ok((
        StatusCode::CREATED,
        Json(json!({ "message": format!("{} data added successfully", R::KIND) })),
    ))
}

/// POST /api/upload: multipart workbook in the `excelFile` field.
pub async fn upload(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> Result<Json<Value>, ApiError> {
    let Ok(mut multipart) = multipart else {
        return Err(ApiError::NoFile);
    };

    let mut workbook = None;
    while let Some(field) = multipart.next_field().await? {
        if field.name() == Some(UPLOAD_FIELD) {
            workbook = Some(field.bytes().await?);
            break;
        }
    }
    let bytes = match workbook {
        Some(bytes) if !bytes.is_empty() => bytes,
        _ => return Err(ApiError::NoFile),
    };

    let store = state.store.clone();
    let report = run_blocking(move || import_workbook(&store, &bytes)).await?;
    info!(
        kinds = ?report.labels(),
        rows = report.total_rows,
        "workbook imported"
    );
    Ok(Json(json!({
        "message": format!("{} data imported successfully!", report.labels().join(", ")),
        "imported": report.labels(),
        "rows": report.total_rows,
        "sheets": report.imported,
    })))
}

/// DELETE /api/clear-data: resets every collection to empty.
pub async fn clear_data(State(state): State<AppState>) -> Result<Json<Value>, ApiError> {
    let store = state.store.clone();
    run_blocking(move || store.clear_all()).await?;
    info!("all collections cleared");
    Ok(Json(json!({ "message": "All data cleared successfully" })))
}

/// Runs synchronous store work off the async executor.
async fn run_blocking<T, E, F>(work: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, E> + Send + 'static,
    T: Send + 'static,
    E: Into<ApiError> + Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ApiError::Internal(err.to_string()))?
        .map_err(Into::into)
}
