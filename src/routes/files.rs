//! File transfer endpoints
//!
//! - `POST /upload/` - store the multipart `file` field under its filename
//! - `GET /download/{filename}` - stream a stored file back (`/download/`
//!   with no name is a plain "File not found")
//! - `GET /list-files/` - names of everything in the upload directory

use axum::{
    body::Body,
    extract::{
        multipart::{Multipart, MultipartRejection},
        Path, State,
    },
    http::header,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::io;
use tokio_util::io::ReaderStream;
use tracing::info;

use crate::models::{AppState, FileListResponse, UploadResponse, UPLOAD_SUCCESS_MESSAGE};
use crate::types::{AppError, AppResult};

/// Multipart field carrying the uploaded file
pub const UPLOAD_FIELD: &str = "file";

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/upload/", post(upload_file))
        .route("/upload", post(upload_file))
        .route("/download/", get(download_without_name))
        .route("/download/{filename}", get(download_file))
        .route("/list-files/", get(list_files))
        .route("/list-files", get(list_files))
        .with_state(state)
}

async fn upload_file(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<UploadResponse>> {
    let mut multipart = multipart.map_err(|rejection| AppError::BadRequest(rejection.body_text()))?;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some(UPLOAD_FIELD) {
            continue;
        }

        let filename = field
            .file_name()
            .map(|s| s.to_string())
            .ok_or_else(|| AppError::BadRequest("uploaded file has no filename".to_string()))?;

        info!(filename = %filename, "File upload request received");

        // The whole file is buffered before anything touches the disk
        let contents = field.bytes().await?;
        state.storage.write(&filename, &contents).await?;

        info!(filename = %filename, bytes = contents.len(), "File uploaded");

        return Ok(Json(UploadResponse {
            filename,
            message: UPLOAD_SUCCESS_MESSAGE.to_string(),
        }));
    }

    Err(AppError::MissingField(UPLOAD_FIELD))
}

async fn download_file(
    State(state): State<AppState>,
    Path(filename): Path<String>,
) -> AppResult<Response> {
    let stored = state.storage.open(&filename).await?;

    let file = tokio::fs::File::open(&stored.path).await.map_err(|e| match e.kind() {
        io::ErrorKind::NotFound => AppError::NotFound,
        _ => AppError::Io(e),
    })?;

    info!(filename = %stored.name, bytes = stored.size, "Serving download");

    let headers = [
        (header::CONTENT_TYPE, mime::APPLICATION_OCTET_STREAM.to_string()),
        (header::CONTENT_LENGTH, stored.size.to_string()),
        (header::CONTENT_DISPOSITION, content_disposition(&stored.name)),
    ];

    Ok((headers, Body::from_stream(ReaderStream::new(file))).into_response())
}

async fn download_without_name() -> AppError {
    AppError::NotFound
}

async fn list_files(State(state): State<AppState>) -> AppResult<Json<FileListResponse>> {
    let files = state.storage.list().await?;
    Ok(Json(FileListResponse::new(files)))
}

/// `attachment` disposition suggesting `filename` as the save name.
///
/// ASCII names go in a quoted `filename`. Other names get an ASCII
/// `filename` fallback (non-ASCII characters replaced by `_`) followed by the
/// RFC 5987 `filename*` form, so the header stays ASCII.
fn content_disposition(filename: &str) -> String {
    if filename.is_ascii() {
        format!("attachment; filename=\"{}\"", quote(filename))
    } else {
        let fallback: String = filename
            .chars()
            .map(|c| if c.is_ascii() { c } else { '_' })
            .collect();
        format!(
            "attachment; filename=\"{}\"; filename*=utf-8''{}",
            quote(&fallback),
            percent_encode(filename)
        )
    }
}

fn quote(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

fn percent_encode(value: &str) -> String {
    let mut encoded = String::with_capacity(value.len() * 3);
    for byte in value.bytes() {
        match byte {
            b'A'..=b'Z'
            | b'a'..=b'z'
            | b'0'..=b'9'
            | b'!' | b'#' | b'$' | b'&' | b'+' | b'-' | b'.' | b'^' | b'_' | b'`' | b'|' | b'~' => {
                encoded.push(byte as char)
            }
            _ => encoded.push_str(&format!("%{:02X}", byte)),
        }
    }
    encoded
}
