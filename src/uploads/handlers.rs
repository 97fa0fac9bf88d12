use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::post,
    Json, Router,
};
use serde::Serialize;
use tracing::{debug, info, instrument, warn};

use crate::{
    auth::extractors::AuthUser,
    error::AppError,
    state::AppState,
    uploads::services::{
        check_content_type, check_size, store_upload, IncomingFile, StoredFile,
        MAX_UPLOAD_BYTES, UPLOAD_FIELD,
    },
};

// headroom for multipart framing around a maximum-size file
const BODY_LIMIT: usize = MAX_UPLOAD_BYTES + 64 * 1024;

pub fn upload_routes() -> Router<AppState> {
    Router::new()
        .route("/upload", post(upload))
        .layer(DefaultBodyLimit::max(BODY_LIMIT))
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub message: &'static str,
    #[serde(flatten)]
    pub file: StoredFile,
}

fn multipart_error(e: axum::extract::multipart::MultipartError) -> AppError {
    warn!(error = %e, "multipart rejected");
    AppError::validation(format!("Upload error: {}", e.body_text()))
}

/// Accepts exactly one image under the `file` field.
#[instrument(skip(state, mp))]
pub async fn upload(
    State(state): State<AppState>,
    AuthUser(claims): AuthUser,
    mut mp: Multipart,
) -> Result<(StatusCode, Json<UploadResponse>), AppError> {
    let mut file: Option<IncomingFile> = None;

    while let Some(field) = mp.next_field().await.map_err(multipart_error)? {
        let is_file = field.file_name().is_some();
        if field.name() != Some(UPLOAD_FIELD) {
            if is_file {
                return Err(AppError::validation("Upload error: Unexpected field"));
            }
            continue;
        }
        // a plain text value under the file field name is not an upload
        if !is_file {
            debug!("skipping non-file part named {UPLOAD_FIELD}");
            continue;
        }
        if file.is_some() {
            return Err(AppError::validation("Upload error: Unexpected field"));
        }

        let content_type = check_content_type(field.content_type())?.to_string();
        let original_name = field.file_name().map(str::to_string);
        let body = field.bytes().await.map_err(multipart_error)?;
        check_size(body.len())?;

        file = Some(IncomingFile {
            original_name,
            content_type,
            body,
        });
    }

    let file = file.ok_or_else(|| AppError::validation("No file selected."))?;
    let stored = store_upload(state.storage.as_ref(), file).await?;
    info!(username = %claims.username, filename = %stored.filename, "upload accepted");

    Ok((
        StatusCode::CREATED,
        Json(UploadResponse {
            message: "File uploaded successfully!",
            file: stored,
        }),
    ))
}
