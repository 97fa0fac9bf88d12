use std::path::Path;

use anyhow::Context;
use bytes::Bytes;
use rand::Rng;
use serde::Serialize;
use time::OffsetDateTime;
use tracing::info;

use crate::{error::AppError, storage::StorageClient};

pub const UPLOAD_FIELD: &str = "file";
pub const MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;
pub const ALLOWED_CONTENT_TYPES: [&str; 3] = ["image/jpeg", "image/png", "image/gif"];
const UPLOAD_PREFIX: &str = "upload";

/// A single file taken from a multipart request.
#[derive(Debug)]
pub struct IncomingFile {
    pub original_name: Option<String>,
    pub content_type: String,
    pub body: Bytes,
}

#[derive(Debug, Serialize)]
pub struct StoredFile {
    pub filename: String,
    pub path: String,
}

pub fn check_content_type(content_type: Option<&str>) -> Result<&str, AppError> {
    match content_type {
        Some(ct) if ALLOWED_CONTENT_TYPES.contains(&ct) => Ok(ct),
        _ => Err(AppError::validation(
            "Invalid file type. Only JPEG, PNG or GIF are allowed.",
        )),
    }
}

pub fn check_size(len: usize) -> Result<(), AppError> {
    if len > MAX_UPLOAD_BYTES {
        return Err(AppError::validation("File too large (max 5 MB)"));
    }
    Ok(())
}

/// `<unix millis>-<random below 10^9><original extension>`.
pub fn unique_name(original_name: Option<&str>, now: OffsetDateTime, rng: &mut impl Rng) -> String {
    let millis = now.unix_timestamp_nanos() / 1_000_000;
    let suffix: u32 = rng.gen_range(0..1_000_000_000);
    let ext = original_name
        .and_then(|n| Path::new(n).extension())
        .and_then(|e| e.to_str())
        .map(|e| format!(".{e}"))
        .unwrap_or_default();
    format!("{millis}-{suffix}{ext}")
}

pub async fn store_upload(
    storage: &dyn StorageClient,
    file: IncomingFile,
) -> Result<StoredFile, AppError> {
    let filename = unique_name(
        file.original_name.as_deref(),
        OffsetDateTime::now_utc(),
        &mut rand::thread_rng(),
    );
    let key = format!("{UPLOAD_PREFIX}/{filename}");
    let size = file.body.len();
    let path = storage
        .put_object(&key, file.body, &file.content_type)
        .await
        .with_context(|| format!("store upload {key}"))?;
    info!(%filename, %path, size, content_type = %file.content_type, "file uploaded");
    Ok(StoredFile { filename, path })
}
