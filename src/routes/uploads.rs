use std::path::Path as FsPath;

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::Json;
use chrono::Utc;
use serde_json::json;

use crate::auth::extractor::AuthUser;
use crate::error::AppError;
use crate::middleware::audit;
use crate::state::SharedState;

const ALLOWED_TYPES: &[&str] = &[
    "image/jpeg",
    "image/jpg",
    "image/png",
    "image/gif",
    "image/webp",
    "application/pdf",
];

/// Multipart upload. The first file part is stored under the public
/// uploads directory with a collision-proof generated name.
pub async fn upload(
    auth: AuthUser,
    State(state): State<SharedState>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<serde_json::Value>, AppError> {
    let boundary = headers
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .and_then(|ct| multer::parse_boundary(ct).ok())
        .ok_or_else(|| AppError::BadRequest("Expected multipart/form-data".to_string()))?;

    let stream = futures_util::stream::once(async { Ok::<_, std::io::Error>(body) });
    let mut multipart = multer::Multipart::new(stream, boundary);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::BadRequest(format!("Multipart error: {e}")))?
    {
        let Some(original_name) = field.file_name().map(|s| s.to_string()) else {
            continue;
        };

        let content_type = field
            .content_type()
            .map(|m| m.to_string())
            .unwrap_or_default();
        if !ALLOWED_TYPES.contains(&content_type.as_str()) {
            return Err(AppError::BadRequest(
                "Invalid file type. Only JPEG, PNG, GIF, WebP and PDF are allowed".to_string(),
            ));
        }

        let data = field
            .bytes()
            .await
            .map_err(|e| AppError::BadRequest(format!("Field read error: {e}")))?;

        if data.len() > state.config.max_upload_size {
            return Err(AppError::BadRequest(format!(
                "File too large. Maximum size is {}MB",
                state.config.max_upload_size / (1024 * 1024)
            )));
        }
        if data.is_empty() {
            return Err(AppError::BadRequest("Empty file".to_string()));
        }

        let file_name = generate_file_name(&original_name);
        let dir = FsPath::new(&state.config.upload_dir);
        tokio::fs::create_dir_all(dir)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to create upload dir: {e}")))?;
        tokio::fs::write(dir.join(&file_name), &data)
            .await
            .map_err(|e| AppError::Internal(format!("Failed to store upload: {e}")))?;

        audit::log_event(
            &state.pool,
            Some(auth.user_id),
            "upload.created",
            "upload",
            None,
            Some(json!({ "file_name": file_name, "size": data.len() })),
        )
        .await;

        return Ok(Json(json!({
            "success": true,
            "url": format!("/uploads/{file_name}"),
            "file_name": file_name,
            "size": data.len(),
            "type": content_type,
        })));
    }

    Err(AppError::BadRequest("No file field in request".to_string()))
}

pub async fn delete(
    auth: AuthUser,
    State(state): State<SharedState>,
    Path(file_name): Path<String>,
) -> Result<Json<serde_json::Value>, AppError> {
    if !is_safe_file_name(&file_name) {
        return Err(AppError::BadRequest("Invalid file name".to_string()));
    }

    let path = FsPath::new(&state.config.upload_dir).join(&file_name);
    match tokio::fs::remove_file(&path).await {
        Ok(()) => {
            audit::log_event(
                &state.pool,
                Some(auth.user_id),
                "upload.deleted",
                "upload",
                None,
                Some(json!({ "file_name": file_name })),
            )
            .await;
            Ok(Json(json!({ "success": true })))
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            Err(AppError::NotFound("File not found".to_string()))
        }
        Err(e) => Err(AppError::Internal(format!("Failed to delete file: {e}"))),
    }
}

fn generate_file_name(original: &str) -> String {
    let ext: String = original
        .rsplit('.')
        .next()
        .unwrap_or("bin")
        .chars()
        .filter(|c| c.is_ascii_alphanumeric())
        .take(8)
        .collect::<String>()
        .to_lowercase();
    let ext = if ext.is_empty() { "bin".to_string() } else { ext };
    let suffix: [u8; 6] = rand::random();
    format!(
        "{}-{}.{}",
        Utc::now().timestamp_millis(),
        hex::encode(suffix),
        ext
    )
}

fn is_safe_file_name(name: &str) -> bool {
    !name.is_empty()
        && !name.contains('/')
        && !name.contains('\\')
        && !name.contains("..")
        && name.len() <= 255
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_names_keep_extension() {
        let name = generate_file_name("photo.JPEG");
        assert!(name.ends_with(".jpeg"));
    }

    #[test]
    fn traversal_names_are_rejected() {
        assert!(!is_safe_file_name("../etc/passwd"));
        assert!(!is_safe_file_name("a/b.png"));
        assert!(!is_safe_file_name(""));
        assert!(is_safe_file_name("1722400000-abc123.png"));
    }
}
