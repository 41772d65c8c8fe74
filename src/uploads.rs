//! Multipart form reading and image storage for admin item forms.

use std::{collections::HashMap, path::Path};

use axum::{body::Bytes, extract::Multipart};
use uuid::Uuid;

use crate::error::{AppError, AppResult};

/// Public URL prefix the upload directory is served under.
pub const UPLOADS_URL_PREFIX: &str = "/static/uploads";

#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Bytes,
}

/// Text fields plus the `image` file of a multipart body.
#[derive(Debug, Default)]
pub struct MultipartForm {
    fields: HashMap<String, String>,
    pub file: Option<UploadedFile>,
}

impl MultipartForm {
    pub async fn read(mut multipart: Multipart) -> AppResult<Self> {
        let mut form = Self::default();
        while let Some(field) = multipart
            .next_field()
            .await
            .map_err(|e| AppError::BadRequest(e.body_text()))?
        {
            let name = field.name().unwrap_or_default().to_string();
            if name == "image" {
                let file_name = field.file_name().unwrap_or_default().to_string();
                let bytes = field
                    .bytes()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                if !bytes.is_empty() {
                    form.file = Some(UploadedFile { file_name, bytes });
                }
            } else {
                let value = field
                    .text()
                    .await
                    .map_err(|e| AppError::BadRequest(e.body_text()))?;
                form.fields.insert(name, value);
            }
        }
        Ok(form)
    }

    pub fn required(&mut self, name: &str) -> AppResult<String> {
        self.optional(name)
            .ok_or_else(|| AppError::BadRequest(format!("{name} is required")))
    }

    /// Blank values count as absent.
    pub fn optional(&mut self, name: &str) -> Option<String> {
        self.fields
            .remove(name)
            .map(|value| value.trim().to_string())
            .filter(|value| !value.is_empty())
    }
}

/// Write the file under `dir` and return the URL it is served at.
pub async fn save_image(dir: &Path, file: &UploadedFile) -> AppResult<String> {
    let stored_name = format!(
        "{}-{}",
        Uuid::new_v4().simple(),
        sanitize_file_name(&file.file_name)
    );
    tokio::fs::create_dir_all(dir)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tokio::fs::write(dir.join(&stored_name), &file.bytes)
        .await
        .map_err(|e| AppError::Internal(e.into()))?;
    tracing::debug!(file = %stored_name, size = file.bytes.len(), "image stored");
    Ok(format!("{UPLOADS_URL_PREFIX}/{stored_name}"))
}

/// Remove a file written by [`save_image`] after the row that would have
/// referenced it failed to persist.
pub async fn discard_image(dir: &Path, url: &str) {
    let Some(stored_name) = url
        .strip_prefix(UPLOADS_URL_PREFIX)
        .map(|rest| rest.trim_start_matches('/'))
        .filter(|name| !name.is_empty() && !name.contains(['/', '\\']))
    else {
        return;
    };
    if let Err(err) = tokio::fs::remove_file(dir.join(stored_name)).await {
        tracing::warn!(file = %stored_name, error = %err, "failed to remove orphaned image");
    }
}

/// Keep only the final path component and a conservative character set.
fn sanitize_file_name(raw: &str) -> String {
    let base = raw.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .filter(|c| c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_'))
        .collect();
    let cleaned = cleaned.trim_start_matches('.');
    if cleaned.is_empty() {
        "image".to_string()
    } else {
        cleaned.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_directories_and_odd_characters() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("C:\\photos\\my cat.png"), "mycat.png");
        assert_eq!(sanitize_file_name(".hidden"), "hidden");
        assert_eq!(sanitize_file_name(""), "image");
        assert_eq!(sanitize_file_name("///"), "image");
    }

    #[tokio::test]
    async fn saved_image_is_served_under_uploads_prefix() {
        let dir = std::env::temp_dir().join(format!("storefront-upload-{}", Uuid::new_v4()));
        let file = UploadedFile {
            file_name: "shirt.png".into(),
            bytes: Bytes::from_static(b"png-bytes"),
        };

        let url = save_image(&dir, &file).await.unwrap();
        assert!(url.starts_with("/static/uploads/"));
        assert!(url.ends_with("-shirt.png"));

        let stored = url.trim_start_matches("/static/uploads/");
        let contents = tokio::fs::read(dir.join(stored)).await.unwrap();
        assert_eq!(contents, b"png-bytes");
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }

    #[tokio::test]
    async fn discarded_image_leaves_nothing_behind() {
        let dir = std::env::temp_dir().join(format!("storefront-upload-{}", Uuid::new_v4()));
        let file = UploadedFile {
            file_name: "mug.jpg".into(),
            bytes: Bytes::from_static(b"jpg-bytes"),
        };

        let url = save_image(&dir, &file).await.unwrap();
        discard_image(&dir, &url).await;

        let mut entries = tokio::fs::read_dir(&dir).await.unwrap();
        assert!(entries.next_entry().await.unwrap().is_none());

        // urls outside the upload prefix are ignored
        discard_image(&dir, "/etc/passwd").await;
        let _ = tokio::fs::remove_dir_all(&dir).await;
    }
}
