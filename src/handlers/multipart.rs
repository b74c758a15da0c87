// src/handlers/multipart.rs
// DOCUMENTATION: Multipart form reading shared by upload endpoints

use crate::errors::GalleryError;
use crate::services::IncomingFile;
use actix_multipart::Multipart;
use futures_util::StreamExt;

/// Form field carrying the uploaded file
pub const IMAGE_FIELD: &str = "image";

/// Read the `image` field, enforcing the byte limit while streaming.
/// Other fields are drained and ignored.
pub async fn read_image_field(
    mut payload: Multipart,
    max_bytes: usize,
) -> Result<IncomingFile, GalleryError> {
    let mut found: Option<IncomingFile> = None;

    while let Some(item) = payload.next().await {
        let mut field = item.map_err(|e| GalleryError::InvalidInput(format!("Invalid multipart body: {}", e)))?;

        let (name, filename) = match field.content_disposition() {
            Some(cd) => (
                cd.get_name().unwrap_or_default().to_string(),
                cd.get_filename().map(str::to_string),
            ),
            None => (String::new(), None),
        };
        let content_type = field
            .content_type()
            .map(|m| m.essence_str().to_string())
            .unwrap_or_default();

        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            let chunk = chunk.map_err(|e| GalleryError::InvalidInput(format!("Upload interrupted: {}", e)))?;
            if name == IMAGE_FIELD && bytes.len() + chunk.len() > max_bytes {
                return Err(GalleryError::InvalidInput(format!(
                    "File too large (max {} bytes)",
                    max_bytes
                )));
            }
            if name == IMAGE_FIELD {
                bytes.extend_from_slice(&chunk);
            }
        }

        if name == IMAGE_FIELD && found.is_none() {
            found = Some(IncomingFile {
                filename: filename.unwrap_or_else(|| "upload".to_string()),
                content_type,
                bytes,
            });
        }
    }

    found.ok_or_else(|| GalleryError::InvalidInput("No file uploaded".to_string()))
}
