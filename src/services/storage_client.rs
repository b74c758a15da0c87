// src/services/storage_client.rs
// DOCUMENTATION: HTTP client for the storage service
// PURPOSE: Forward gallery uploads to /api/storage/upload with the caller's token
// and remove them again when the image row cannot be recorded

use crate::errors::GalleryError;
use crate::models::StoredFile;
use reqwest::{multipart, Client};
use std::time::Duration;

/// Client for the storage service
#[derive(Clone)]
pub struct StorageClient {
    client: Client,
    base_url: String,
}

impl StorageClient {
    pub fn new(base_url: &str) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(30))
            .no_proxy()
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn upload_url(&self) -> String {
        format!("{}/api/storage/upload", self.base_url)
    }

    /// Send one file as the multipart field `image`
    pub async fn upload(
        &self,
        token: &str,
        filename: &str,
        content_type: &str,
        bytes: Vec<u8>,
    ) -> Result<StoredFile, GalleryError> {
        let part = multipart::Part::bytes(bytes)
            .file_name(filename.to_string())
            .mime_str(content_type)
            .map_err(|e| GalleryError::InvalidInput(format!("Invalid content type: {}", e)))?;
        let form = multipart::Form::new().part("image", part);

        log::debug!("Forwarding upload {} to {}", filename, self.upload_url());

        let response = self
            .client
            .post(self.upload_url())
            .bearer_auth(token)
            .multipart(form)
            .send()
            .await
            .map_err(|e| {
                log::error!("Storage service request failed: {}", e);
                GalleryError::UpstreamError(format!("Storage service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            let body: serde_json::Value = response.json().await.unwrap_or_default();
            let message = body
                .get("message")
                .and_then(|m| m.as_str())
                .unwrap_or("Storage service rejected the upload")
                .to_string();
            log::warn!("Storage service answered {}: {}", status, message);

            return Err(match status.as_u16() {
                400 | 413 | 415 => GalleryError::InvalidInput(message),
                401 => GalleryError::Unauthorized(message),
                403 => GalleryError::Forbidden(message),
                _ => GalleryError::UpstreamError(message),
            });
        }

        response.json::<StoredFile>().await.map_err(|e| {
            log::error!("Failed to parse storage response: {}", e);
            GalleryError::UpstreamError(format!("Invalid storage response: {}", e))
        })
    }

    /// Delete a stored file by the URL the upload returned
    pub async fn delete(&self, token: &str, file_url: &str) -> Result<(), GalleryError> {
        let url = format!("{}{}", self.base_url, file_url);

        let response = self
            .client
            .delete(&url)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| {
                log::error!("Storage delete request failed: {}", e);
                GalleryError::UpstreamError(format!("Storage service unreachable: {}", e))
            })?;

        let status = response.status();
        if !status.is_success() {
            log::warn!("Storage service refused to delete {}: {}", file_url, status);
            return Err(GalleryError::UpstreamError(format!(
                "Storage delete failed with status {}",
                status
            )));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_upload_url() {
        let client = StorageClient::new("http://storage:5003/");
        assert_eq!(client.upload_url(), "http://storage:5003/api/storage/upload");
    }

    #[actix_web::test]
    async fn test_delete_hits_stored_url() {
        use actix_web::{web, App, HttpRequest, HttpResponse, HttpServer};

        let server = HttpServer::new(|| {
            App::new().route(
                "/api/storage/uploads/{user_id}/{filename}",
                web::delete().to(|req: HttpRequest| async move {
                    match req.headers().get("authorization").and_then(|h| h.to_str().ok()) {
                        Some("Bearer tok") => HttpResponse::Ok().finish(),
                        _ => HttpResponse::Forbidden().finish(),
                    }
                }),
            )
        })
        .workers(1)
        .bind(("127.0.0.1", 0))
        .unwrap();
        let addr = server.addrs()[0];
        let handle = server.run();
        actix_web::rt::spawn(handle);

        let client = StorageClient::new(&format!("http://{}", addr));
        assert!(client.delete("tok", "/api/storage/uploads/u/a.png").await.is_ok());
        assert!(matches!(
            client.delete("other", "/api/storage/uploads/u/a.png").await,
            Err(GalleryError::UpstreamError(_))
        ));
    }
}
