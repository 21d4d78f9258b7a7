use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::Client;
use serde::Deserialize;
use serde_json::json;

use super::error::UploadError;
use crate::domain::uploader_trait::{SlideUploader, UploadRequest, UploadedFile};

pub const DRIVE_UPLOAD_URL: &str =
    "https://www.googleapis.com/upload/drive/v3/files?uploadType=multipart&fields=id,webViewLink,webContentLink";
const BOUNDARY: &str = "carousel-slide-boundary";

/// Stores slides in Google Drive with a caller-supplied OAuth access token.
pub struct DriveUploader {
    client: Client,
    endpoint: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DriveFile {
    id: String,
    web_view_link: Option<String>,
    web_content_link: Option<String>,
}

impl DriveUploader {
    pub fn new(endpoint: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            endpoint: endpoint.into(),
        }
    }

    // multipart/related: JSON メタデータ + PNG 本体
    fn multipart_body(request: &UploadRequest) -> Vec<u8> {
        let mut metadata = json!({ "name": request.filename, "mimeType": "image/png" });
        if let Some(folder) = &request.folder_id {
            metadata["parents"] = json!([folder]);
        }

        let mut body = Vec::with_capacity(request.image.len() + 512);
        body.extend_from_slice(
            format!("--{BOUNDARY}\r\nContent-Type: application/json; charset=UTF-8\r\n\r\n{metadata}\r\n")
                .as_bytes(),
        );
        body.extend_from_slice(format!("--{BOUNDARY}\r\nContent-Type: image/png\r\n\r\n").as_bytes());
        body.extend_from_slice(&request.image);
        body.extend_from_slice(format!("\r\n--{BOUNDARY}--\r\n").as_bytes());
        body
    }
}

#[async_trait]
impl SlideUploader for DriveUploader {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedFile, UploadError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header(AUTHORIZATION, format!("Bearer {}", request.credential))
            .header(CONTENT_TYPE, format!("multipart/related; boundary={BOUNDARY}"))
            .body(Self::multipart_body(&request))
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(UploadError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let file: DriveFile = response.json().await?;
        Ok(UploadedFile {
            remote_id: file.id,
            view_link: file.web_view_link,
            download_link: file.web_content_link,
        })
    }
}
