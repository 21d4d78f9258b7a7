use async_trait::async_trait;
use bytes::Bytes;

use crate::infrastructure::error::UploadError;

/// Everything a storage provider needs to store one rendered slide.
#[derive(Debug, Clone, PartialEq)]
pub struct UploadRequest {
    pub image: Bytes,
    pub filename: String,
    pub credential: String,
    pub folder_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadedFile {
    pub remote_id: String,
    pub view_link: Option<String>,
    pub download_link: Option<String>,
}

/// Pluggable third-party storage for finished slides.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SlideUploader: Send + Sync {
    async fn upload(&self, request: UploadRequest) -> Result<UploadedFile, UploadError>;
}
