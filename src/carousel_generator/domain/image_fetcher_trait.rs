use async_trait::async_trait;

use crate::domain::image::FetchedImage;
use crate::infrastructure::error::FetchError;

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError>;
}
