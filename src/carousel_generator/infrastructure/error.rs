use std::time::Duration;

use thiserror::Error;

/// Failures while downloading a background image.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FetchError {
    #[error("Network error: {0}")]
    Network(String),

    #[error("Image download timed out after {}s", .0.as_secs_f32())]
    Timeout(Duration),

    #[error("Failed to download image: HTTP {status} {reason}")]
    HttpStatus { status: u16, reason: String },

    #[error("Invalid content type '{0}', expected image/*")]
    InvalidContentType(String),

    #[error("Image response body was empty")]
    EmptyResponse,

    #[error("Too many redirects (limit {max_redirects})")]
    RedirectLoop { max_redirects: u32 },

    #[error("Invalid image URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        FetchError::Network(err.to_string())
    }
}

/// Failures while decoding, resizing, compositing or encoding a slide.
#[derive(Error, Debug)]
pub enum RenderError {
    #[error("Image processing failed: {0}")]
    Image(#[from] image::ImageError),

    #[error("Overlay markup could not be parsed: {0}")]
    Svg(#[from] usvg::Error),

    #[error("Could not allocate a {width}x{height} overlay canvas")]
    Pixmap { width: u32, height: u32 },

    #[error("Render worker failed: {0}")]
    Worker(String),
}

/// Failures from the storage collaborator. Never affects the rendered slides.
#[derive(Error, Debug)]
pub enum UploadError {
    #[error("Upload request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Upload rejected ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("Upload task failed: {0}")]
    Task(String),
}
