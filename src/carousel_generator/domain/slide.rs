use base64::Engine;
use bytes::Bytes;
use serde::{Deserialize, Serialize};

use crate::domain::dimensions::RenderDimensions;

/// Caller-supplied text for one slide.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideSpec {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub subtitle: Option<String>,
    #[serde(default)]
    pub text_color: Option<String>,
    #[serde(default)]
    pub font_family: Option<String>,
}

/// Outcome of one slide. Exactly one exists per input index.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SlideResult {
    pub success: bool,
    pub filename: String,
    /// `data:image/png;base64,...`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base64: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Raw PNG kept for the upload step so it does not have to decode the data URI again.
    #[serde(skip)]
    pub png: Option<Bytes>,
}

impl SlideResult {
    pub fn rendered(index: usize, png: Vec<u8>) -> Self {
        let encoded = base64::engine::general_purpose::STANDARD.encode(&png);
        Self {
            success: true,
            filename: slide_filename(index),
            base64: Some(format!("data:image/png;base64,{encoded}")),
            error: None,
            png: Some(Bytes::from(png)),
        }
    }

    pub fn failed(index: usize, error: impl Into<String>) -> Self {
        Self {
            success: false,
            filename: slide_filename(index),
            base64: None,
            error: Some(error.into()),
            png: None,
        }
    }
}

/// `slide-<index + 1>`
pub fn slide_filename(index: usize) -> String {
    format!("slide-{}", index + 1)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BatchStats {
    pub total_slides: usize,
    pub successful: usize,
    pub failed: usize,
    pub generation_time_ms: u128,
    pub dimensions: RenderDimensions,
}

/// Per-slide outcome of the optional upload step.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UploadResult {
    pub success: bool,
    pub filename: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub remote_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub view_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub download_link: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}
