use serde::Serialize;

use crate::domain::error::DomainError;

pub const MIN_DIMENSION: u32 = 200;
pub const MAX_DIMENSION: u32 = 4000;
pub const DEFAULT_DIMENSION: u32 = 1080;

/// Output size shared by every slide of a batch. Both sides are within
/// [`MIN_DIMENSION`, `MAX_DIMENSION`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct RenderDimensions {
    width: u32,
    height: u32,
}

impl RenderDimensions {
    pub fn new(width: i64, height: i64) -> Result<Self, DomainError> {
        let range = i64::from(MIN_DIMENSION)..=i64::from(MAX_DIMENSION);
        if !range.contains(&width) || !range.contains(&height) {
            return Err(DomainError::DimensionsOutOfRange {
                width,
                height,
                min: MIN_DIMENSION,
                max: MAX_DIMENSION,
            });
        }
        // 範囲チェック済みなので u32 に収まる
        Ok(Self {
            width: width as u32,
            height: height as u32,
        })
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }
}

impl Default for RenderDimensions {
    fn default() -> Self {
        Self {
            width: DEFAULT_DIMENSION,
            height: DEFAULT_DIMENSION,
        }
    }
}
