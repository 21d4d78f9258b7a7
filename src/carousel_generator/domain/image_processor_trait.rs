use crate::domain::dimensions::RenderDimensions;
use crate::domain::text_overlay::TextOverlay;
use crate::infrastructure::error::RenderError;

/// Turns a downloaded background plus a text overlay into the final slide image.
///
/// Implementations are CPU bound and synchronous; callers move them onto a blocking thread.
#[cfg_attr(test, mockall::automock)]
pub trait ImageProcessor: Send + Sync {
    /// Cover-fits `background` to `dimensions`, draws `overlay` on top unless it is empty, and
    /// returns the slide encoded as PNG.
    fn render_slide(
        &self,
        background: &[u8],
        overlay: &TextOverlay,
        dimensions: RenderDimensions,
    ) -> Result<Vec<u8>, RenderError>;
}
