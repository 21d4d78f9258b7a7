pub mod color;
pub mod dimensions;
pub mod error;
pub mod font_family;
pub mod image;
pub mod image_fetcher_trait;
pub mod image_processor_trait;
pub mod position;
pub mod slide;
pub mod text_overlay;
pub mod uploader_trait;
