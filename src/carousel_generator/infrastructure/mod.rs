pub mod axum_handler;
pub mod drive_uploader;
pub mod error;
pub mod external_image_fetcher;
pub mod image_processor;
pub mod rate_limiter;
pub mod telemetry;

#[cfg(test)]
pub(crate) mod test_support;
