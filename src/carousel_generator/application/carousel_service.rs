use std::sync::Arc;
use std::time::Instant;

use futures::future::join_all;
use tracing::{debug, info, warn};

use super::error::{ApplicationError, SlideError};
use crate::domain::dimensions::RenderDimensions;
use crate::domain::error::DomainError;
use crate::domain::image_fetcher_trait::ImageFetcher;
use crate::domain::image_processor_trait::ImageProcessor;
use crate::domain::slide::{BatchStats, SlideResult, SlideSpec, UploadResult};
use crate::domain::text_overlay::TextOverlay;
use crate::domain::uploader_trait::{SlideUploader, UploadRequest};
use crate::infrastructure::error::{RenderError, UploadError};

/// One carousel to render: `backgrounds[i]` is paired with `slides[i]`.
#[derive(Debug, Clone, PartialEq)]
pub struct BatchRequest {
    pub backgrounds: Vec<String>,
    pub slides: Vec<SlideSpec>,
    pub width: i64,
    pub height: i64,
    pub upload: Option<UploadTarget>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct UploadTarget {
    pub credential: String,
    pub folder_id: Option<String>,
}

impl BatchRequest {
    /// Checks the whole request up front; no slide work starts unless this passes.
    pub fn validate(&self) -> Result<RenderDimensions, DomainError> {
        if self.backgrounds.is_empty() {
            return Err(DomainError::EmptyBackgrounds);
        }
        if self.slides.is_empty() {
            return Err(DomainError::EmptySlides);
        }
        if self.backgrounds.len() != self.slides.len() {
            return Err(DomainError::LengthMismatch {
                backgrounds: self.backgrounds.len(),
                slides: self.slides.len(),
            });
        }
        RenderDimensions::new(self.width, self.height)
    }
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub successful: Vec<SlideResult>,
    pub failed: Vec<SlideResult>,
    pub upload_results: Vec<UploadResult>,
    pub stats: BatchStats,
}

pub struct CarouselService {
    fetcher: Arc<dyn ImageFetcher>,
    image_processor: Arc<dyn ImageProcessor>,
    uploader: Option<Arc<dyn SlideUploader>>,
}

impl CarouselService {
    pub fn new(fetcher: Arc<dyn ImageFetcher>, image_processor: Arc<dyn ImageProcessor>) -> Self {
        Self {
            fetcher,
            image_processor,
            uploader: None,
        }
    }

    pub fn with_uploader(mut self, uploader: Arc<dyn SlideUploader>) -> Self {
        self.uploader = Some(uploader);
        self
    }

    /// Renders every slide concurrently and waits for all of them. A failing slide is
    /// recorded in `failed` and never affects the others.
    pub async fn run_batch(&self, request: BatchRequest) -> Result<BatchOutcome, ApplicationError> {
        let dimensions = request.validate()?;
        let BatchRequest {
            backgrounds,
            slides,
            upload,
            ..
        } = request;
        let total_slides = backgrounds.len();
        info!(
            slides = total_slides,
            width = dimensions.width(),
            height = dimensions.height(),
            "generating carousel"
        );

        let started = Instant::now();
        let tasks: Vec<_> = backgrounds
            .into_iter()
            .zip(slides)
            .enumerate()
            .map(|(index, (background, spec))| {
                tokio::spawn(generate_slide(
                    Arc::clone(&self.fetcher),
                    Arc::clone(&self.image_processor),
                    background,
                    spec,
                    dimensions,
                    index,
                ))
            })
            .collect();

        // join_all は入力順に結果を返す。完了順には依存しない
        let results: Vec<SlideResult> = join_all(tasks)
            .await
            .into_iter()
            .enumerate()
            .map(|(index, joined)| {
                joined.unwrap_or_else(|err| {
                    warn!(slide = index + 1, error = %err, "slide task aborted");
                    SlideResult::failed(index, RenderError::Worker(err.to_string()).to_string())
                })
            })
            .collect();
        let generation_time = started.elapsed();

        let (successful, failed): (Vec<_>, Vec<_>) = results.into_iter().partition(|r| r.success);
        let stats = BatchStats {
            total_slides,
            successful: successful.len(),
            failed: failed.len(),
            generation_time_ms: generation_time.as_millis(),
            dimensions,
        };
        info!(
            total = stats.total_slides,
            successful = stats.successful,
            failed = stats.failed,
            elapsed_ms = stats.generation_time_ms,
            "carousel generated"
        );

        let upload_results = match (upload, &self.uploader) {
            (Some(target), Some(uploader)) if !successful.is_empty() => {
                upload_slides(Arc::clone(uploader), &target, &successful).await
            }
            (Some(_), None) => {
                warn!("upload requested but no uploader is configured");
                Vec::new()
            }
            _ => Vec::new(),
        };

        Ok(BatchOutcome {
            successful,
            failed,
            upload_results,
            stats,
        })
    }
}

async fn generate_slide(
    fetcher: Arc<dyn ImageFetcher>,
    image_processor: Arc<dyn ImageProcessor>,
    background: String,
    spec: SlideSpec,
    dimensions: RenderDimensions,
    index: usize,
) -> SlideResult {
    match render_one(fetcher.as_ref(), image_processor, &background, &spec, dimensions).await {
        Ok(png) => SlideResult::rendered(index, png),
        Err(err) => {
            warn!(slide = index + 1, error = %err, "slide generation failed");
            SlideResult::failed(index, err.to_string())
        }
    }
}

async fn render_one(
    fetcher: &dyn ImageFetcher,
    image_processor: Arc<dyn ImageProcessor>,
    background: &str,
    spec: &SlideSpec,
    dimensions: RenderDimensions,
) -> Result<Vec<u8>, SlideError> {
    let image = fetcher.fetch(background).await?;
    debug!(bytes = image.len(), content_type = %image.content_type, "background fetched");

    let overlay = TextOverlay::from_slide(spec, dimensions);
    let png = tokio::task::spawn_blocking(move || {
        image_processor.render_slide(&image.data, &overlay, dimensions)
    })
    .await
    .map_err(|err| RenderError::Worker(err.to_string()))??;
    Ok(png)
}

async fn upload_slides(
    uploader: Arc<dyn SlideUploader>,
    target: &UploadTarget,
    slides: &[SlideResult],
) -> Vec<UploadResult> {
    let tasks: Vec<_> = slides
        .iter()
        .map(|slide| {
            let uploader = Arc::clone(&uploader);
            let request = UploadRequest {
                image: slide.png.clone().unwrap_or_default(),
                filename: slide.filename.clone(),
                credential: target.credential.clone(),
                folder_id: target.folder_id.clone(),
            };
            tokio::spawn(async move { uploader.upload(request).await })
        })
        .collect();

    join_all(tasks)
        .await
        .into_iter()
        .zip(slides)
        .map(|(joined, slide)| {
            let outcome = joined.unwrap_or_else(|err| Err(UploadError::Task(err.to_string())));
            match outcome {
                Ok(file) => UploadResult {
                    success: true,
                    filename: slide.filename.clone(),
                    remote_id: Some(file.remote_id),
                    view_link: file.view_link,
                    download_link: file.download_link,
                    error: None,
                },
                Err(err) => {
                    warn!(filename = %slide.filename, error = %err, "slide upload failed");
                    UploadResult {
                        success: false,
                        filename: slide.filename.clone(),
                        remote_id: None,
                        view_link: None,
                        download_link: None,
                        error: Some(err.to_string()),
                    }
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::image::FetchedImage;
    use crate::domain::image_fetcher_trait::MockImageFetcher;
    use crate::domain::image_processor_trait::MockImageProcessor;
    use crate::domain::text_overlay::TextRole;
    use crate::domain::uploader_trait::{MockSlideUploader, UploadedFile};
    use crate::infrastructure::error::FetchError;
    use async_trait::async_trait;
    use std::time::Duration;

    fn titled(title: &str) -> SlideSpec {
        SlideSpec {
            title: Some(title.to_string()),
            ..SlideSpec::default()
        }
    }

    fn request(backgrounds: &[&str], slides: Vec<SlideSpec>) -> BatchRequest {
        BatchRequest {
            backgrounds: backgrounds.iter().map(|s| s.to_string()).collect(),
            slides,
            width: 1080,
            height: 1080,
            upload: None,
        }
    }

    fn fetcher_ok() -> MockImageFetcher {
        let mut fetcher = MockImageFetcher::new();
        fetcher
            .expect_fetch()
            .returning(|_| Ok(FetchedImage::new(vec![1, 2, 3], "image/jpeg")));
        fetcher
    }

    fn processor_ok() -> MockImageProcessor {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_render_slide()
            .returning(|_, _, _| Ok(vec![0x89, b'P', b'N', b'G']));
        processor
    }

    fn service(fetcher: MockImageFetcher, processor: MockImageProcessor) -> CarouselService {
        CarouselService::new(Arc::new(fetcher), Arc::new(processor))
    }

    #[tokio::test]
    async fn single_titled_slide_renders_centered_title() {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_render_slide()
            .withf(|background, overlay, dims| {
                background.to_vec() == vec![1u8, 2, 3]
                    && overlay.blocks.len() == 1
                    && overlay.blocks[0].role == TextRole::Title
                    && overlay.blocks[0].position.y == 540.0
                    && dims.width() == 1080
            })
            .times(1)
            .returning(|_, _, _| Ok(vec![7, 7]));

        let outcome = service(fetcher_ok(), processor)
            .run_batch(request(&["https://x/a.jpg"], vec![titled("Hello")]))
            .await
            .unwrap();

        assert_eq!(outcome.successful.len(), 1);
        assert!(outcome.failed.is_empty());
        assert_eq!(outcome.successful[0].filename, "slide-1");
        assert_eq!(
            outcome.successful[0].base64.as_deref(),
            Some("data:image/png;base64,Bwc=")
        );
        assert_eq!(outcome.stats.total_slides, 1);
        assert_eq!(outcome.stats.successful, 1);
    }

    #[tokio::test]
    async fn empty_batch_is_rejected_before_any_fetch() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().never();

        let err = service(fetcher, MockImageProcessor::new())
            .run_batch(request(&[], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Validation(DomainError::EmptyBackgrounds)
        ));
    }

    #[tokio::test]
    async fn mismatched_lengths_and_bad_dimensions_are_rejected() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().never();
        let svc = service(fetcher, MockImageProcessor::new());

        let err = svc
            .run_batch(request(&["a", "b"], vec![titled("x")]))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Validation(DomainError::LengthMismatch { backgrounds: 2, slides: 1 })
        ));

        let err = svc
            .run_batch(request(&["a"], vec![]))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(DomainError::EmptySlides)));

        let mut too_small = request(&["a"], vec![titled("x")]);
        too_small.width = 199;
        let err = svc.run_batch(too_small).await.unwrap_err();
        assert!(matches!(
            err,
            ApplicationError::Validation(DomainError::DimensionsOutOfRange { .. })
        ));
    }

    #[tokio::test]
    async fn boundary_dimensions_are_accepted() {
        let svc = service(fetcher_ok(), processor_ok());
        for (w, h) in [(200, 200), (4000, 4000)] {
            let mut req = request(&["a"], vec![titled("x")]);
            req.width = w;
            req.height = h;
            let outcome = svc.run_batch(req).await.unwrap();
            assert_eq!(outcome.stats.dimensions, RenderDimensions::new(w, h).unwrap());
        }
    }

    #[tokio::test]
    async fn one_missing_background_fails_only_its_slide() {
        let mut fetcher = MockImageFetcher::new();
        fetcher.expect_fetch().returning(|url| {
            if url.ends_with("missing.jpg") {
                Err(FetchError::HttpStatus {
                    status: 404,
                    reason: "Not Found".to_string(),
                })
            } else {
                Ok(FetchedImage::new(vec![1], "image/png"))
            }
        });

        let outcome = service(fetcher, processor_ok())
            .run_batch(request(
                &["https://x/missing.jpg", "https://x/ok.jpg"],
                vec![titled("a"), titled("b")],
            ))
            .await
            .unwrap();

        assert_eq!(outcome.stats.successful, 1);
        assert_eq!(outcome.stats.failed, 1);
        assert_eq!(outcome.failed[0].filename, "slide-1");
        assert!(outcome.failed[0].error.as_deref().unwrap().contains("HTTP 404"));
        assert_eq!(outcome.successful[0].filename, "slide-2");
        assert_eq!(
            outcome.successful.len() + outcome.failed.len(),
            outcome.stats.total_slides
        );
    }

    #[tokio::test]
    async fn render_failure_is_recorded_per_slide() {
        let mut processor = MockImageProcessor::new();
        processor.expect_render_slide().returning(|_, overlay, _| {
            if overlay.blocks.iter().any(|b| b.text == "broken") {
                Err(RenderError::Worker("decoder exploded".to_string()))
            } else {
                Ok(vec![1])
            }
        });

        let outcome = service(fetcher_ok(), processor)
            .run_batch(request(
                &["a", "b", "c"],
                vec![titled("fine"), titled("broken"), titled("fine too")],
            ))
            .await
            .unwrap();

        let ok: Vec<_> = outcome.successful.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(ok, ["slide-1", "slide-3"]);
        assert_eq!(outcome.failed[0].filename, "slide-2");
        assert_eq!(
            outcome.failed[0].error.as_deref(),
            Some("Render worker failed: decoder exploded")
        );
    }

    #[tokio::test]
    async fn text_less_slides_get_an_empty_overlay() {
        let mut processor = MockImageProcessor::new();
        processor
            .expect_render_slide()
            .withf(|_, overlay, _| overlay.is_empty())
            .times(1)
            .returning(|_, _, _| Ok(vec![1]));

        let outcome = service(fetcher_ok(), processor)
            .run_batch(request(&["a"], vec![SlideSpec::default()]))
            .await
            .unwrap();
        assert_eq!(outcome.successful.len(), 1);
    }

    /// Finishes earlier slides last so completion order is the reverse of input order.
    struct ReverseOrderFetcher;

    #[async_trait]
    impl ImageFetcher for ReverseOrderFetcher {
        async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
            let index: u64 = url.parse().unwrap();
            tokio::time::sleep(Duration::from_millis(200 - index * 40)).await;
            if index % 2 == 1 {
                return Err(FetchError::EmptyResponse);
            }
            Ok(FetchedImage::new(vec![index as u8], "image/png"))
        }
    }

    #[tokio::test]
    async fn results_keep_input_order_regardless_of_completion_order() {
        let svc = CarouselService::new(Arc::new(ReverseOrderFetcher), Arc::new(processor_ok()));
        let outcome = svc
            .run_batch(request(
                &["0", "1", "2", "3", "4"],
                (0..5).map(|i| titled(&i.to_string())).collect(),
            ))
            .await
            .unwrap();

        let ok: Vec<_> = outcome.successful.iter().map(|s| s.filename.as_str()).collect();
        let failed: Vec<_> = outcome.failed.iter().map(|s| s.filename.as_str()).collect();
        assert_eq!(ok, ["slide-1", "slide-3", "slide-5"]);
        assert_eq!(failed, ["slide-2", "slide-4"]);
    }

    #[tokio::test]
    async fn uploads_successful_slides_and_reports_each_outcome() {
        let mut uploader = MockSlideUploader::new();
        uploader
            .expect_upload()
            .withf(|req| req.credential == "token" && req.folder_id.as_deref() == Some("folder"))
            .times(2)
            .returning(|req| {
                if req.filename == "slide-1" {
                    Ok(UploadedFile {
                        remote_id: "id-1".to_string(),
                        view_link: Some("view".to_string()),
                        download_link: None,
                    })
                } else {
                    Err(UploadError::Api {
                        status: 403,
                        message: "quota".to_string(),
                    })
                }
            });

        let mut req = request(&["a", "b"], vec![titled("1"), titled("2")]);
        req.upload = Some(UploadTarget {
            credential: "token".to_string(),
            folder_id: Some("folder".to_string()),
        });
        let outcome = service(fetcher_ok(), processor_ok())
            .with_uploader(Arc::new(uploader))
            .run_batch(req)
            .await
            .unwrap();

        assert_eq!(outcome.successful.len(), 2);
        assert_eq!(outcome.upload_results.len(), 2);
        assert!(outcome.upload_results[0].success);
        assert_eq!(outcome.upload_results[0].remote_id.as_deref(), Some("id-1"));
        assert!(!outcome.upload_results[1].success);
        assert_eq!(outcome.upload_results[1].filename, "slide-2");
        assert!(outcome.upload_results[1].error.as_deref().unwrap().contains("quota"));
    }

    #[tokio::test]
    async fn upload_is_skipped_when_not_requested() {
        let mut uploader = MockSlideUploader::new();
        uploader.expect_upload().never();

        let outcome = service(fetcher_ok(), processor_ok())
            .with_uploader(Arc::new(uploader))
            .run_batch(request(&["a"], vec![titled("x")]))
            .await
            .unwrap();
        assert!(outcome.upload_results.is_empty());
    }
}
