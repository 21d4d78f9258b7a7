use std::sync::Arc;

use anyhow::Context;
use tracing::info;

use carousel_generator::application::carousel_service::CarouselService;
use carousel_generator::config::Settings;
use carousel_generator::infrastructure::axum_handler::{router, AppState};
use carousel_generator::infrastructure::drive_uploader::DriveUploader;
use carousel_generator::infrastructure::external_image_fetcher::DefaultExternalImageFetcher;
use carousel_generator::infrastructure::image_processor::DefaultImageProcessor;
use carousel_generator::infrastructure::rate_limiter::RateLimiter;
use carousel_generator::infrastructure::telemetry;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let settings = Settings::load();
    telemetry::init(&settings.logging).context("failed to initialise logging")?;

    // 依存関係の組み立て
    let fetcher = DefaultExternalImageFetcher::new(
        settings.fetch.timeout,
        settings.fetch.max_redirects,
    )
    .context("failed to build HTTP client")?;
    let fonts_dir = settings.fonts_dir.clone();
    let image_processor =
        tokio::task::spawn_blocking(move || DefaultImageProcessor::new(fonts_dir.as_deref()))
            .await
            .context("font loading task failed")?;
    let uploader = DriveUploader::new(settings.drive_upload_url.clone());

    let carousel_service = CarouselService::new(Arc::new(fetcher), Arc::new(image_processor))
        .with_uploader(Arc::new(uploader));

    let state = AppState {
        carousel_service: Arc::new(carousel_service),
        rate_limiter: RateLimiter::new(
            settings.rate_limit.window,
            settings.rate_limit.max_requests,
        ),
        expose_error_details: settings.server.expose_error_details(),
        max_body_bytes: settings.server.max_body_bytes,
    };

    let listener = tokio::net::TcpListener::bind(settings.server.addr)
        .await
        .with_context(|| format!("failed to bind {}", settings.server.addr))?;
    info!(
        addr = %settings.server.addr,
        environment = ?settings.server.environment,
        "carousel generator listening"
    );

    axum::serve(listener, router(state).into_make_service())
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("server error")?;

    info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for Ctrl-C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
    info!("shutdown signal received");
}
