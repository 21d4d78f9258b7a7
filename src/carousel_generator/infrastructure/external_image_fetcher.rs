use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use bytes::BytesMut;
use reqwest::header::{CONTENT_TYPE, LOCATION};
use reqwest::{Client, StatusCode, Url};
use tracing::debug;

use super::error::FetchError;
use crate::domain::image::FetchedImage;
use crate::domain::image_fetcher_trait::ImageFetcher;

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);
pub const DEFAULT_MAX_REDIRECTS: u32 = 10;
const USER_AGENT: &str = concat!("carousel-generator/", env!("CARGO_PKG_VERSION"));

/// Downloads backgrounds over HTTP(S), following redirects by hand so every hop counts
/// against `max_redirects` and gets its own timeout.
pub struct DefaultExternalImageFetcher {
    client: Client,
    timeout: Duration,
    max_redirects: u32,
}

enum Hop {
    Redirect(Url),
    Done(FetchedImage),
}

impl DefaultExternalImageFetcher {
    pub fn new(timeout: Duration, max_redirects: u32) -> Result<Self, FetchError> {
        let client = Client::builder()
            .redirect(reqwest::redirect::Policy::none())
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            timeout,
            max_redirects,
        })
    }

    async fn fetch_once(&self, url: &Url) -> Result<Hop, FetchError> {
        let mut response = self.client.get(url.clone()).send().await?;
        let status = response.status();

        if is_redirect(status) {
            let location = response
                .headers()
                .get(LOCATION)
                .and_then(|value| value.to_str().ok())
                .ok_or_else(|| FetchError::HttpStatus {
                    status: status.as_u16(),
                    reason: "redirect without Location header".to_string(),
                })?;
            let next = url.join(location).map_err(|err| FetchError::InvalidUrl {
                url: location.to_string(),
                reason: err.to_string(),
            })?;
            ensure_http_scheme(&next)?;
            return Ok(Hop::Redirect(next));
        }

        if status != StatusCode::OK {
            return Err(FetchError::HttpStatus {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("Unknown").to_string(),
            });
        }

        // 本文を読む前に Content-Type を確認する
        let declared = response
            .headers()
            .get(CONTENT_TYPE)
            .map(|value| value.to_str().unwrap_or_default().trim().to_string());
        if let Some(content_type) = &declared {
            if !is_image_mime(content_type) {
                return Err(FetchError::InvalidContentType(content_type.clone()));
            }
        }

        let mut body = BytesMut::new();
        while let Some(chunk) = response.chunk().await? {
            body.extend_from_slice(&chunk);
        }
        if body.is_empty() {
            return Err(FetchError::EmptyResponse);
        }

        let content_type = declared.unwrap_or_else(|| sniff_content_type(&body));
        Ok(Hop::Done(FetchedImage::new(body.freeze(), content_type)))
    }
}

#[async_trait]
impl ImageFetcher for DefaultExternalImageFetcher {
    async fn fetch(&self, url: &str) -> Result<FetchedImage, FetchError> {
        if url.starts_with("data:") {
            return decode_data_url(url);
        }

        let mut current = Url::parse(url).map_err(|err| FetchError::InvalidUrl {
            url: url.to_string(),
            reason: err.to_string(),
        })?;
        ensure_http_scheme(&current)?;

        let mut redirects = 0u32;
        loop {
            let hop = tokio::time::timeout(self.timeout, self.fetch_once(&current))
                .await
                .map_err(|_| FetchError::Timeout(self.timeout))??;
            match hop {
                Hop::Done(image) => return Ok(image),
                Hop::Redirect(next) => {
                    redirects += 1;
                    if redirects > self.max_redirects {
                        return Err(FetchError::RedirectLoop {
                            max_redirects: self.max_redirects,
                        });
                    }
                    debug!(from = %current, to = %next, redirects, "following redirect");
                    current = next;
                }
            }
        }
    }
}

fn is_redirect(status: StatusCode) -> bool {
    matches!(
        status,
        StatusCode::MOVED_PERMANENTLY
            | StatusCode::FOUND
            | StatusCode::SEE_OTHER
            | StatusCode::TEMPORARY_REDIRECT
            | StatusCode::PERMANENT_REDIRECT
    )
}

fn is_image_mime(content_type: &str) -> bool {
    content_type.to_ascii_lowercase().starts_with("image/")
}

fn ensure_http_scheme(url: &Url) -> Result<(), FetchError> {
    match url.scheme() {
        "http" | "https" => Ok(()),
        other => Err(FetchError::InvalidUrl {
            url: url.to_string(),
            reason: format!("unsupported scheme '{other}'"),
        }),
    }
}

fn sniff_content_type(bytes: &[u8]) -> String {
    image::guess_format(bytes)
        .map(|format| format.to_mime_type().to_string())
        .unwrap_or_else(|_| "application/octet-stream".to_string())
}

/// `data:image/png;base64,....` 形式の背景をそのままデコードする
fn decode_data_url(url: &str) -> Result<FetchedImage, FetchError> {
    let invalid = |reason: &str| FetchError::InvalidUrl {
        url: url.chars().take(64).collect(),
        reason: reason.to_string(),
    };

    let (meta, payload) = url
        .strip_prefix("data:")
        .and_then(|rest| rest.split_once(','))
        .ok_or_else(|| invalid("missing comma"))?;
    let mut parts = meta.split(';');
    let mime = parts.next().unwrap_or_default().trim();
    if !is_image_mime(mime) {
        return Err(FetchError::InvalidContentType(mime.to_string()));
    }
    if !parts.any(|part| part.trim().eq_ignore_ascii_case("base64")) {
        return Err(invalid("only base64 data URLs are supported"));
    }

    let data = base64::engine::general_purpose::STANDARD
        .decode(payload.trim())
        .map_err(|err| invalid(&err.to_string()))?;
    if data.is_empty() {
        return Err(FetchError::EmptyResponse);
    }
    Ok(FetchedImage::new(data, mime))
}
