//! Background image loading with bounded retry.
//!
//! The image is requested once, then retried up to
//! [`BackoffConfig::max_retries`] times. Retry `n` waits `n` backoff units and
//! requests the URL with `?retry=n` appended:
//!
//! ```text
//! t=0   GET /media/bg.png
//! t=1   GET /media/bg.png?retry=1
//! t=3   GET /media/bg.png?retry=2
//! t=6   GET /media/bg.png?retry=3
//! t=10  GET /media/bg.png?retry=4
//! t=15  GET /media/bg.png?retry=5   -> give up if this fails too
//! ```

use std::time::Duration;

use async_trait::async_trait;
use drawable_renderer::{load_image_from_bytes, load_image_from_data_uri, TextureData};
use reqwest::Client;
use tracing::{debug, error, info, warn};
use url::Url;

use crate::error::FetchError;

/// Path segment hosted deployments serve media under.
const HOSTED_MEDIA_PREFIX: &str = "/~/+";

/// Retry policy with linear backoff.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackoffConfig {
    /// Retries after the initial attempt.
    pub max_retries: u32,
    /// Delay unit; retry `n` waits `n` units.
    pub unit: Duration,
}

impl Default for BackoffConfig {
    fn default() -> Self {
        Self {
            max_retries: 5,
            unit: Duration::from_secs(1),
        }
    }
}

impl BackoffConfig {
    /// Delay before retry `retry` (1-indexed).
    #[must_use]
    pub fn delay_for_retry(&self, retry: u32) -> Duration {
        self.unit * retry
    }
}

/// Prefix prepended to relative image paths.
///
/// This is the origin of the host base URL, with the hosted media segment
/// appended when the origin names a streamlit deployment. Without a base URL
/// the prefix is empty.
#[must_use]
pub fn resolve_origin(base: Option<&Url>) -> String {
    let Some(base) = base else {
        return String::new();
    };
    let mut origin = base.origin().ascii_serialization();
    if origin.contains("streamlit") {
        origin.push_str(HOSTED_MEDIA_PREFIX);
    }
    origin
}

/// Resolve the URL of the first attempt.
///
/// Absolute URLs are used as given; anything else is appended to
/// [`resolve_origin`].
///
/// # Errors
///
/// Returns [`FetchError::InvalidUrl`] if the base or the result does not parse.
pub fn resolve_image_url(base: Option<&str>, image: &str) -> Result<Url, FetchError> {
    if let Ok(absolute) = Url::parse(image) {
        return Ok(absolute);
    }
    let base = base
        .map(Url::parse)
        .transpose()
        .map_err(|e| FetchError::InvalidUrl(format!("host base URL: {e}")))?;
    let joined = format!("{}{image}", resolve_origin(base.as_ref()));
    Url::parse(&joined).map_err(|e| FetchError::InvalidUrl(format!("{joined}: {e}")))
}

/// URL of retry `retry`: the first URL with `retry=n` added to its query.
#[must_use]
pub fn retry_url(url: &Url, retry: u32) -> Url {
    let mut url = url.clone();
    url.query_pairs_mut().append_pair("retry", &retry.to_string());
    url
}

/// Fetches image bytes.
#[async_trait]
pub trait ImageFetcher: Send + Sync {
    /// Fetch the body at `url`.
    ///
    /// # Errors
    ///
    /// Returns an error if the request fails or the status is not a success.
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError>;
}

/// [`ImageFetcher`] over HTTP.
#[derive(Debug, Clone, Default)]
pub struct HttpImageFetcher {
    client: Client,
}

impl HttpImageFetcher {
    /// Create a fetcher with a fresh client.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a fetcher sharing an existing client.
    #[must_use]
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl ImageFetcher for HttpImageFetcher {
    async fn fetch(&self, url: &Url) -> Result<Vec<u8>, FetchError> {
        let response = self.client.get(url.clone()).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status(status.as_u16()));
        }
        Ok(response.bytes().await?.to_vec())
    }
}

/// Result of loading a background image.
#[derive(Debug)]
pub enum LoadOutcome {
    /// The image was fetched and decoded.
    Loaded {
        /// Decoded image.
        texture: TextureData,
        /// Attempts made, including the successful one.
        attempts: u32,
    },
    /// Every attempt failed.
    Failed {
        /// Attempts made.
        attempts: u32,
        /// Error of the last attempt.
        error: FetchError,
    },
}

impl LoadOutcome {
    /// Number of attempts made.
    #[must_use]
    pub fn attempts(&self) -> u32 {
        match self {
            Self::Loaded { attempts, .. } | Self::Failed { attempts, .. } => *attempts,
        }
    }

    /// The decoded image, if loading succeeded.
    #[must_use]
    pub fn into_texture(self) -> Option<TextureData> {
        match self {
            Self::Loaded { texture, .. } => Some(texture),
            Self::Failed { .. } => None,
        }
    }
}

/// Loads a background image with bounded retry and linear backoff.
#[derive(Debug, Clone)]
pub struct BackgroundImageLoader<F> {
    fetcher: F,
    backoff: BackoffConfig,
}

impl<F: ImageFetcher> BackgroundImageLoader<F> {
    /// Create a loader.
    pub fn new(fetcher: F, backoff: BackoffConfig) -> Self {
        Self { fetcher, backoff }
    }

    /// The underlying fetcher.
    #[must_use]
    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    /// Load `image`, resolving relative paths against `base`.
    ///
    /// `data:` URIs are decoded in place without any request. Failures are
    /// logged; the caller decides what a missing background means.
    pub async fn load(&self, base: Option<&str>, image: &str) -> LoadOutcome {
        if image.starts_with("data:") {
            return match load_image_from_data_uri(image) {
                Ok(texture) => LoadOutcome::Loaded {
                    texture,
                    attempts: 1,
                },
                Err(e) => {
                    error!("Background image data URI is not an image: {e}");
                    LoadOutcome::Failed {
                        attempts: 1,
                        error: FetchError::Decode(e),
                    }
                }
            };
        }

        let first = match resolve_image_url(base, image) {
            Ok(url) => url,
            Err(error) => {
                error!("Cannot load background image: {error}");
                return LoadOutcome::Failed { attempts: 0, error };
            }
        };

        let mut attempts = 0;
        let mut url = first.clone();
        loop {
            attempts += 1;
            match self.attempt(&url).await {
                Ok(texture) => {
                    info!(
                        "Background image loaded after {attempts} attempt(s): {}x{}",
                        texture.width, texture.height
                    );
                    return LoadOutcome::Loaded { texture, attempts };
                }
                Err(error) => {
                    let retry = attempts;
                    if retry > self.backoff.max_retries || !error.is_retryable() {
                        error!(
                            "Failed to load the background image after {} retries: {error}",
                            retry - 1
                        );
                        return LoadOutcome::Failed { attempts, error };
                    }
                    let delay = self.backoff.delay_for_retry(retry);
                    warn!(
                        "Background image attempt {attempts} failed, retry {retry}/{} in {:?}: {error}",
                        self.backoff.max_retries, delay
                    );
                    tokio::time::sleep(delay).await;
                    url = retry_url(&first, retry);
                }
            }
        }
    }

    async fn attempt(&self, url: &Url) -> Result<TextureData, FetchError> {
        debug!("Fetching background image {url}");
        let bytes = self.fetcher.fetch(url).await?;
        Ok(load_image_from_bytes(&bytes)?)
    }
}
