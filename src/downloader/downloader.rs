//! Core downloader implementation with the fan-out logic.
//!
//! This module contains the [`Downloader`] struct that orchestrates a run:
//! it creates the destination directory, dispatches every item to the mirror
//! fetcher with at most `workers` items in flight, reports progress as items
//! resolve and collects one [`Summary`] per item.
//!
//! # Examples
//!
//! ```rust,no_run
//! use meta4fetch::downloader::DownloaderBuilder;
//! use meta4fetch::manifest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let items = manifest::parse("tiles.meta4")?;
//! let downloader = DownloaderBuilder::new().workers(8).build()?;
//!
//! let summaries = downloader.download(&items).await?;
//! for summary in summaries {
//!     println!("{}: {:?}", summary.item().name(), summary.outcome());
//! }
//! # Ok(())
//! # }
//! ```

use super::config::{build_proxy, Credentials, DownloaderConfig};
use super::mirror::MirrorFetcher;
use super::timeout::TimeoutPolicy;
use crate::download::{FetchItem, Summary};
use crate::error::Result;
use crate::http::{create_http_client, HttpClientConfig};
use crate::progress::ProgressDisplay;

use futures::stream::{self, StreamExt};
use reqwest::header::HeaderMap;
use reqwest_middleware::ClientWithMiddleware;
use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use tokio::fs;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Represents the download controller.
///
/// A downloader can be created via its builder:
///
/// ```rust
/// # fn main() -> Result<(), meta4fetch::Error> {
/// use meta4fetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Clone)]
pub struct Downloader {
    config: DownloaderConfig,
    /// Client shared by every fetch of every run.
    client: ClientWithMiddleware,
    /// Proxy URL captured when the downloader was built.
    proxy: Option<String>,
    credentials: Option<Credentials>,
}

impl fmt::Debug for Downloader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Downloader")
            .field("config", &self.config)
            .field("proxy", &self.proxy)
            .finish()
    }
}

impl Downloader {
    /// Creates a new Downloader with the given configuration.
    ///
    /// The proxy setting is resolved here, once; the resulting client is
    /// reused by every request.
    pub(crate) fn new(config: DownloaderConfig) -> Result<Self> {
        config.validate()?;

        let proxy = config.proxy.resolve();
        let http_config = HttpClientConfig {
            pool_size: config.workers,
            proxy: proxy.as_deref().map(build_proxy).transpose()?,
            headers: config.headers.clone(),
        };
        let client = create_http_client(http_config)?;
        let credentials = config.credentials();

        Ok(Self {
            config,
            client,
            proxy,
            credentials,
        })
    }

    /// Gets the directory where files will be downloaded.
    pub fn directory(&self) -> &PathBuf {
        &self.config.directory
    }

    /// Gets the maximum number of items fetched at once.
    pub fn workers(&self) -> usize {
        self.config.workers
    }

    /// Gets the baseline timeout budgets.
    pub fn timeouts(&self) -> TimeoutPolicy {
        self.config.timeouts
    }

    /// Gets the proxy URL every request goes through, if any.
    pub fn proxy(&self) -> Option<&str> {
        self.proxy.as_deref()
    }

    /// Gets the basic credential user name, if any.
    pub fn username(&self) -> Option<&str> {
        self.credentials.as_ref().map(|c| c.username.as_str())
    }

    /// Gets the custom headers.
    pub fn headers(&self) -> Option<&HeaderMap> {
        self.config.headers.as_ref()
    }

    /// Fetch every item.
    ///
    /// Returns one summary per item, in completion order. Item failures are
    /// reported in the summaries; only failing to create the destination
    /// directory is an error.
    pub async fn download(&self, items: &[FetchItem]) -> Result<Vec<Summary>> {
        self.download_with_cancel(items, &CancellationToken::new())
            .await
    }

    /// Fetch every item until `cancel` fires.
    ///
    /// Once cancelled, transfers in flight stop at their next chunk and leave
    /// their staging file behind; items not yet started are not attempted.
    /// Both resolve as cancelled.
    pub async fn download_with_cancel(
        &self,
        items: &[FetchItem],
        cancel: &CancellationToken,
    ) -> Result<Vec<Summary>> {
        debug!("Creating destination directory {:?}", self.config.directory);
        fs::create_dir_all(&self.config.directory).await?;

        let progress = ProgressDisplay::new(self.config.style_options.clone(), items.len());
        let fetcher = MirrorFetcher {
            client: &self.client,
            credentials: self.credentials.as_ref(),
            directory: &self.config.directory,
            timeouts: self.config.timeouts,
            cancel,
            progress: &progress,
        };
        let resolved = AtomicUsize::new(0);

        // Built up front so the run future stays `Send` for `tokio::spawn`.
        let pending: Vec<_> = items
            .iter()
            .map(|item| self.resolve(&fetcher, item, &progress, &resolved, items.len()))
            .collect();
        let summaries = stream::iter(pending)
            .buffer_unordered(self.config.workers)
            .collect::<Vec<_>>()
            .await;

        progress.finish();

        Ok(summaries)
    }

    /// Fetch one item and report it.
    async fn resolve(
        &self,
        fetcher: &MirrorFetcher<'_>,
        item: &FetchItem,
        progress: &ProgressDisplay,
        resolved: &AtomicUsize,
        total: usize,
    ) -> Summary {
        let summary = fetcher.fetch(item).await;

        progress.increment_main();
        let done = resolved.fetch_add(1, Ordering::Relaxed) + 1;
        info!("{}/{} resolved: {}", done, total, item.name());

        if let Some(ref callback) = self.config.on_complete {
            callback(&summary);
        }

        summary
    }
}
