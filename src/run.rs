//! One-call entry points: manifest in, report out.
//!
//! A run parses the manifest, builds the [`Downloader`] from the given
//! builder, fetches every item and folds the summaries into a [`Report`].
//! Manifest and configuration problems fail the run before any network
//! access. Items that could not be fetched fail it afterwards, as an
//! [`Error::Fetch`] carrying the complete report.
//!
//! Three flavors share that path:
//!
//! - [`fetch_meta4`] for callers already inside a tokio runtime,
//! - [`download_meta4`] for synchronous callers; it owns its runtime,
//! - [`spawn_meta4`] to run in the background of the current runtime.
//!
//! ```rust,no_run
//! use meta4fetch::downloader::DownloaderBuilder;
//! use meta4fetch::run::download_meta4;
//!
//! # fn main() -> Result<(), meta4fetch::Error> {
//! let builder = DownloaderBuilder::new()
//!     .directory("tiles".into())
//!     .workers(4)
//!     .username("earthdata")
//!     .password("secret");
//! let report = download_meta4("tiles.meta4", builder)?;
//! println!("{} fetched, {} skipped", report.completed(), report.skipped());
//! # Ok(())
//! # }
//! ```
//!
//! [`Downloader`]: crate::Downloader

use crate::download::Report;
use crate::downloader::DownloaderBuilder;
use crate::error::{Error, Result};
use crate::manifest;

use std::path::{Path, PathBuf};
use tokio::runtime::{self, Handle};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

/// Fetch every item of the manifest at `manifest`.
pub async fn fetch_meta4(manifest: impl AsRef<Path>, builder: DownloaderBuilder) -> Result<Report> {
    fetch_meta4_with_cancel(manifest, builder, &CancellationToken::new()).await
}

/// Like [`fetch_meta4`], stopping early once `cancel` fires.
///
/// A cancelled run still resolves every item, the interrupted ones as
/// cancelled, and fails with the resulting report.
pub async fn fetch_meta4_with_cancel(
    manifest: impl AsRef<Path>,
    builder: DownloaderBuilder,
    cancel: &CancellationToken,
) -> Result<Report> {
    let manifest = manifest.as_ref();
    let items = manifest::parse(manifest)?;
    info!("{} item(s) listed in {}", items.len(), manifest.display());

    let downloader = builder.build()?;
    let summaries = downloader.download_with_cancel(&items, cancel).await?;

    let report = Report::new(summaries);
    info!(
        "{} fetched, {} skipped, {} bytes transferred",
        report.completed(),
        report.skipped(),
        report.bytes_transferred()
    );
    Ok(report.into_result()?)
}

/// Blocking variant of [`fetch_meta4`].
///
/// Starts a runtime for the duration of the run. Calling this from within a
/// runtime fails with [`Error::Configuration`]: use [`fetch_meta4`] or
/// [`spawn_meta4`] there instead.
pub fn download_meta4(manifest: impl AsRef<Path>, builder: DownloaderBuilder) -> Result<Report> {
    if Handle::try_current().is_ok() {
        return Err(Error::Configuration(
            "download_meta4 cannot block inside an async runtime; use fetch_meta4 or spawn_meta4"
                .to_string(),
        ));
    }

    let runtime = runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(fetch_meta4(manifest, builder))
}

/// Run [`fetch_meta4_with_cancel`] as a task of the current runtime.
///
/// Returns as soon as the task is spawned. Cancel the run through `cancel`;
/// awaiting the handle gives the run's result.
///
/// # Panics
///
/// Panics when called outside of a tokio runtime.
pub fn spawn_meta4(
    manifest: impl Into<PathBuf>,
    builder: DownloaderBuilder,
    cancel: CancellationToken,
) -> JoinHandle<Result<Report>> {
    let manifest = manifest.into();
    tokio::spawn(async move { fetch_meta4_with_cancel(&manifest, builder, &cancel).await })
}
