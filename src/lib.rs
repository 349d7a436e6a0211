//! meta4fetch fetches the files listed in a Metalink 4 manifest from their
//! mirrors, concurrently, verifying each one against its SHA-256 digest.
//!
//! Files already present with the right digest are skipped, so an
//! interrupted run can simply be started again.
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use meta4fetch::{downloader::DownloaderBuilder, run::fetch_meta4, Error};
//!
//! # #[tokio::main]
//! # async fn main() -> Result<(), Error> {
//! let builder = DownloaderBuilder::new()
//!     .directory("output".into())
//!     .workers(8);
//! let report = fetch_meta4("granules.meta4", builder).await?;
//! println!("{} fetched, {} already present", report.completed(), report.skipped());
//! # Ok(())
//! # }
//! ```
//!
//! # Module Organization
//!
//! - [`manifest`] - Metalink 4 parsing into [`FetchItem`]s
//! - [`download`] - Items, digests and per-item outcomes
//! - [`downloader`] - The `Downloader`, its builder, and the mirror failover
//! - [`error`] - Centralized error handling with the `Error` enum
//! - [`http`] - HTTP client construction
//! - [`progress`] - Progress bar styling and display management
//! - [`run`] - Manifest-to-report entry points, async and blocking

pub mod download;
pub mod downloader;
pub mod error;
pub mod http;
pub mod manifest;
pub mod progress;
pub mod run;

pub use download::{DownloadOutcome, FetchItem, Report, Sha256Digest, Summary};
pub use downloader::{Downloader, DownloaderBuilder, TimeoutPolicy};
pub use error::{Error, FetchError, ManifestError, MirrorExhaustedError, Result};
pub use http::{create_http_client, HttpClientConfig};
pub use progress::{ProgressBarOpts, StyleOptions};
pub use run::{download_meta4, fetch_meta4, spawn_meta4};
