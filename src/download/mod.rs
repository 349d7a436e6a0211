//! Download module containing the data model of a run.
//!
//! This module provides the items a run fetches, the digests they are
//! verified against, and the summaries reporting how each item resolved.
//!
//! # Overview
//!
//! - [`item`] - The [`FetchItem`] struct: destination name, mirrors, digest
//! - [`hash`] - SHA-256 digests and file hashing
//! - [`summary`] - Per-item [`Summary`] and run-level [`Report`]
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::download::{DownloadOutcome, FetchItem, Summary};
//! use reqwest::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let item = FetchItem::new("dem.tif", vec![Url::parse("https://example.com/dem.tif")?])?;
//! let summary = Summary::new(item).skip(2048);
//!
//! match summary.outcome() {
//!     DownloadOutcome::Skipped => println!("{} already valid", summary.item().name()),
//!     DownloadOutcome::Completed { verified } => println!("fetched, verified: {}", verified),
//!     DownloadOutcome::Failed(error) => println!("failed: {}", error),
//!     DownloadOutcome::Cancelled => println!("cancelled"),
//! }
//! # Ok(())
//! # }
//! ```

pub mod hash;
pub mod item;
pub mod summary;

pub use hash::{digest_file, Sha256Digest};
pub use item::FetchItem;
pub use summary::{DownloadOutcome, Report, Summary};
