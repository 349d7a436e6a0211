//! Downloader module containing the fetch orchestration, builder pattern and
//! configuration.
//!
//! This module provides the main [`Downloader`] struct and its builder. A
//! downloader resolves a list of items concurrently, each one through the
//! mirror failover loop, skipping items already valid on disk.
//!
//! # Overview
//!
//! - `downloader` - Core Downloader struct: bounded fan-out and progress
//! - `builder` - DownloaderBuilder for configuration
//! - `config` - Configuration structures, credentials, proxy selection
//! - `mirror` - Per-item mirror failover, streaming and verification
//! - `resume` - Skip-on-resume decision
//! - `timeout` - Per-attempt timeout budgets and their growth
//!
//! # Examples
//!
//! ```rust,no_run
//! use meta4fetch::downloader::DownloaderBuilder;
//! use meta4fetch::download::Report;
//! use meta4fetch::manifest;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let items = manifest::parse("tiles.meta4")?;
//! let downloader = DownloaderBuilder::new().workers(8).build()?;
//! let report = Report::new(downloader.download(&items).await?);
//! println!("{} fetched, {} skipped", report.completed(), report.skipped());
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod config;
pub mod downloader;
pub(crate) mod mirror;
pub mod resume;
pub mod timeout;

pub use builder::DownloaderBuilder;
pub use config::{Credentials, DownloadCallback, DownloaderConfig, ProxySetting};
pub use downloader::Downloader;
pub use timeout::TimeoutPolicy;
