//! Builder pattern implementation for creating Downloader instances.
//!
//! This module provides the [`DownloaderBuilder`] struct used to configure
//! and create [`Downloader`] instances: destination directory, worker count,
//! credentials, proxy, timeout baseline, progress display and callbacks.
//!
//! Building validates the configuration and creates the HTTP client shared
//! by the whole run, so every configuration problem surfaces before any
//! network access.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::downloader::DownloaderBuilder;
//! use std::path::PathBuf;
//!
//! # fn example() -> Result<(), meta4fetch::Error> {
//! let downloader = DownloaderBuilder::new()
//!     .directory(PathBuf::from("./tiles"))
//!     .workers(4)
//!     .username("earthdata")
//!     .password("secret")
//!     .proxy("http://proxy.example.com:3128")
//!     .build()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Hidden Progress Bars
//!
//! ```rust
//! use meta4fetch::downloader::DownloaderBuilder;
//!
//! let downloader = DownloaderBuilder::hidden().build();
//! ```

use super::{
    config::{DownloaderConfig, ProxySetting},
    downloader::Downloader,
    timeout::TimeoutPolicy,
};
use crate::download::Summary;
use crate::error::Result;
use crate::{ProgressBarOpts, StyleOptions};

use reqwest::header::{HeaderMap, HeaderValue, IntoHeaderName};
use std::{path::PathBuf, sync::Arc};

/// A builder used to create a [`Downloader`].
///
/// ```rust
/// # fn main() -> Result<(), meta4fetch::Error> {
/// use meta4fetch::downloader::DownloaderBuilder;
///
/// let d = DownloaderBuilder::new().workers(16).directory("tiles".into()).build()?;
/// # Ok(())
/// # }
/// ```
#[derive(Default)]
pub struct DownloaderBuilder {
    config: DownloaderConfig,
}

impl DownloaderBuilder {
    /// Creates a builder with the default options.
    pub fn new() -> Self {
        DownloaderBuilder::default()
    }

    /// Convenience function to hide the progress bars.
    pub fn hidden() -> Self {
        let mut builder = DownloaderBuilder::default();
        builder.config.style_options =
            StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
        builder
    }

    /// Sets the directory where to store the downloads.
    pub fn directory(mut self, directory: PathBuf) -> Self {
        self.config.directory = directory;
        self
    }

    /// Set the maximum number of items fetched at once.
    pub fn workers(mut self, workers: usize) -> Self {
        self.config.workers = workers;
        self
    }

    /// Set the basic credential user name sent to every mirror.
    pub fn username(mut self, username: impl Into<String>) -> Self {
        self.config.username = Some(username.into());
        self
    }

    /// Set the basic credential password. Requires a user name.
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.config.password = Some(password.into());
        self
    }

    /// Route every request through this proxy.
    pub fn proxy(mut self, url: impl Into<String>) -> Self {
        self.config.proxy = ProxySetting::Url(url.into());
        self
    }

    /// Connect directly, ignoring any proxy from the environment.
    pub fn no_proxy(mut self) -> Self {
        self.config.proxy = ProxySetting::Disabled;
        self
    }

    /// Set the timeout budgets of each item's first mirror attempt.
    pub fn timeouts(mut self, timeouts: TimeoutPolicy) -> Self {
        self.config.timeouts = timeouts;
        self
    }

    /// Set the downloader style options.
    pub fn style_options(mut self, style_options: StyleOptions) -> Self {
        self.config.style_options = style_options;
        self
    }

    /// Set callback for when each item resolves.
    ///
    /// The callback is called as soon as an item is skipped, completed,
    /// failed or cancelled, while other items may still be in progress.
    ///
    /// # Example
    ///
    /// ```rust
    /// use meta4fetch::downloader::DownloaderBuilder;
    /// use meta4fetch::download::DownloadOutcome;
    ///
    /// let downloader = DownloaderBuilder::new()
    ///     .on_complete(|summary| {
    ///         match summary.outcome() {
    ///             DownloadOutcome::Failed(error) => eprintln!("[Failed] {}", error),
    ///             outcome => println!("[{:?}] {}", outcome, summary.item().name()),
    ///         }
    ///     })
    ///     .build();
    /// ```
    pub fn on_complete<F>(mut self, callback: F) -> Self
    where
        F: Fn(&Summary) + Send + Sync + 'static,
    {
        self.config.on_complete = Some(Arc::new(Box::new(callback)));
        self
    }

    /// Helper method to get or create a new HeaderMap.
    fn new_header(&self) -> HeaderMap {
        match self.config.headers {
            Some(ref h) => h.to_owned(),
            _ => HeaderMap::new(),
        }
    }

    /// Add default http headers to every request.
    ///
    /// You can call `.headers()` multiple times and all `HeaderMap` will be
    /// merged into a single one.
    ///
    /// See also [`header()`].
    ///
    /// [`header()`]: DownloaderBuilder::header
    pub fn headers(mut self, headers: HeaderMap) -> Self {
        let mut new = self.new_header();
        new.extend(headers);

        self.config.headers = Some(new);
        self
    }

    /// Add one default http header to every request.
    ///
    /// # Example
    ///
    /// ```
    /// use reqwest::header::{self, HeaderValue};
    /// use meta4fetch::downloader::DownloaderBuilder;
    ///
    /// let ua = HeaderValue::from_static("tile-sync/1.0");
    ///
    /// let builder = DownloaderBuilder::new()
    ///     .header(header::USER_AGENT, ua)
    ///     .build();
    /// ```
    pub fn header<K: IntoHeaderName>(mut self, name: K, value: HeaderValue) -> Self {
        let mut new = self.new_header();

        new.insert(name, value);

        self.config.headers = Some(new);
        self
    }

    /// Create the [`Downloader`] with the specified options.
    ///
    /// Fails with [`Error::Configuration`] on an invalid worker count,
    /// timeout, credential or proxy.
    ///
    /// [`Error::Configuration`]: crate::Error::Configuration
    pub fn build(self) -> Result<Downloader> {
        Downloader::new(self.config)
    }
}
