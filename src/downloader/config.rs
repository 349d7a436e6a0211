//! Configuration structures and defaults for the downloader.
//!
//! This module provides the configuration used by the [`Downloader`] and
//! [`DownloaderBuilder`]: callback type, credentials, proxy selection and the
//! main configuration structure with its defaults.
//!
//! [`Downloader`]: super::Downloader
//! [`DownloaderBuilder`]: super::DownloaderBuilder
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::downloader::DownloadCallback;
//! use meta4fetch::download::{DownloadOutcome, Summary};
//!
//! let callback: DownloadCallback = Box::new(|summary: &Summary| {
//!     match summary.outcome() {
//!         DownloadOutcome::Failed(error) => eprintln!("✗ {}", error),
//!         _ => println!("✓ {}", summary.item().name()),
//!     }
//! });
//! ```

use super::timeout::TimeoutPolicy;
use crate::download::Summary;
use crate::error::{Error, Result};
use crate::StyleOptions;

use reqwest::header::HeaderMap;
use reqwest::Proxy;
use std::env::{self, current_dir};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Callback type for download completion events
pub type DownloadCallback = Box<dyn Fn(&Summary) + Send + Sync>;

/// Environment variables a proxy is taken from when none is configured.
pub const PROXY_ENV_VARS: [&str; 2] = ["HTTPS_PROXY", "https_proxy"];

/// Basic credential sent with every mirror request.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: Option<String>,
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Where the outbound proxy comes from.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProxySetting {
    /// Read [`PROXY_ENV_VARS`] once when the downloader is built.
    #[default]
    Environment,
    /// Use this proxy URL for every request.
    Url(String),
    /// Connect directly.
    Disabled,
}

impl ProxySetting {
    /// The proxy URL this setting stands for, reading the environment if
    /// needed.
    pub fn resolve(&self) -> Option<String> {
        match self {
            ProxySetting::Environment => PROXY_ENV_VARS
                .iter()
                .filter_map(|key| env::var(key).ok())
                .map(|value| value.trim().to_string())
                .find(|value| !value.is_empty()),
            ProxySetting::Url(url) => Some(url.clone()),
            ProxySetting::Disabled => None,
        }
    }
}

/// Turn a proxy URL into a [`Proxy`] applied to every scheme.
pub(crate) fn build_proxy(url: &str) -> Result<Proxy> {
    Proxy::all(url).map_err(|e| Error::Configuration(format!("invalid proxy {:?}: {}", url, e)))
}

/// Configuration structure for the downloader
#[derive(Clone)]
pub struct DownloaderConfig {
    /// Directory where to store the downloaded files.
    pub directory: PathBuf,
    /// Number of maximum concurrent item fetches.
    pub workers: usize,
    /// Basic credential user name.
    pub username: Option<String>,
    /// Basic credential password.
    pub password: Option<String>,
    /// Outbound proxy selection.
    pub proxy: ProxySetting,
    /// Baseline timeout budgets of each item's first mirror attempt.
    pub timeouts: TimeoutPolicy,
    /// Downloader style options.
    pub style_options: StyleOptions,
    /// Custom HTTP headers.
    pub headers: Option<HeaderMap>,
    /// Callback for when each item resolves.
    pub on_complete: Option<Arc<DownloadCallback>>,
}

impl fmt::Debug for DownloaderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DownloaderConfig")
            .field("directory", &self.directory)
            .field("workers", &self.workers)
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "<redacted>"))
            .field("proxy", &self.proxy)
            .field("timeouts", &self.timeouts)
            .field("style_options", &self.style_options)
            .field("headers", &self.headers)
            .field("on_complete", &self.on_complete.is_some())
            .finish()
    }
}

impl Default for DownloaderConfig {
    fn default() -> Self {
        Self {
            directory: current_dir().unwrap_or_default(),
            workers: 8,
            username: None,
            password: None,
            proxy: ProxySetting::default(),
            timeouts: TimeoutPolicy::default(),
            style_options: StyleOptions::default(),
            headers: None,
            on_complete: None,
        }
    }
}

impl DownloaderConfig {
    /// Check the options that cannot be checked by their types.
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::Configuration(
                "workers must be at least 1".to_string(),
            ));
        }
        if self.timeouts.connect.is_zero() || self.timeouts.read.is_zero() {
            return Err(Error::Configuration(
                "timeouts must be greater than zero".to_string(),
            ));
        }
        match (&self.username, &self.password) {
            (None, Some(_)) => Err(Error::Configuration(
                "a password was given without a username".to_string(),
            )),
            (Some(username), _) if username.is_empty() => Err(Error::Configuration(
                "the username is empty".to_string(),
            )),
            _ => Ok(()),
        }
    }

    /// The credential to send, if a username is configured.
    pub fn credentials(&self) -> Option<Credentials> {
        self.username.as_ref().map(|username| Credentials {
            username: username.clone(),
            password: self.password.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_defaults_are_valid() {
        let config = DownloaderConfig::default();
        assert_eq!(config.workers, 8);
        assert_eq!(config.proxy, ProxySetting::Environment);
        assert!(config.validate().is_ok());
        assert!(config.credentials().is_none());
    }

    #[test]
    fn test_zero_workers_is_rejected() {
        let config = DownloaderConfig {
            workers: 0,
            ..DownloaderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_zero_timeout_is_rejected() {
        let config = DownloaderConfig {
            timeouts: TimeoutPolicy::new(Duration::ZERO, Duration::from_secs(1)),
            ..DownloaderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_password_requires_username() {
        let config = DownloaderConfig {
            password: Some("secret".into()),
            ..DownloaderConfig::default()
        };
        assert!(matches!(config.validate(), Err(Error::Configuration(_))));
    }

    #[test]
    fn test_credentials_debug_redacts_password() {
        let config = DownloaderConfig {
            username: Some("earthdata".into()),
            password: Some("hunter2".into()),
            ..DownloaderConfig::default()
        };
        let credentials = config.credentials().unwrap();
        let debug = format!("{:?} {:?}", credentials, config);
        assert!(debug.contains("earthdata"));
        assert!(!debug.contains("hunter2"));
    }

    #[test]
    fn test_explicit_proxy_settings() {
        assert_eq!(
            ProxySetting::Url("http://proxy.test:3128".into()).resolve(),
            Some("http://proxy.test:3128".to_string())
        );
        assert_eq!(ProxySetting::Disabled.resolve(), None);
    }

    #[test]
    fn test_invalid_proxy_is_a_configuration_error() {
        assert!(build_proxy("http://proxy.test:3128").is_ok());
        assert!(matches!(
            build_proxy("http://exa mple.com"),
            Err(Error::Configuration(_))
        ));
    }
}
