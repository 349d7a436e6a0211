//! Error handling for meta4fetch.
//!
//! This module provides centralized error handling. Fatal errors (a broken
//! manifest, an invalid configuration) abort a run before any network access
//! and surface as [`Error`]. Per-mirror failures are recorded as
//! [`MirrorError`] values and, once every mirror of an item has failed, are
//! folded into a [`MirrorExhaustedError`] carried by that item's outcome. A run
//! that finishes with failed items is reported as a [`FetchError`].

use crate::download::{Report, Sha256Digest};

use reqwest::{StatusCode, Url};
use std::fmt;
use std::io;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Errors that can happen when using meta4fetch.
#[derive(Error, Debug)]
pub enum Error {
    /// The manifest could not be read or is invalid.
    ///
    /// Returned before any network access takes place.
    #[error("Invalid manifest: {0}")]
    Manifest(#[from] ManifestError),

    /// The downloader configuration is invalid.
    ///
    /// Covers the worker count, the proxy URL and the credentials. Returned
    /// before any network access takes place.
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// At least one item could not be fetched.
    ///
    /// Every item has been attempted when this is returned; the wrapped
    /// [`FetchError`] holds the complete report of the run.
    #[error(transparent)]
    Fetch(#[from] FetchError),

    /// I/O Error.
    ///
    /// Raised for run-level file operations such as creating the destination
    /// directory or starting the runtime.
    #[error("I/O error")]
    IOError {
        #[from]
        source: io::Error,
    },

    /// Error from the Reqwest library.
    ///
    /// Raised when the shared HTTP client cannot be built.
    #[error("Reqwest Error")]
    Reqwest {
        #[from]
        source: reqwest::Error,
    },
}

/// Result type alias for operations that can fail with a meta4fetch error.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while parsing a Metalink 4 manifest.
#[derive(Error, Debug)]
pub enum ManifestError {
    /// The manifest file could not be read.
    #[error("cannot read manifest {path}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },

    /// The document is not well-formed XML.
    #[error("malformed XML: {0}")]
    Xml(#[from] quick_xml::Error),

    /// The root element is not a Metalink 4 `metalink` element.
    #[error("document is not a Metalink 4 manifest")]
    NotMetalink,

    /// A `file` element has no `name` attribute.
    #[error("file entry #{index} has no name attribute")]
    MissingName { index: usize },

    /// A file name is empty or would escape the destination directory.
    #[error("file name {name:?} is not a plain file name")]
    UnsafeName { name: String },

    /// Two `file` elements share the same name.
    #[error("file name {name:?} appears more than once")]
    DuplicateName { name: String },

    /// A `file` element lists no mirror.
    #[error("file {name:?} has no mirror URL")]
    NoMirrors { name: String },

    /// A mirror URL cannot be parsed.
    #[error("file {name:?} has an invalid mirror URL {url:?}: {reason}")]
    InvalidUrl {
        name: String,
        url: String,
        reason: String,
    },

    /// The selected digest is not a SHA-256 hex string.
    #[error("file {name:?} has an invalid SHA-256 digest {digest:?}")]
    InvalidDigest { name: String, digest: String },

    /// The `size` element is not an unsigned integer.
    #[error("file {name:?} has an invalid size {size:?}")]
    InvalidSize { name: String, size: String },
}

/// The phase of a transfer a timeout budget applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutPhase {
    /// Waiting for the response headers.
    Connect,
    /// Waiting for the next body chunk.
    Read,
}

impl fmt::Display for TimeoutPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TimeoutPhase::Connect => f.write_str("connect"),
            TimeoutPhase::Read => f.write_str("read"),
        }
    }
}

/// One failed attempt against one mirror.
#[derive(Error, Debug, Clone)]
pub enum MirrorError {
    /// The mirror answered with a non-success status.
    #[error("{url} answered {status}")]
    Status { url: Url, status: StatusCode },

    /// The request could not be sent or no response was received.
    #[error("{url} is unreachable: {source}")]
    Network {
        url: Url,
        #[source]
        source: Arc<reqwest_middleware::Error>,
    },

    /// The response body broke off mid-transfer.
    #[error("transfer from {url} was interrupted: {source}")]
    Stream {
        url: Url,
        #[source]
        source: Arc<reqwest::Error>,
    },

    /// A timeout budget ran out.
    #[error("{url} exceeded the {phase} timeout of {budget:?}")]
    Timeout {
        url: Url,
        phase: TimeoutPhase,
        budget: Duration,
    },

    /// The local staging file could not be written.
    #[error("cannot write data from {url}: {source}")]
    Io {
        url: Url,
        #[source]
        source: Arc<io::Error>,
    },

    /// The transferred content does not match the declared digest.
    #[error("content from {url} has SHA-256 {actual}, expected {expected}")]
    ChecksumMismatch {
        url: Url,
        expected: Sha256Digest,
        actual: Sha256Digest,
    },
}

impl MirrorError {
    /// Whether this attempt transferred content that failed verification.
    pub fn is_checksum_mismatch(&self) -> bool {
        matches!(self, MirrorError::ChecksumMismatch { .. })
    }

    /// The mirror URL the attempt was made against.
    pub fn url(&self) -> &Url {
        match self {
            MirrorError::Status { url, .. }
            | MirrorError::Network { url, .. }
            | MirrorError::Stream { url, .. }
            | MirrorError::Timeout { url, .. }
            | MirrorError::Io { url, .. }
            | MirrorError::ChecksumMismatch { url, .. } => url,
        }
    }
}

/// Why every mirror of an item failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExhaustionKind {
    /// Every mirror delivered content, none of it matched the digest.
    ChecksumNeverMatched,
    /// No mirror delivered a complete response.
    Unreachable,
    /// Some mirrors were unreachable, the others delivered bad content.
    Mixed,
}

impl fmt::Display for ExhaustionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExhaustionKind::ChecksumNeverMatched => f.write_str("checksum never matched"),
            ExhaustionKind::Unreachable => f.write_str("no mirror was reachable"),
            ExhaustionKind::Mixed => f.write_str("no mirror delivered valid content"),
        }
    }
}

/// Every mirror of one item failed.
#[derive(Error, Debug, Clone)]
#[error("{name}: {kind} after {attempts} mirror(s); last error: {last}")]
pub struct MirrorExhaustedError {
    name: String,
    attempts: usize,
    kind: ExhaustionKind,
    #[source]
    last: MirrorError,
}

impl MirrorExhaustedError {
    /// Fold the failures of every tried mirror, in attempt order.
    ///
    /// Returns `None` when `failures` is empty.
    pub fn from_failures(name: &str, failures: Vec<MirrorError>) -> Option<Self> {
        let attempts = failures.len();
        let mismatches = failures.iter().filter(|e| e.is_checksum_mismatch()).count();
        let kind = if mismatches == attempts {
            ExhaustionKind::ChecksumNeverMatched
        } else if mismatches == 0 {
            ExhaustionKind::Unreachable
        } else {
            ExhaustionKind::Mixed
        };
        let last = failures.into_iter().next_back()?;

        Some(Self {
            name: name.to_string(),
            attempts,
            kind,
            last,
        })
    }

    /// Name of the item that failed.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Number of mirrors tried.
    pub fn attempts(&self) -> usize {
        self.attempts
    }

    /// Classification of the failures.
    pub fn kind(&self) -> ExhaustionKind {
        self.kind
    }

    /// The error of the final attempt.
    pub fn last_error(&self) -> &MirrorError {
        &self.last
    }
}

/// A run finished with failed or cancelled items.
#[derive(Error, Debug)]
pub struct FetchError {
    report: Report,
}

impl FetchError {
    pub(crate) fn new(report: Report) -> Self {
        Self { report }
    }

    /// The complete report of the run.
    pub fn report(&self) -> &Report {
        &self.report
    }

    /// Take the complete report of the run.
    pub fn into_report(self) -> Report {
        self.report
    }
}

impl fmt::Display for FetchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let failures: Vec<_> = self.report.failures().collect();
        write!(
            f,
            "{} of {} item(s) failed",
            failures.len(),
            self.report.len()
        )?;
        let cancelled = self.report.cancelled();
        if cancelled > 0 {
            write!(f, ", {} cancelled", cancelled)?;
        }
        for failure in failures {
            write!(f, "\n  {}", failure)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn url(path: &str) -> Url {
        Url::parse(&format!("http://mirror.test/{}", path)).unwrap()
    }

    fn mismatch(path: &str) -> MirrorError {
        MirrorError::ChecksumMismatch {
            url: url(path),
            expected: Sha256Digest::from([0u8; 32]),
            actual: Sha256Digest::from([1u8; 32]),
        }
    }

    fn status(path: &str) -> MirrorError {
        MirrorError::Status {
            url: url(path),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    #[test]
    fn test_exhaustion_checksum_never_matched() {
        let err = MirrorExhaustedError::from_failures("a.tif", vec![mismatch("1"), mismatch("2")])
            .unwrap();
        assert_eq!(err.kind(), ExhaustionKind::ChecksumNeverMatched);
        assert_eq!(err.attempts(), 2);
        assert_eq!(err.last_error().url().path(), "/2");
    }

    #[test]
    fn test_exhaustion_unreachable() {
        let err = MirrorExhaustedError::from_failures("a.tif", vec![status("1")]).unwrap();
        assert_eq!(err.kind(), ExhaustionKind::Unreachable);
        assert!(err.to_string().contains("no mirror was reachable"));
    }

    #[test]
    fn test_exhaustion_mixed() {
        let err = MirrorExhaustedError::from_failures("a.tif", vec![status("1"), mismatch("2")])
            .unwrap();
        assert_eq!(err.kind(), ExhaustionKind::Mixed);
        assert!(err.last_error().is_checksum_mismatch());
    }

    #[test]
    fn test_exhaustion_requires_a_failure() {
        assert!(MirrorExhaustedError::from_failures("a.tif", Vec::new()).is_none());
    }

    #[test]
    fn test_timeout_display() {
        let err = MirrorError::Timeout {
            url: url("slow"),
            phase: TimeoutPhase::Read,
            budget: Duration::from_secs(30),
        };
        assert_eq!(
            err.to_string(),
            "http://mirror.test/slow exceeded the read timeout of 30s"
        );
    }
}
