//! Download summary functionality.
//!
//! This module contains the [`Summary`] struct and [`DownloadOutcome`] enum
//! describing how one item resolved, and the [`Report`] aggregating every
//! summary of a run.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::download::{DownloadOutcome, FetchItem, Report, Summary};
//! use reqwest::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let item = FetchItem::new("a.tif", vec![Url::parse("https://example.com/a.tif")?])?;
//! let summary = Summary::new(item).complete(1024, false);
//! assert_eq!(summary.outcome(), &DownloadOutcome::Completed { verified: false });
//!
//! let report = Report::new(vec![summary]);
//! assert!(report.is_success());
//! assert_eq!(report.bytes_transferred(), 1024);
//! # Ok(())
//! # }
//! ```

use super::item::FetchItem;
use crate::error::{FetchError, MirrorExhaustedError};

/// Terminal result of one [`FetchItem`].
#[derive(Debug, Clone)]
pub enum DownloadOutcome {
    /// The destination already matched the declared digest.
    Skipped,
    /// The file was fetched; `verified` tells whether a digest was checked.
    Completed { verified: bool },
    /// Every mirror failed.
    Failed(MirrorExhaustedError),
    /// The run was cancelled before the item resolved.
    Cancelled,
}

impl PartialEq for DownloadOutcome {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (DownloadOutcome::Skipped, DownloadOutcome::Skipped) => true,
            (
                DownloadOutcome::Completed { verified: a },
                DownloadOutcome::Completed { verified: b },
            ) => a == b,
            (DownloadOutcome::Failed(a), DownloadOutcome::Failed(b)) => {
                a.name() == b.name() && a.kind() == b.kind() && a.attempts() == b.attempts()
            }
            (DownloadOutcome::Cancelled, DownloadOutcome::Cancelled) => true,
            _ => false,
        }
    }
}

/// Represents a [`FetchItem`] summary.
#[derive(Debug, Clone)]
pub struct Summary {
    /// Fetched item.
    item: FetchItem,
    /// Outcome.
    outcome: DownloadOutcome,
    /// Bytes on disk for skipped items, bytes transferred otherwise.
    size: u64,
}

impl Summary {
    /// Create a new [`Summary`], initially [`DownloadOutcome::Cancelled`].
    ///
    /// An item only leaves this state by being resolved.
    pub fn new(item: FetchItem) -> Self {
        Self {
            item,
            outcome: DownloadOutcome::Cancelled,
            size: 0,
        }
    }

    /// Mark the item as skipped, `size` bytes already on disk.
    pub fn skip(self, size: u64) -> Self {
        Self {
            outcome: DownloadOutcome::Skipped,
            size,
            ..self
        }
    }

    /// Mark the item as completed after transferring `size` bytes.
    pub fn complete(self, size: u64, verified: bool) -> Self {
        Self {
            outcome: DownloadOutcome::Completed { verified },
            size,
            ..self
        }
    }

    /// Mark the item as failed.
    pub fn fail(self, error: MirrorExhaustedError) -> Self {
        Self {
            outcome: DownloadOutcome::Failed(error),
            size: 0,
            ..self
        }
    }

    /// Get a reference to the summary's item.
    pub fn item(&self) -> &FetchItem {
        &self.item
    }

    /// Get a reference to the summary's outcome.
    pub fn outcome(&self) -> &DownloadOutcome {
        &self.outcome
    }

    /// Get the summary's size.
    pub fn size(&self) -> u64 {
        self.size
    }

    /// The failure, if the item failed.
    pub fn error(&self) -> Option<&MirrorExhaustedError> {
        match &self.outcome {
            DownloadOutcome::Failed(error) => Some(error),
            _ => None,
        }
    }
}

/// Aggregated outcomes of a run.
///
/// Summaries are kept in completion order, not manifest order.
#[derive(Debug, Clone, Default)]
pub struct Report {
    summaries: Vec<Summary>,
}

impl Report {
    /// Create a report from the summaries of a run.
    pub fn new(summaries: Vec<Summary>) -> Self {
        Self { summaries }
    }

    /// Every summary of the run.
    pub fn summaries(&self) -> &[Summary] {
        &self.summaries
    }

    /// Number of items in the run.
    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    /// Whether the run had no items.
    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }

    /// Number of items skipped because they were already valid on disk.
    pub fn skipped(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Skipped))
    }

    /// Number of items fetched.
    pub fn completed(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Completed { .. }))
    }

    /// Number of items cancelled.
    pub fn cancelled(&self) -> usize {
        self.count(|o| matches!(o, DownloadOutcome::Cancelled))
    }

    /// The failure of every failed item.
    pub fn failures(&self) -> impl Iterator<Item = &MirrorExhaustedError> {
        self.summaries.iter().filter_map(Summary::error)
    }

    /// Bytes transferred over the network during the run.
    pub fn bytes_transferred(&self) -> u64 {
        self.summaries
            .iter()
            .filter(|s| matches!(s.outcome(), DownloadOutcome::Completed { .. }))
            .map(Summary::size)
            .sum()
    }

    /// Whether every item was skipped or completed.
    pub fn is_success(&self) -> bool {
        self.summaries.iter().all(|s| {
            matches!(
                s.outcome(),
                DownloadOutcome::Skipped | DownloadOutcome::Completed { .. }
            )
        })
    }

    /// Turn a report with failed or cancelled items into a [`FetchError`].
    pub fn into_result(self) -> Result<Self, FetchError> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(FetchError::new(self))
        }
    }

    fn count(&self, predicate: impl Fn(&DownloadOutcome) -> bool) -> usize {
        self.summaries.iter().filter(|s| predicate(s.outcome())).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::MirrorError;
    use reqwest::{StatusCode, Url};

    fn create_test_item(name: &str) -> FetchItem {
        let url = Url::parse(&format!("http://example.com/{}", name)).unwrap();
        FetchItem::new(name, vec![url]).unwrap()
    }

    fn create_test_failure(name: &str) -> MirrorExhaustedError {
        let error = MirrorError::Status {
            url: Url::parse("http://example.com/x").unwrap(),
            status: StatusCode::INTERNAL_SERVER_ERROR,
        };
        MirrorExhaustedError::from_failures(name, vec![error]).unwrap()
    }

    #[test]
    fn test_summary_starts_cancelled() {
        let summary = Summary::new(create_test_item("a.tif"));
        assert_eq!(summary.outcome(), &DownloadOutcome::Cancelled);
        assert_eq!(summary.size(), 0);
    }

    #[test]
    fn test_summary_skip() {
        let summary = Summary::new(create_test_item("a.tif")).skip(42);
        assert_eq!(summary.outcome(), &DownloadOutcome::Skipped);
        assert_eq!(summary.size(), 42);
        assert!(summary.error().is_none());
    }

    #[test]
    fn test_summary_fail() {
        let summary = Summary::new(create_test_item("a.tif")).fail(create_test_failure("a.tif"));
        assert_eq!(summary.error().map(|e| e.name()), Some("a.tif"));
    }

    #[test]
    fn test_report_counts() {
        let report = Report::new(vec![
            Summary::new(create_test_item("a.tif")).skip(10),
            Summary::new(create_test_item("b.tif")).complete(20, true),
            Summary::new(create_test_item("c.tif")).complete(30, false),
            Summary::new(create_test_item("d.tif")).fail(create_test_failure("d.tif")),
            Summary::new(create_test_item("e.tif")),
        ]);

        assert_eq!(report.len(), 5);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.completed(), 2);
        assert_eq!(report.cancelled(), 1);
        assert_eq!(report.failures().count(), 1);
        assert_eq!(report.bytes_transferred(), 50);
        assert!(!report.is_success());
    }

    #[test]
    fn test_report_into_result() {
        let ok = Report::new(vec![Summary::new(create_test_item("a.tif")).skip(1)]);
        assert!(ok.into_result().is_ok());

        let failed = Report::new(vec![
            Summary::new(create_test_item("a.tif")).skip(1),
            Summary::new(create_test_item("b.tif")).fail(create_test_failure("b.tif")),
        ]);
        let err = failed.into_result().unwrap_err();
        let message = err.to_string();
        assert!(message.starts_with("1 of 2 item(s) failed"));
        assert!(message.contains("b.tif: no mirror was reachable"));
        assert_eq!(err.into_report().len(), 2);
    }

    #[test]
    fn test_empty_report_is_success() {
        assert!(Report::default().is_success());
    }
}
