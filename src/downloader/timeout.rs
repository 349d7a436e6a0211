//! Per-attempt timeout budgets.
//!
//! Every mirror attempt runs under a [`TimeoutPolicy`]: a budget for
//! receiving the response headers and a budget for each body chunk. There is
//! no bound on the total duration of a transfer. After a failed mirror both
//! budgets double for the next mirror of the same item; the next item starts
//! again from the baseline.

use std::time::Duration;

/// Timeout budgets of one mirror attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeoutPolicy {
    /// Budget for connecting and receiving the response headers.
    pub connect: Duration,
    /// Budget for receiving each body chunk.
    pub read: Duration,
}

impl Default for TimeoutPolicy {
    fn default() -> Self {
        Self {
            connect: Self::DEFAULT_CONNECT,
            read: Self::DEFAULT_READ,
        }
    }
}

impl TimeoutPolicy {
    /// Baseline connect budget.
    pub const DEFAULT_CONNECT: Duration = Duration::from_secs(10);
    /// Baseline read budget.
    pub const DEFAULT_READ: Duration = Duration::from_secs(30);

    /// Create a new [`TimeoutPolicy`].
    pub fn new(connect: Duration, read: Duration) -> Self {
        Self { connect, read }
    }

    /// The policy for the attempt after a failed one: both budgets doubled.
    #[must_use]
    pub fn escalate(self) -> Self {
        Self {
            connect: self.connect.saturating_mul(2),
            read: self.read.saturating_mul(2),
        }
    }
}
