//! Progress bar styling.
//!
//! Two bars are drawn during a run: the main bar counts resolved items, and
//! one transfer bar per item in flight shows its name and byte progress.
//!
//! ```rust
//! use meta4fetch::progress::{ProgressBarOpts, StyleOptions};
//!
//! let quiet = StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
//! assert!(!quiet.is_enabled());
//!
//! let items_only = StyleOptions::new(
//!     ProgressBarOpts::new(Some("{pos}/{len} items".into()), None, true, false),
//!     ProgressBarOpts::hidden(),
//! );
//! assert!(items_only.is_enabled());
//! ```

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use tracing::warn;

/// Style of the main bar and of the per-item transfer bars.
///
/// By default the main bar stays on screen once the run is over, while the
/// transfer bars disappear as their item resolves.
#[derive(Debug, Clone)]
pub struct StyleOptions {
    pub(crate) main: ProgressBarOpts,
    pub(crate) child: ProgressBarOpts,
}

impl Default for StyleOptions {
    fn default() -> Self {
        Self {
            main: ProgressBarOpts {
                template: Some(ProgressBarOpts::TEMPLATE_ITEMS.into()),
                progress_chars: Some(ProgressBarOpts::CHARS_FINE.into()),
                enabled: true,
                clear: false,
            },
            child: ProgressBarOpts::with_transfer_style(),
        }
    }
}

impl StyleOptions {
    /// Create new [`StyleOptions`].
    pub fn new(main: ProgressBarOpts, child: ProgressBarOpts) -> Self {
        Self { main, child }
    }

    /// Return `false` if neither the main nor the child bar is enabled.
    pub fn is_enabled(&self) -> bool {
        self.main.enabled || self.child.enabled
    }

    /// Options of the item counter.
    pub fn main(&self) -> &ProgressBarOpts {
        &self.main
    }

    /// Options of the transfer bars.
    pub fn child(&self) -> &ProgressBarOpts {
        &self.child
    }
}

/// Options for a single progress bar.
#[derive(Debug, Clone)]
pub struct ProgressBarOpts {
    template: Option<String>,
    /// At least 3 characters: "filled", "current" and "to do".
    progress_chars: Option<String>,
    pub(crate) enabled: bool,
    /// Clear the bar once finished.
    pub(crate) clear: bool,
}

impl Default for ProgressBarOpts {
    fn default() -> Self {
        Self {
            template: None,
            progress_chars: None,
            enabled: true,
            clear: true,
        }
    }
}

impl ProgressBarOpts {
    /// Resolved items out of the manifest total.
    ///
    /// `████████████████▋                        5/12 items (41%) eta 00:00:31`
    pub const TEMPLATE_ITEMS: &'static str =
        "{bar:40.blue} {pos:>}/{len} items ({percent}%) eta {eta_precise:.blue}";
    /// Item name followed by its byte progress.
    ///
    /// `a.tif  ━━━━━━━━━━━╾──────── 2.11 MiB/4.02 MiB 1.31 MiB/s eta 1s`
    pub const TEMPLATE_TRANSFER: &'static str =
        "{msg:<20.dim} {bar:30.green/black} {bytes:>11.green}/{total_bytes:<11.green} {bytes_per_sec:>13.red} eta {eta:.blue}";
    /// Fine blocks: `"█▉▊▋▌▍▎▏  "`.
    pub const CHARS_FINE: &'static str = "█▉▊▋▌▍▎▏  ";
    /// A line: `"━╾╴─"`.
    pub const CHARS_LINE: &'static str = "━╾╴─";

    /// Create a new [`ProgressBarOpts`].
    pub fn new(
        template: Option<String>,
        progress_chars: Option<String>,
        enabled: bool,
        clear: bool,
    ) -> Self {
        Self {
            template,
            progress_chars,
            enabled,
            clear,
        }
    }

    /// The transfer bar used by default.
    pub fn with_transfer_style() -> Self {
        Self {
            template: Some(ProgressBarOpts::TEMPLATE_TRANSFER.into()),
            progress_chars: Some(ProgressBarOpts::CHARS_LINE.into()),
            enabled: true,
            clear: true,
        }
    }

    /// Options which hide the bar.
    pub fn hidden() -> Self {
        Self {
            enabled: false,
            ..ProgressBarOpts::default()
        }
    }

    /// Set to `true` to clear the bar once finished.
    pub fn set_clear(&mut self, clear: bool) {
        self.clear = clear;
    }

    /// Whether the bar is cleared once finished.
    pub fn clear(&self) -> bool {
        self.clear
    }

    /// Build the [`ProgressStyle`].
    ///
    /// A template indicatif rejects falls back to the plain bar.
    pub fn to_progress_style(&self) -> ProgressStyle {
        let mut style = match self.template.as_deref() {
            Some(template) => ProgressStyle::with_template(template).unwrap_or_else(|e| {
                warn!("Invalid progress template {:?}: {}", template, e);
                ProgressStyle::default_bar()
            }),
            None => ProgressStyle::default_bar(),
        };
        if let Some(ref progress_chars) = self.progress_chars {
            style = style.progress_chars(progress_chars);
        }
        style
    }

    /// Build a [`ProgressBar`] of length `len`, hidden when disabled.
    ///
    /// A hidden bar still tracks its length and position.
    pub fn to_progress_bar(&self, len: u64) -> ProgressBar {
        if !self.enabled {
            return ProgressBar::with_draw_target(Some(len), ProgressDrawTarget::hidden());
        }
        ProgressBar::new(len).with_style(self.to_progress_style())
    }
}
