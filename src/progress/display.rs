//! Coordination of the item counter and the transfer bars.
//!
//! ```rust
//! use meta4fetch::progress::{ProgressBarOpts, ProgressDisplay, StyleOptions};
//!
//! let hidden = StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden());
//! let display = ProgressDisplay::new(hidden, 3);
//!
//! let pb = display.create_child_progress(1024);
//! pb.set_message("a.tif");
//! pb.inc(512);
//! display.finish_child(pb);
//! display.increment_main();
//!
//! assert_eq!(display.main().position(), 1);
//! display.finish();
//! ```

use crate::progress::StyleOptions;
use indicatif::{MultiProgress, ProgressBar, ProgressDrawTarget};
use std::sync::Arc;

/// Owns the bars of one run.
pub struct ProgressDisplay {
    multi: Arc<MultiProgress>,
    /// Counts resolved items.
    main: Arc<ProgressBar>,
    style_options: StyleOptions,
}

impl ProgressDisplay {
    /// Create the display of a run over `total_items` items.
    pub fn new(style_options: StyleOptions, total_items: usize) -> Self {
        let multi = match style_options.is_enabled() {
            true => Arc::new(MultiProgress::new()),
            false => Arc::new(MultiProgress::with_draw_target(ProgressDrawTarget::hidden())),
        };

        let main = style_options.main().to_progress_bar(total_items as u64);
        let main = match style_options.main().enabled {
            true => Arc::new(multi.add(main)),
            false => Arc::new(main),
        };
        main.tick();

        Self {
            multi,
            main,
            style_options,
        }
    }

    /// Get the item counter.
    pub fn main(&self) -> Arc<ProgressBar> {
        self.main.clone()
    }

    /// Add a transfer bar; `size` is zero when unknown.
    pub fn create_child_progress(&self, size: u64) -> ProgressBar {
        let pb = self.style_options.child().to_progress_bar(size);
        match self.style_options.child().enabled {
            true => self.multi.add(pb),
            // Adding to the multi bar would redirect it to the terminal.
            false => pb,
        }
    }

    /// Count one more resolved item.
    pub fn increment_main(&self) {
        self.main.inc(1);
    }

    /// Finish a transfer bar, clearing it if configured to.
    pub fn finish_child(&self, pb: ProgressBar) {
        if self.style_options.child().clear() {
            pb.finish_and_clear();
        } else {
            pb.finish();
        }
    }

    /// Finish the item counter.
    pub fn finish(self) {
        if self.style_options.main().clear() {
            self.main.finish_and_clear();
        } else {
            self.main.finish();
        }
    }
}
