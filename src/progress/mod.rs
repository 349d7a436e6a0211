//! Progress reporting for a fetch run.
//!
//! - `style` - bar templates and options
//! - `display` - the bars of one run: an item counter plus one transfer bar
//!   per item in flight
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::downloader::DownloaderBuilder;
//! use meta4fetch::progress::{ProgressBarOpts, StyleOptions};
//!
//! # fn example() -> Result<(), meta4fetch::Error> {
//! let style = StyleOptions::new(
//!     ProgressBarOpts::new(
//!         Some("[{bar:40.cyan/blue}] {pos}/{len}".to_string()),
//!         Some(ProgressBarOpts::CHARS_FINE.to_string()),
//!         true,
//!         false,
//!     ),
//!     ProgressBarOpts::with_transfer_style(),
//! );
//! let downloader = DownloaderBuilder::new().style_options(style).build()?;
//! # Ok(())
//! # }
//! ```

pub(crate) mod display;
pub(crate) mod style;

pub use display::ProgressDisplay;
pub use style::{ProgressBarOpts, StyleOptions};
