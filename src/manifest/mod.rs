//! Manifest module turning Metalink 4 documents into fetch items.
//!
//! A manifest lists, per `file` element, the destination name, one or more
//! mirror `url`s and optionally a `hash`. A SHA-256 typed hash is preferred
//! over an untyped one; hashes of other algorithms are ignored and an item
//! without a usable hash is fetched unverified.
//!
//! Parsing is all-or-nothing: any invalid entry rejects the whole manifest
//! with a [`ManifestError`], before anything is downloaded.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::manifest;
//!
//! let items = manifest::parse_str(r#"<?xml version="1.0" encoding="UTF-8"?>
//! <metalink xmlns="urn:ietf:params:xml:ns:metalink">
//!   <file name="a.tif">
//!     <hash type="sha256">e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855</hash>
//!     <url>https://mirror-1.example.com/a.tif</url>
//!     <url>https://mirror-2.example.com/a.tif</url>
//!   </file>
//! </metalink>"#).unwrap();
//!
//! assert_eq!(items.len(), 1);
//! assert_eq!(items[0].mirrors().len(), 2);
//! ```

pub mod parser;

pub use parser::{parse_str, METALINK_NS};

use crate::download::FetchItem;
use crate::error::ManifestError;

use std::fs;
use std::path::Path;

/// Read and parse a Metalink 4 manifest file.
pub fn parse(path: impl AsRef<Path>) -> Result<Vec<FetchItem>, ManifestError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path).map_err(|source| ManifestError::Read {
        path: path.display().to_string(),
        source,
    })?;
    parse_str(&text)
}
