//! Files to fetch.
//!
//! A [`FetchItem`] is one manifest entry: the name of the file to create in
//! the destination directory, the mirrors it can be fetched from and the
//! digest it must match, if the manifest declares one.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::download::FetchItem;
//! use reqwest::Url;
//!
//! # fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let item = FetchItem::new(
//!     "tile_001.tif",
//!     vec![
//!         Url::parse("https://a.example.com/tile_001.tif")?,
//!         Url::parse("https://b.example.com/tile_001.tif")?,
//!     ],
//! )?
//! .with_checksum(Some(
//!     "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855".parse()?,
//! ));
//! assert_eq!(item.mirrors().len(), 2);
//! # Ok(())
//! # }
//! ```

use super::hash::Sha256Digest;
use crate::error::ManifestError;

use reqwest::Url;

/// Represents a file to be fetched from one of its mirrors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchItem {
    /// File name used to save the file in the destination directory.
    name: String,
    /// Expected SHA-256 of the file, if declared.
    checksum: Option<Sha256Digest>,
    /// Candidate source URLs. Never empty.
    mirrors: Vec<Url>,
    /// Size declared by the manifest, in bytes.
    size: Option<u64>,
}

impl FetchItem {
    /// Creates a new [`FetchItem`] without checksum.
    ///
    /// Fails if `name` is not a plain file name or if `mirrors` is empty.
    pub fn new(name: &str, mirrors: Vec<Url>) -> Result<Self, ManifestError> {
        if !is_plain_file_name(name) {
            return Err(ManifestError::UnsafeName {
                name: name.to_string(),
            });
        }
        if mirrors.is_empty() {
            return Err(ManifestError::NoMirrors {
                name: name.to_string(),
            });
        }

        Ok(Self {
            name: String::from(name),
            checksum: None,
            mirrors,
            size: None,
        })
    }

    /// Attach the expected digest.
    pub fn with_checksum(self, checksum: Option<Sha256Digest>) -> Self {
        Self { checksum, ..self }
    }

    /// Attach the declared size.
    pub fn with_size(self, size: Option<u64>) -> Self {
        Self { size, ..self }
    }

    /// Destination file name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Expected digest, if declared.
    pub fn checksum(&self) -> Option<&Sha256Digest> {
        self.checksum.as_ref()
    }

    /// Mirror URLs in manifest order.
    pub fn mirrors(&self) -> &[Url] {
        &self.mirrors
    }

    /// Declared size in bytes, if any.
    pub fn size(&self) -> Option<u64> {
        self.size
    }
}

/// Whether `name` is a single, non-empty path component.
///
/// Rejects separators of either platform, `.` and `..`, and NUL bytes so the
/// joined destination path always stays inside the destination directory.
pub(crate) fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}
