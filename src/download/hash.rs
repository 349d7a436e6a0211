//! SHA-256 digests for file integrity verification.
//!
//! Manifests declare digests as 64 hexadecimal characters. They are parsed
//! into a [`Sha256Digest`], a fixed 32-byte value, so a malformed or empty
//! digest string can never reach the verification path.
//!
//! # Examples
//!
//! ```rust
//! use meta4fetch::download::Sha256Digest;
//!
//! let digest: Sha256Digest = "E3B0C44298FC1C149AFBF4C8996FB92427AE41E4649B934CA495991B7852B855"
//!     .parse()
//!     .unwrap();
//! assert_eq!(digest, Sha256Digest::of(b""));
//! assert!("d41d8cd98f00b204e9800998ecf8427e".parse::<Sha256Digest>().is_err());
//! ```

use sha2::{Digest, Sha256};
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader, Read};
use std::path::Path;
use std::str::FromStr;

/// Size of the read buffer used when hashing files on disk.
const READ_BUFFER_SIZE: usize = 1 << 16;

/// A SHA-256 digest.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Digest([u8; 32]);

/// The digest string is not 64 hexadecimal characters.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDigest;

impl fmt::Display for InvalidDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("expected 64 hexadecimal characters")
    }
}

impl std::error::Error for InvalidDigest {}

impl Sha256Digest {
    /// Digest of an in-memory buffer.
    pub fn of(data: &[u8]) -> Self {
        Self(Sha256::digest(data).into())
    }

    /// Digest the accumulated state of a hasher.
    pub fn finish(hasher: Sha256) -> Self {
        Self(hasher.finalize().into())
    }

    /// Raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.0
    }
}

impl From<[u8; 32]> for Sha256Digest {
    fn from(bytes: [u8; 32]) -> Self {
        Self(bytes)
    }
}

impl FromStr for Sha256Digest {
    type Err = InvalidDigest;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut bytes = [0u8; 32];
        hex::decode_to_slice(s.trim(), &mut bytes).map_err(|_| InvalidDigest)?;
        Ok(Self(bytes))
    }
}

impl fmt::Display for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&hex::encode(self.0))
    }
}

impl fmt::Debug for Sha256Digest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Digest({})", self)
    }
}

/// Compute the SHA-256 digest of a file, streaming it in fixed-size blocks.
///
/// This is blocking I/O; async callers should run it on the blocking pool.
pub fn digest_file(path: &Path) -> io::Result<Sha256Digest> {
    let mut reader = BufReader::with_capacity(READ_BUFFER_SIZE, File::open(path)?);
    let mut hasher = Sha256::new();
    let mut buffer = vec![0u8; READ_BUFFER_SIZE];

    loop {
        let read = reader.read(&mut buffer)?;
        if read == 0 {
            break;
        }
        hasher.update(&buffer[..read]);
    }

    Ok(Sha256Digest::finish(hasher))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    const EMPTY_SHA256: &str = "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855";

    #[test]
    fn test_parse_lower_and_upper_case() {
        let lower: Sha256Digest = EMPTY_SHA256.parse().unwrap();
        let upper: Sha256Digest = EMPTY_SHA256.to_uppercase().parse().unwrap();
        assert_eq!(lower, upper);
        assert_eq!(lower.to_string(), EMPTY_SHA256);
    }

    #[test]
    fn test_parse_rejects_wrong_length() {
        assert_eq!("".parse::<Sha256Digest>(), Err(InvalidDigest));
        assert_eq!(
            "d41d8cd98f00b204e9800998ecf8427e".parse::<Sha256Digest>(),
            Err(InvalidDigest)
        );
        assert_eq!(
            format!("{}00", EMPTY_SHA256).parse::<Sha256Digest>(),
            Err(InvalidDigest)
        );
    }

    #[test]
    fn test_parse_rejects_non_hex() {
        let bad = format!("{}g", &EMPTY_SHA256[..63]);
        assert_eq!(bad.parse::<Sha256Digest>(), Err(InvalidDigest));
    }

    #[test]
    fn test_digest_file_matches_in_memory_digest() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data.bin");
        let content: Vec<u8> = (0..200_000).map(|i| (i % 251) as u8).collect();
        fs::write(&path, &content).unwrap();

        assert_eq!(digest_file(&path).unwrap(), Sha256Digest::of(&content));
    }

    #[test]
    fn test_digest_file_missing() {
        let dir = tempfile::tempdir().unwrap();
        let err = digest_file(&dir.path().join("absent")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }
}
