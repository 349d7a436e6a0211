//! Skip-on-resume decision.
//!
//! An item is skipped only when its destination provably holds the right
//! content: the manifest declares a digest and the file on disk has it. Items
//! without a digest are always fetched again, since a leftover file could be
//! stale or truncated and there is nothing to check it against.

use crate::download::{digest_file, FetchItem};

use std::path::{Path, PathBuf};
use tokio::task;
use tracing::{debug, warn};

/// Whether `destination` already satisfies the checksum of `item`.
///
/// Never touches the network. The file is hashed on the blocking pool; a file
/// that cannot be read is not skipped.
pub async fn should_skip(item: &FetchItem, destination: &Path) -> bool {
    let Some(expected) = item.checksum().copied() else {
        return false;
    };

    let path: PathBuf = destination.to_path_buf();
    let digest = task::spawn_blocking(move || {
        if !path.exists() {
            return Ok(None);
        }
        digest_file(&path).map(Some)
    })
    .await;

    match digest {
        Ok(Ok(Some(actual))) if actual == expected => {
            debug!("{} exists with matching checksum", item.name());
            true
        }
        Ok(Ok(Some(actual))) => {
            debug!(
                "{} exists with checksum {}, expected {}",
                item.name(),
                actual,
                expected
            );
            false
        }
        Ok(Ok(None)) => false,
        Ok(Err(e)) => {
            warn!("Cannot hash existing {}: {}", destination.display(), e);
            false
        }
        Err(e) => {
            warn!("Hashing {} did not complete: {}", destination.display(), e);
            false
        }
    }
}
