//! Per-item mirror failover.
//!
//! The [`MirrorFetcher`] resolves one [`FetchItem`] at a time:
//!
//! 1. If the destination already matches the declared checksum, the item is
//!    skipped without any network access.
//! 2. Otherwise the mirrors are shuffled and tried in that order, each at
//!    most once. The body is streamed into a staging file next to the
//!    destination and hashed on the fly.
//! 3. A mirror fails on a non-success status, a network error, an exhausted
//!    timeout budget, a local write error or a checksum mismatch. The staging
//!    file is removed, both timeout budgets double and the next mirror is
//!    tried.
//! 4. A transfer that passes verification (or has nothing to be verified
//!    against) is renamed onto the destination name.
//!
//! The fetcher knows nothing about other items; the orchestrator runs many of
//! these calls concurrently.

use super::timeout::TimeoutPolicy;
use super::{config::Credentials, resume};
use crate::download::{FetchItem, Sha256Digest, Summary};
use crate::error::{MirrorError, MirrorExhaustedError, TimeoutPhase};
use crate::progress::ProgressDisplay;

use futures::StreamExt;
use indicatif::ProgressBar;
use rand::seq::SliceRandom;
use reqwest::Url;
use reqwest_middleware::ClientWithMiddleware;
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::{
    fs,
    io::{AsyncWriteExt, BufWriter},
    time,
};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

/// Size of the write buffer between the network stream and the disk.
pub const CHUNK_SIZE: usize = 1 << 16;

/// One failed try of one mirror, kept until the item resolves.
#[derive(Debug)]
struct FetchAttempt {
    url: Url,
    timeouts: TimeoutPolicy,
    error: MirrorError,
}

/// Why a transfer stopped before completing.
enum Stop {
    Cancelled,
    Failed(MirrorError),
}

impl From<MirrorError> for Stop {
    fn from(error: MirrorError) -> Self {
        Stop::Failed(error)
    }
}

/// Fetches single items from their mirrors.
pub(crate) struct MirrorFetcher<'a> {
    pub(crate) client: &'a ClientWithMiddleware,
    pub(crate) credentials: Option<&'a Credentials>,
    pub(crate) directory: &'a Path,
    pub(crate) timeouts: TimeoutPolicy,
    pub(crate) cancel: &'a CancellationToken,
    pub(crate) progress: &'a ProgressDisplay,
}

impl MirrorFetcher<'_> {
    /// Resolve one item.
    pub(crate) async fn fetch(&self, item: &FetchItem) -> Summary {
        let summary = Summary::new(item.clone());
        if self.cancel.is_cancelled() {
            return summary;
        }

        let destination = self.directory.join(item.name());
        if resume::should_skip(item, &destination).await {
            let size = fs::metadata(&destination)
                .await
                .map(|m| m.len())
                .unwrap_or(0);
            info!("{} already valid, skipping", item.name());
            return summary.skip(size);
        }

        let partial = partial_path(self.directory, item.name());
        let pb = self.progress.create_child_progress(item.size().unwrap_or(0));
        pb.set_message(item.name().to_string());

        let mut timeouts = self.timeouts;
        let mut attempts: Vec<FetchAttempt> = Vec::new();

        for url in shuffled(item.mirrors()) {
            if self.cancel.is_cancelled() {
                self.progress.finish_child(pb);
                return summary;
            }

            debug!("Fetching {} from {}", item.name(), url);
            pb.reset();
            match self
                .try_mirror(item, &url, timeouts, &partial, &destination, &pb)
                .await
            {
                Ok(size) => {
                    self.progress.finish_child(pb);
                    info!("{} fetched from {} ({} bytes)", item.name(), url, size);
                    return summary.complete(size, item.checksum().is_some());
                }
                Err(Stop::Cancelled) => {
                    debug!("{} cancelled, leaving {}", item.name(), partial.display());
                    self.progress.finish_child(pb);
                    return summary;
                }
                Err(Stop::Failed(error)) => {
                    let attempt = FetchAttempt {
                        url,
                        timeouts,
                        error,
                    };
                    warn!(
                        "{}: mirror {} failed (budgets {:?}/{:?}): {}",
                        item.name(),
                        attempt.url,
                        attempt.timeouts.connect,
                        attempt.timeouts.read,
                        attempt.error
                    );
                    discard(&partial).await;
                    attempts.push(attempt);
                    timeouts = timeouts.escalate();
                }
            }
        }

        self.progress.finish_child(pb);
        if item.checksum().is_some() {
            // Not skipped, so whatever sits under the final name failed verification.
            discard(&destination).await;
        }
        let failures = attempts.into_iter().map(|a| a.error).collect();
        match MirrorExhaustedError::from_failures(item.name(), failures) {
            Some(error) => {
                warn!("{}", error);
                summary.fail(error)
            }
            // Items always carry at least one mirror.
            None => summary,
        }
    }

    /// Stream one mirror into the staging file and move it into place.
    ///
    /// Returns the number of bytes written.
    async fn try_mirror(
        &self,
        item: &FetchItem,
        url: &Url,
        timeouts: TimeoutPolicy,
        partial: &Path,
        destination: &Path,
        pb: &ProgressBar,
    ) -> Result<u64, Stop> {
        let mut request = self.client.get(url.clone());
        if let Some(credentials) = self.credentials {
            request = request.basic_auth(&credentials.username, credentials.password.as_deref());
        }

        let response = tokio::select! {
            biased;
            _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
            sent = time::timeout(timeouts.connect, request.send()) => match sent {
                Err(_) => {
                    return Err(MirrorError::Timeout {
                        url: url.clone(),
                        phase: TimeoutPhase::Connect,
                        budget: timeouts.connect,
                    }
                    .into())
                }
                Ok(Err(e)) => {
                    return Err(MirrorError::Network {
                        url: url.clone(),
                        source: Arc::new(e),
                    }
                    .into())
                }
                Ok(Ok(response)) => response,
            },
        };

        let status = response.status();
        if !status.is_success() {
            return Err(MirrorError::Status {
                url: url.clone(),
                status,
            }
            .into());
        }

        if let Some(length) = response.content_length().or(item.size()) {
            pb.set_length(length);
        }

        let io_error = |e: io::Error| MirrorError::Io {
            url: url.clone(),
            source: Arc::new(e),
        };

        debug!("Creating staging file {:?}", partial);
        let file = fs::File::create(partial).await.map_err(io_error)?;
        let mut writer = BufWriter::with_capacity(CHUNK_SIZE, file);
        let mut hasher = Sha256::new();
        let mut written: u64 = 0;
        let mut stream = response.bytes_stream();

        loop {
            let next = tokio::select! {
                biased;
                _ = self.cancel.cancelled() => return Err(Stop::Cancelled),
                next = time::timeout(timeouts.read, stream.next()) => next,
            };

            let chunk = match next {
                Err(_) => {
                    return Err(MirrorError::Timeout {
                        url: url.clone(),
                        phase: TimeoutPhase::Read,
                        budget: timeouts.read,
                    }
                    .into())
                }
                Ok(None) => break,
                Ok(Some(Err(e))) => {
                    return Err(MirrorError::Stream {
                        url: url.clone(),
                        source: Arc::new(e),
                    }
                    .into())
                }
                Ok(Some(Ok(chunk))) => chunk,
            };

            hasher.update(&chunk);
            writer.write_all(&chunk).await.map_err(io_error)?;
            written += chunk.len() as u64;
            pb.inc(chunk.len() as u64);
        }

        writer.flush().await.map_err(io_error)?;
        drop(writer);

        if let Some(expected) = item.checksum() {
            let actual = Sha256Digest::finish(hasher);
            if actual != *expected {
                return Err(MirrorError::ChecksumMismatch {
                    url: url.clone(),
                    expected: *expected,
                    actual,
                }
                .into());
            }
        }

        fs::rename(partial, destination).await.map_err(io_error)?;
        Ok(written)
    }
}

/// Staging path for an item: a hidden sibling of the destination.
pub(crate) fn partial_path(directory: &Path, name: &str) -> PathBuf {
    directory.join(format!(".{}.part", name))
}

/// Mirrors in a fresh random order.
fn shuffled(mirrors: &[Url]) -> Vec<Url> {
    let mut order = mirrors.to_vec();
    order.shuffle(&mut rand::rng());
    order
}

/// Remove a staging or stale file, if any.
async fn discard(path: &Path) {
    match fs::remove_file(path).await {
        Ok(()) => debug!("Removed {:?}", path),
        Err(e) if e.kind() == io::ErrorKind::NotFound => {}
        Err(e) => warn!("Cannot remove {}: {}", path.display(), e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_path_is_hidden_sibling() {
        let path = partial_path(Path::new("/data/tiles"), "a.tif");
        assert_eq!(path, PathBuf::from("/data/tiles/.a.tif.part"));
    }

    #[test]
    fn test_shuffled_keeps_every_mirror_once() {
        let mirrors: Vec<Url> = (0..16)
            .map(|i| Url::parse(&format!("http://m{}.test/a.tif", i)).unwrap())
            .collect();

        let mut order = shuffled(&mirrors);
        assert_eq!(order.len(), mirrors.len());
        order.sort();
        let mut expected = mirrors.clone();
        expected.sort();
        assert_eq!(order, expected);
    }
}
