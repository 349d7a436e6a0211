use std::fs;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use meta4fetch::downloader::{DownloaderBuilder, TimeoutPolicy};
use meta4fetch::progress::{ProgressBarOpts, StyleOptions};
use meta4fetch::{HttpClientConfig, Sha256Digest};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use tempfile::TempDir;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

pub const TEST_USER_AGENT: &str = "meta4fetch-test-agent";

/// Creates a temporary directory for testing purposes
pub fn create_temp_dir() -> TempDir {
    tempfile::tempdir().expect("Failed to create temporary directory")
}

/// Creates a temporary file with the given content
pub fn create_temp_file(dir: &Path, filename: &str, content: &[u8]) -> PathBuf {
    let file_path = dir.join(filename);
    fs::write(&file_path, content).expect("Failed to write temporary file");
    file_path
}

/// Creates test file content of specified size
pub fn create_test_content(size: usize) -> Vec<u8> {
    (0..size).map(|i| (i % 251) as u8).collect()
}

/// Lowercase hex SHA-256 of `content`
pub fn sha256_hex(content: &[u8]) -> String {
    Sha256Digest::of(content).to_string()
}

/// Asserts that a file holds exactly `expected`
pub fn assert_file_content(path: &Path, expected: &[u8]) {
    let content = fs::read(path).unwrap_or_else(|e| panic!("cannot read {:?}: {}", path, e));
    assert_eq!(content, expected, "content mismatch at path: {:?}", path);
}

/// Asserts that no staging file is left in `dir`
pub fn assert_no_partial_files(dir: &Path) {
    let leftovers: Vec<_> = fs::read_dir(dir)
        .expect("Failed to list directory")
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".part"))
        .collect();
    assert!(leftovers.is_empty(), "staging files left behind: {:?}", leftovers);
}

// === Manifest Helpers ===

/// One `file` element of a test manifest.
pub struct ManifestFile {
    pub name: String,
    pub sha256: Option<String>,
    pub urls: Vec<String>,
}

impl ManifestFile {
    pub fn new(name: &str, urls: &[String]) -> Self {
        Self {
            name: name.to_string(),
            sha256: None,
            urls: urls.to_vec(),
        }
    }

    pub fn verified(name: &str, content: &[u8], urls: &[String]) -> Self {
        Self {
            sha256: Some(sha256_hex(content)),
            ..Self::new(name, urls)
        }
    }
}

/// Renders a Metalink 4 document
pub fn metalink_xml(files: &[ManifestFile]) -> String {
    let mut xml = String::from(
        "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<metalink xmlns=\"urn:ietf:params:xml:ns:metalink\">\n",
    );
    for file in files {
        xml.push_str(&format!("  <file name=\"{}\">\n", file.name));
        if let Some(ref digest) = file.sha256 {
            xml.push_str(&format!("    <hash type=\"sha-256\">{}</hash>\n", digest));
        }
        for url in &file.urls {
            xml.push_str(&format!("    <url>{}</url>\n", url));
        }
        xml.push_str("  </file>\n");
    }
    xml.push_str("</metalink>\n");
    xml
}

/// Writes a manifest into `dir` and returns its path
pub fn write_manifest(dir: &Path, files: &[ManifestFile]) -> PathBuf {
    create_temp_file(dir, "files.meta4", metalink_xml(files).as_bytes())
}

// === Downloader Builder Helpers ===

/// Short budgets so failing mirrors do not slow the suite down
pub fn test_timeouts() -> TimeoutPolicy {
    TimeoutPolicy::new(Duration::from_secs(2), Duration::from_secs(2))
}

/// A quiet downloader writing to `dir`, connecting directly
pub fn create_test_downloader_builder(dir: &Path) -> DownloaderBuilder {
    DownloaderBuilder::hidden()
        .directory(dir.to_path_buf())
        .no_proxy()
        .workers(4)
        .timeouts(test_timeouts())
}

// === HTTP Configuration Helpers ===

/// Creates test headers with common user agent
pub fn create_test_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(TEST_USER_AGENT));
    headers
}

/// Creates a test HTTP client configuration
pub fn create_test_http_config() -> HttpClientConfig {
    HttpClientConfig {
        pool_size: 2,
        proxy: None,
        headers: Some(create_test_headers()),
    }
}

// === Progress Bar Helpers ===

/// Creates hidden style options for testing
pub fn create_disabled_style_options() -> StyleOptions {
    StyleOptions::new(ProgressBarOpts::hidden(), ProgressBarOpts::hidden())
}

// === Test Servers ===

/// A bare HTTP/1.1 server recording how many requests it holds at once.
pub struct CountingServer {
    pub base_url: String,
    pub hits: Arc<AtomicUsize>,
    pub max_in_flight: Arc<AtomicUsize>,
}

impl CountingServer {
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

/// Serves `body` for any path after holding each request for `delay`.
///
/// A request counts as in flight from the moment it is accepted until its
/// response starts, so a client can never observe its own response before
/// the count drops.
pub async fn start_counting_server(body: &'static [u8], delay: Duration) -> CountingServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");

    let hits = Arc::new(AtomicUsize::new(0));
    let current = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let server = CountingServer {
        base_url: format!("http://{}", addr),
        hits: hits.clone(),
        max_in_flight: max_in_flight.clone(),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            let hits = hits.clone();
            let current = current.clone();
            let max_in_flight = max_in_flight.clone();
            tokio::spawn(async move {
                let now = current.fetch_add(1, Ordering::SeqCst) + 1;
                max_in_flight.fetch_max(now, Ordering::SeqCst);
                hits.fetch_add(1, Ordering::SeqCst);

                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                tokio::time::sleep(delay).await;
                current.fetch_sub(1, Ordering::SeqCst);

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\nConnection: close\r\n\r\n",
                    body.len()
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(body).await;
                let _ = socket.shutdown().await;
            });
        }
    });

    server
}

/// Sends the headers and the first `sent` bytes of a `declared`-byte body,
/// then stalls for `stall` without closing the connection.
pub async fn start_stalling_server(
    sent: &'static [u8],
    declared: usize,
    stall: Duration,
) -> CountingServer {
    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind test server");
    let addr = listener.local_addr().expect("No local address");

    let hits = Arc::new(AtomicUsize::new(0));
    let max_in_flight = Arc::new(AtomicUsize::new(0));

    let server = CountingServer {
        base_url: format!("http://{}", addr),
        hits: hits.clone(),
        max_in_flight: max_in_flight.clone(),
    };

    tokio::spawn(async move {
        while let Ok((mut socket, _)) = listener.accept().await {
            hits.fetch_add(1, Ordering::SeqCst);
            tokio::spawn(async move {
                let mut request = Vec::new();
                let mut buf = [0u8; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match socket.read(&mut buf).await {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let head = format!(
                    "HTTP/1.1 200 OK\r\nContent-Length: {}\r\nContent-Type: application/octet-stream\r\n\r\n",
                    declared
                );
                let _ = socket.write_all(head.as_bytes()).await;
                let _ = socket.write_all(sent).await;
                let _ = socket.flush().await;
                tokio::time::sleep(stall).await;
            });
        }
    });

    server
}
