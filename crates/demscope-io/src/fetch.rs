//! Making DEM resources available as local bytes.
//!
//! [`LocalFetcher`] reads files that already live on disk. [`HttpFetcher`]
//! downloads remote sources into a cache directory first, coordinating so
//! that concurrent requests for the same URL perform only one download.

use crate::error::FetchError;
use demscope_common::DemDescriptor;
use demscope_mesh::ProgressMonitor;
use parking_lot::{Condvar, Mutex};
use std::collections::HashSet;
use std::fs;
use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info};

type Result<T> = std::result::Result<T, FetchError>;

/// Contents of a DEM resource together with the local path it was read from.
#[derive(Debug, Clone)]
pub struct LocalBytes {
    pub path: PathBuf,
    pub bytes: Vec<u8>,
}

/// Resolves a [`DemDescriptor`] to local bytes.
pub trait Fetch: Send + Sync {
    /// Fetch the resource, polling `monitor` for cancellation.
    fn fetch(&self, descriptor: &DemDescriptor, monitor: &mut dyn ProgressMonitor) -> Result<LocalBytes>;

    /// Whether fetching `descriptor` goes over the network.
    fn needs_download(&self, _descriptor: &DemDescriptor) -> bool {
        false
    }
}

/// Local path for a non-remote source (`file://` prefix stripped).
pub fn local_path(source: &str) -> PathBuf {
    PathBuf::from(source.strip_prefix("file://").unwrap_or(source))
}

fn read_local(descriptor: &DemDescriptor, monitor: &mut dyn ProgressMonitor) -> Result<LocalBytes> {
    if monitor.is_cancelled() {
        return Err(FetchError::Cancelled);
    }
    if descriptor.is_remote() {
        return Err(FetchError::UnsupportedSource(descriptor.source.clone()));
    }
    let path = local_path(&descriptor.source);
    if !path.is_file() {
        return Err(FetchError::NotFound(path));
    }
    let bytes = fs::read(&path)?;
    Ok(LocalBytes { path, bytes })
}

/// Reads sources from the local filesystem.
#[derive(Debug, Default, Clone, Copy)]
pub struct LocalFetcher;

impl Fetch for LocalFetcher {
    fn fetch(&self, descriptor: &DemDescriptor, monitor: &mut dyn ProgressMonitor) -> Result<LocalBytes> {
        read_local(descriptor, monitor)
    }
}

/// Download statistics for the fetcher.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DownloadStats {
    /// Number of files downloaded this session.
    pub files_downloaded: usize,
    /// Total bytes downloaded this session.
    pub bytes_downloaded: u64,
}

/// Fetcher for remote sources with a local file cache.
///
/// Remote files are stored under `cache_dir/<host>/<path>` and reused on
/// later requests. Local sources are read directly.
pub struct HttpFetcher {
    cache_dir: PathBuf,
    client: reqwest::blocking::Client,
    /// URLs currently being downloaded.
    in_flight: Mutex<HashSet<String>>,
    download_complete: Condvar,
    files_downloaded: AtomicUsize,
    bytes_downloaded: AtomicU64,
}

impl std::fmt::Debug for HttpFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpFetcher")
            .field("cache_dir", &self.cache_dir)
            .finish()
    }
}

impl HttpFetcher {
    /// Create a fetcher caching into `cache_dir`, creating it if needed.
    pub fn new<P: AsRef<Path>>(cache_dir: P) -> Result<Self> {
        let cache_dir = cache_dir.as_ref().to_path_buf();
        fs::create_dir_all(&cache_dir)?;

        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(60))
            .build()?;

        Ok(Self {
            cache_dir,
            client,
            in_flight: Mutex::new(HashSet::new()),
            download_complete: Condvar::new(),
            files_downloaded: AtomicUsize::new(0),
            bytes_downloaded: AtomicU64::new(0),
        })
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn download_stats(&self) -> DownloadStats {
        DownloadStats {
            files_downloaded: self.files_downloaded.load(Ordering::Relaxed),
            bytes_downloaded: self.bytes_downloaded.load(Ordering::Relaxed),
        }
    }

    /// Cache location for a remote URL.
    pub fn cache_path(&self, url: &str) -> Result<PathBuf> {
        let (_, rest) = url
            .split_once("://")
            .ok_or_else(|| FetchError::UnsupportedSource(url.to_string()))?;
        let rest = rest.split(['?', '#']).next().unwrap_or_default();

        let mut path = self.cache_dir.clone();
        let mut depth = 0;
        for part in rest.split('/').filter(|p| !p.is_empty() && *p != "." && *p != "..") {
            path.push(part.replace(':', "_"));
            depth += 1;
        }
        // Host plus at least one path component.
        if depth < 2 {
            return Err(FetchError::UnsupportedSource(url.to_string()));
        }
        Ok(path)
    }

    pub fn is_cached(&self, url: &str) -> bool {
        self.cache_path(url).map(|p| p.is_file()).unwrap_or(false)
    }

    /// Download `url` into the cache unless already present.
    ///
    /// If another thread is already downloading the same URL this waits for
    /// it instead of issuing a second request. A download that failed or was
    /// cancelled leaves nothing behind, so the next call tries again.
    pub fn fetch_to_cache(&self, url: &str, monitor: &mut dyn ProgressMonitor) -> Result<PathBuf> {
        let cache_path = self.cache_path(url)?;
        if cache_path.is_file() {
            return Ok(cache_path);
        }

        let _claim = {
            let mut in_flight = self.in_flight.lock();
            while in_flight.contains(url) {
                self.download_complete.wait(&mut in_flight);
            }
            if cache_path.is_file() {
                return Ok(cache_path);
            }
            if monitor.is_cancelled() {
                return Err(FetchError::Cancelled);
            }
            in_flight.insert(url.to_string());
            DownloadClaim { fetcher: self, url }
        };

        self.download(url, &cache_path, monitor)?;
        Ok(cache_path)
    }

    fn download(&self, url: &str, dest: &Path, monitor: &mut dyn ProgressMonitor) -> Result<()> {
        if let Some(parent) = dest.parent() {
            fs::create_dir_all(parent)?;
        }
        info!(url, "Downloading DEM");

        let mut response = self.client.get(url).send()?;
        if !response.status().is_success() {
            return Err(FetchError::DownloadFailed {
                url: url.to_string(),
                reason: format!("HTTP {}", response.status()),
            });
        }
        let total = response.content_length();

        let mut partial = dest.as_os_str().to_owned();
        partial.push(".part");
        let partial = PathBuf::from(partial);

        let mut file = fs::File::create(&partial)?;
        let mut buf = vec![0u8; 64 * 1024];
        let mut received: u64 = 0;
        loop {
            if monitor.is_cancelled() {
                drop(file);
                let _ = fs::remove_file(&partial);
                return Err(FetchError::Cancelled);
            }
            let n = response.read(&mut buf)?;
            if n == 0 {
                break;
            }
            file.write_all(&buf[..n])?;
            received += n as u64;
            if let Some(total) = total.filter(|&t| t > 0) {
                monitor.progress((received as f64 / total as f64).min(1.0));
            }
        }
        file.flush()?;
        drop(file);
        fs::rename(&partial, dest)?;

        self.files_downloaded.fetch_add(1, Ordering::Relaxed);
        self.bytes_downloaded.fetch_add(received, Ordering::Relaxed);
        debug!(url, bytes = received, "Download complete");
        Ok(())
    }
}

/// Marks a URL as being downloaded; waiters are released when it drops.
struct DownloadClaim<'a> {
    fetcher: &'a HttpFetcher,
    url: &'a str,
}

impl Drop for DownloadClaim<'_> {
    fn drop(&mut self) {
        self.fetcher.in_flight.lock().remove(self.url);
        self.fetcher.download_complete.notify_all();
    }
}

impl Fetch for HttpFetcher {
    fn fetch(&self, descriptor: &DemDescriptor, monitor: &mut dyn ProgressMonitor) -> Result<LocalBytes> {
        if !descriptor.is_remote() {
            return read_local(descriptor, monitor);
        }
        if monitor.is_cancelled() {
            return Err(FetchError::Cancelled);
        }
        let path = self.fetch_to_cache(&descriptor.source, monitor)?;
        let bytes = fs::read(&path)?;
        Ok(LocalBytes { path, bytes })
    }

    fn needs_download(&self, descriptor: &DemDescriptor) -> bool {
        descriptor.is_remote() && !self.is_cached(&descriptor.source)
    }
}
