use std::path::PathBuf;
use std::time::{Duration, SystemTime};

use tracing::{debug, warn};

/// Time-to-live for downloaded datasets (1 day)
const DOWNLOAD_TTL: Duration = Duration::from_secs(24 * 3600);

/// On-disk cache for remote dataset downloads
pub struct DownloadCache {
    cache_dir: PathBuf,
    ttl: Duration,
}

impl DownloadCache {
    pub fn new(cache_dir: Option<PathBuf>) -> Self {
        let cache_dir = cache_dir.unwrap_or_else(default_cache_dir);

        // Create cache directory if it doesn't exist
        if let Err(e) = std::fs::create_dir_all(&cache_dir) {
            warn!(path = ?cache_dir, error = %e, "Failed to create cache directory");
        }

        debug!(path = ?cache_dir, "Initialized cache");

        Self {
            cache_dir,
            ttl: DOWNLOAD_TTL,
        }
    }

    #[cfg(test)]
    fn with_ttl(mut self, ttl: Duration) -> Self {
        self.ttl = ttl;
        self
    }

    /// Get a cached download if still fresh
    pub async fn get(&self, url: &str) -> Option<Vec<u8>> {
        let path = self.cache_file(url);
        let modified = tokio::fs::metadata(&path).await.ok()?.modified().ok()?;
        let age = SystemTime::now()
            .duration_since(modified)
            .unwrap_or(Duration::ZERO);

        if age >= self.ttl {
            debug!(url, "Cached download expired");
            return None;
        }

        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!(url, bytes = bytes.len(), "Using cached download");
                Some(bytes)
            }
            Err(e) => {
                warn!(path = ?path, error = %e, "Failed to read cached download");
                None
            }
        }
    }

    /// Store a download; failures only cost a refetch next time
    pub async fn put(&self, url: &str, bytes: &[u8]) {
        let path = self.cache_file(url);
        match tokio::fs::write(&path, bytes).await {
            Ok(()) => debug!(url, bytes = bytes.len(), "Cached download"),
            Err(e) => warn!(path = ?path, error = %e, "Failed to cache download"),
        }
    }

    /// Get path for a cache file; percent-encoding keeps distinct URLs apart
    fn cache_file(&self, url: &str) -> PathBuf {
        self.cache_dir.join(urlencoding::encode(url).into_owned())
    }
}

/// `~/.cache/circuitmap` or the platform equivalent
pub fn default_cache_dir() -> PathBuf {
    dirs::cache_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("circuitmap")
}

#[cfg(test)]
mod tests {
    use super::*;

    const URL: &str = "https://unpkg.com/world-atlas@1.1.4/world/50m.tsv";

    #[test]
    fn test_cache_file_name_is_flat() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(Some(dir.path().to_path_buf()));

        let path = cache.cache_file(URL);
        assert_eq!(path.parent(), Some(dir.path()));
        assert_eq!(
            path.file_name().and_then(|n| n.to_str()),
            Some("https%3A%2F%2Funpkg.com%2Fworld-atlas%401.1.4%2Fworld%2F50m.tsv")
        );
    }

    #[tokio::test]
    async fn test_similar_urls_do_not_share_entries() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(Some(dir.path().to_path_buf()));

        cache.put("https://host/f1db-csv/races.csv", b"A").await;
        assert_eq!(cache.get("https://host/f1db/csv/races.csv").await, None);
        assert_eq!(cache.get("https://host/f1db_csv/races.csv").await, None);
        assert_eq!(
            cache.get("https://host/f1db-csv/races.csv").await.as_deref(),
            Some(&b"A"[..])
        );
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(Some(dir.path().to_path_buf()));

        assert_eq!(cache.get(URL).await, None);
        cache.put(URL, b"iso_n3\tname\n").await;
        assert_eq!(cache.get(URL).await.as_deref(), Some(&b"iso_n3\tname\n"[..]));
    }

    #[test]
    fn test_expired_entry_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let cache = DownloadCache::new(Some(dir.path().to_path_buf())).with_ttl(Duration::ZERO);

        tokio_test::block_on(async {
            cache.put(URL, b"stale").await;
            assert_eq!(cache.get(URL).await, None);
        });
    }
}
