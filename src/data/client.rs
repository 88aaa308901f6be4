use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use reqwest::{Client, Url};
use tracing::{debug, instrument};

use crate::error::LoadError;

use super::cache::DownloadCache;

const USER_AGENT: &str = concat!("circuitmap/", env!("CARGO_PKG_VERSION"));

/// Where a dataset lives: a local path or an HTTP(S) URL
#[derive(Debug, Clone, PartialEq)]
pub enum Location {
    File(PathBuf),
    Remote(Url),
}

impl Location {
    /// Anything starting with `http://` or `https://` is remote
    pub fn parse(raw: &str) -> Result<Self, LoadError> {
        if raw.starts_with("http://") || raw.starts_with("https://") {
            let url = Url::parse(raw)
                .map_err(|e| LoadError::InvalidLocation(format!("{raw}: {e}")))?;
            Ok(Location::Remote(url))
        } else if raw.is_empty() {
            Err(LoadError::InvalidLocation("empty path".into()))
        } else {
            Ok(Location::File(PathBuf::from(raw)))
        }
    }

    /// Resolve a file name inside this location (treated as a directory)
    pub fn join(&self, file: &str) -> Result<Self, LoadError> {
        match self {
            Location::File(dir) => Ok(Location::File(dir.join(file))),
            Location::Remote(base) => {
                let mut base = base.clone();
                if !base.path().ends_with('/') {
                    let path = format!("{}/", base.path());
                    base.set_path(&path);
                }
                base.join(file)
                    .map(Location::Remote)
                    .map_err(|e| LoadError::InvalidLocation(format!("{base} + {file}: {e}")))
            }
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::File(path) => write!(f, "{}", path.display()),
            Location::Remote(url) => write!(f, "{url}"),
        }
    }
}

/// Fetches raw dataset bytes from disk or over HTTP
pub struct DataClient {
    client: Client,
    cache: Option<DownloadCache>,
}

impl DataClient {
    pub fn new(timeout: Duration, cache: Option<DownloadCache>) -> Result<Self, LoadError> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client, cache })
    }

    /// Read the whole dataset at `location`
    #[instrument(skip_all, fields(location = %location))]
    pub async fn fetch(&self, location: &Location) -> Result<Vec<u8>, LoadError> {
        match location {
            Location::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|source| LoadError::Io {
                    path: path.display().to_string(),
                    source,
                })?;
                debug!(bytes = bytes.len(), "Read local file");
                Ok(bytes)
            }
            Location::Remote(url) => self.download(url).await,
        }
    }

    async fn download(&self, url: &Url) -> Result<Vec<u8>, LoadError> {
        if let Some(cache) = &self.cache {
            if let Some(bytes) = cache.get(url.as_str()).await {
                return Ok(bytes);
            }
        }

        debug!(%url, "Fetching");
        let response = self.client.get(url.clone()).send().await?;

        if !response.status().is_success() {
            return Err(LoadError::HttpStatus {
                url: url.to_string(),
                status: response.status(),
            });
        }

        let bytes = response.bytes().await?.to_vec();
        debug!(bytes = bytes.len(), "Downloaded");

        if let Some(cache) = &self.cache {
            cache.put(url.as_str(), &bytes).await;
        }

        Ok(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_location_kinds() {
        assert_eq!(
            Location::parse("f1db_csv").unwrap(),
            Location::File(PathBuf::from("f1db_csv"))
        );
        assert!(matches!(
            Location::parse("https://example.com/f1db").unwrap(),
            Location::Remote(_)
        ));
        assert!(Location::parse("").is_err());
    }

    #[test]
    fn test_join_remote_keeps_base_path() {
        let base = Location::parse("https://example.com/data/f1db_csv").unwrap();
        let joined = base.join("circuits.csv").unwrap();

        assert_eq!(
            joined.to_string(),
            "https://example.com/data/f1db_csv/circuits.csv"
        );
    }

    #[test]
    fn test_join_local() {
        let base = Location::parse("f1db_csv").unwrap();
        assert_eq!(
            base.join("races.csv").unwrap(),
            Location::File(PathBuf::from("f1db_csv").join("races.csv"))
        );
    }

    #[tokio::test]
    async fn test_fetch_local_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("drivers.csv");
        std::fs::write(&path, "driverId,forename,surname\n").unwrap();

        let client = DataClient::new(Duration::from_secs(5), None).unwrap();
        let bytes = client.fetch(&Location::File(path)).await.unwrap();
        assert_eq!(bytes, b"driverId,forename,surname\n");
    }

    #[tokio::test]
    async fn test_fetch_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let client = DataClient::new(Duration::from_secs(5), None).unwrap();

        let err = client
            .fetch(&Location::File(dir.path().join("nope.csv")))
            .await
            .unwrap_err();
        assert!(matches!(err, LoadError::Io { .. }));
        assert!(!err.is_recoverable());
    }
}
