//! Clients for the PyPI JSON API and the endoflife.date API.
use async_trait::async_trait;
use log::*;
use pep508_rs::pep440_rs::Version;
use reqwest::StatusCode;
use serde::Deserialize;
use std::{collections::HashMap, str::FromStr, time::Duration};
use thiserror::Error;
use tokio::sync::Mutex;

#[cfg(test)]
use mockall::automock;

/// Python end-of-life data maintained by endoflife.date.
pub const PYTHON_EOL_URL: &str = "https://endoflife.date/api/python.json";

/// Base URL for the PyPI JSON API.
pub const PYPI_BASE_URL: &str = "https://pypi.org";

/// How many of the newest python minor versions count as supported.
pub const SUPPORTED_VERSION_COUNT: usize = 3;

/// Used when the end-of-life registry cannot be reached.
const FALLBACK_PYTHON_VERSIONS: [&str; 3] = ["3.12", "3.11", "3.10"];

const API_TIMEOUT: Duration = Duration::from_secs(10);

/// Failure fetching version data from a registry endpoint.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("package not found")]
    NotFound,

    #[error("unexpected status: {0}")]
    Status(StatusCode),

    #[error("response contained no usable versions")]
    Empty,

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Version lookups the scanner depends on. Lookups absorb their own
/// failures: a missing package or a dead endpoint must never abort a scan.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait VersionRegistry: Send + Sync {
    /// Newest supported python minor versions, descending. Falls back to a
    /// fixed list when the end-of-life registry is unavailable.
    async fn supported_python_versions(&self) -> Vec<String>;

    /// Latest published version of `name`, or `None` when the package is
    /// unknown or the lookup failed. Cached per package for the lifetime
    /// of the process.
    async fn latest_package_version(&self, name: &str) -> Option<String>;
}

/// One release cycle entry from endoflife.date.
#[derive(Debug, Deserialize)]
struct ReleaseCycle {
    cycle: String,
}

/// PyPI JSON API response structure.
#[derive(Debug, Deserialize)]
struct PackageResponse {
    info: PackageInfo,
}

#[derive(Debug, Deserialize)]
struct PackageInfo {
    version: String,
}

/// HTTP client for both registry endpoints, with an in-process per-package
/// cache. Lives for one run; the cache is never invalidated.
pub struct RegistryClient {
    http: reqwest::Client,
    pypi_base_url: String,
    eol_url: String,
    version_count: usize,
    cache: Mutex<HashMap<String, Option<String>>>,
}

impl Default for RegistryClient {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryClient {
    pub fn new() -> Self {
        Self::with_endpoints(PYPI_BASE_URL, PYTHON_EOL_URL)
    }

    /// Client pointed at alternate endpoints. Tests aim this at a local
    /// mock server.
    pub fn with_endpoints(pypi_base_url: &str, eol_url: &str) -> Self {
        Self {
            http: reqwest::Client::new(),
            pypi_base_url: pypi_base_url.to_string(),
            eol_url: eol_url.to_string(),
            version_count: SUPPORTED_VERSION_COUNT,
            cache: Mutex::new(HashMap::new()),
        }
    }

    /// Override how many python minor versions count as supported.
    pub fn with_version_count(mut self, count: usize) -> Self {
        self.version_count = count;
        self
    }

    async fn fetch_supported(&self) -> Result<Vec<String>, FetchError> {
        debug!("fetching supported python versions: {}", self.eol_url);

        let response = self
            .http
            .get(&self.eol_url)
            .timeout(API_TIMEOUT)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let cycles: Vec<ReleaseCycle> = response.json().await?;

        let mut versions: Vec<(Version, String)> = cycles
            .into_iter()
            .filter(|entry| entry.cycle.starts_with("3."))
            .filter_map(|entry| {
                match Version::from_str(&entry.cycle) {
                    Ok(version) => Some((version, entry.cycle)),
                    Err(err) => {
                        debug!(
                            "ignoring unparseable cycle {}: {}",
                            entry.cycle, err
                        );
                        None
                    }
                }
            })
            .collect();

        versions.sort_by(|a, b| b.0.cmp(&a.0));

        let supported: Vec<String> = versions
            .into_iter()
            .take(self.version_count)
            .map(|(_, cycle)| cycle)
            .collect();

        if supported.is_empty() {
            return Err(FetchError::Empty);
        }

        Ok(supported)
    }

    async fn fetch_latest(&self, name: &str) -> Result<String, FetchError> {
        let url = format!("{}/pypi/{}/json", self.pypi_base_url, name);
        debug!("fetching latest version: {}", url);

        let response =
            self.http.get(&url).timeout(API_TIMEOUT).send().await?;

        if response.status() == StatusCode::NOT_FOUND {
            return Err(FetchError::NotFound);
        }

        if !response.status().is_success() {
            return Err(FetchError::Status(response.status()));
        }

        let body: PackageResponse = response.json().await?;

        Ok(body.info.version)
    }
}

#[async_trait]
impl VersionRegistry for RegistryClient {
    async fn supported_python_versions(&self) -> Vec<String> {
        match self.fetch_supported().await {
            Ok(versions) => versions,
            Err(err) => {
                warn!(
                    "failed to fetch supported python versions, using fallback: {}",
                    err
                );
                FALLBACK_PYTHON_VERSIONS
                    .iter()
                    .map(|version| version.to_string())
                    .collect()
            }
        }
    }

    async fn latest_package_version(&self, name: &str) -> Option<String> {
        let mut cache = self.cache.lock().await;

        if let Some(cached) = cache.get(name) {
            debug!("using cached version for {}", name);
            return cached.clone();
        }

        let latest = match self.fetch_latest(name).await {
            Ok(version) => Some(version),
            Err(FetchError::NotFound) => {
                warn!("package {} not found on pypi", name);
                None
            }
            Err(err) => {
                warn!("failed to fetch latest version for {}: {}", name, err);
                None
            }
        };

        // Failures are cached too: one bad lookup should not be retried
        // for every occurrence of the package in the tree.
        cache.insert(name.to_string(), latest.clone());

        latest
    }
}
