//! Rate catalog loading
//!
//! Catalogs come from one of three places: the embedded default, a JSON file,
//! or a URL. Remote catalogs fall back to the embedded one when the fetch
//! fails, so a flaky pricing endpoint never blocks a report.

use crate::rate_catalog::RateCatalog;
use cloudcost_core::error::{CloudcostError, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Where a rate catalog is read from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RateSource {
    /// The catalog compiled into the binary
    Embedded,
    /// A JSON file on disk
    File(PathBuf),
    /// A JSON document served over HTTP(S)
    Url(String),
}

impl RateSource {
    /// Interpret a user-supplied location
    pub fn parse(location: &str) -> Self {
        if location.starts_with("http://") || location.starts_with("https://") {
            Self::Url(location.to_string())
        } else {
            Self::File(PathBuf::from(location))
        }
    }

    /// Pick the source to use
    ///
    /// An explicit location wins; otherwise a `rates.json` in the user config
    /// directory is used if it exists; otherwise the embedded catalog.
    pub fn resolve(explicit: Option<&str>) -> Self {
        if let Some(location) = explicit {
            return Self::parse(location);
        }
        match user_rates_path() {
            Some(path) if path.is_file() => {
                debug!("Using user rate catalog at {}", path.display());
                Self::File(path)
            }
            _ => Self::Embedded,
        }
    }
}

impl fmt::Display for RateSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Embedded => write!(f, "embedded catalog"),
            Self::File(path) => write!(f, "{}", path.display()),
            Self::Url(url) => write!(f, "{url}"),
        }
    }
}

/// Location of the per-user catalog override, `<config_dir>/cloudcost/rates.json`
pub fn user_rates_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join("cloudcost").join("rates.json"))
}

/// Loads rate catalogs from any [`RateSource`]
pub struct RateLoader {
    /// Whether to skip network fetches
    offline_mode: bool,
    /// HTTP client
    client: reqwest::Client,
}

impl RateLoader {
    /// Create a new RateLoader
    pub fn new(offline: bool) -> Self {
        Self {
            offline_mode: offline,
            client: reqwest::Client::new(),
        }
    }

    /// Load a catalog from the given source
    pub async fn load(&self, source: &RateSource) -> Result<RateCatalog> {
        match source {
            RateSource::Embedded => {
                debug!("Using embedded rate catalog");
                RateCatalog::embedded()
            }
            RateSource::File(path) => Self::load_file(path).await,
            RateSource::Url(url) => {
                if self.offline_mode {
                    info!("Offline mode, ignoring {url} and using embedded rate catalog");
                    return RateCatalog::embedded();
                }
                match self.fetch_catalog(url).await {
                    Ok(catalog) => {
                        info!("Fetched rate catalog from {url}");
                        Ok(catalog)
                    }
                    Err(e) => {
                        warn!("Failed to fetch rate catalog: {e}, using embedded catalog");
                        RateCatalog::embedded()
                    }
                }
            }
        }
    }

    async fn load_file(path: &Path) -> Result<RateCatalog> {
        let content = tokio::fs::read_to_string(path).await?;
        let catalog = RateCatalog::from_json(&content).map_err(|e| CloudcostError::Parse {
            file: path.to_path_buf(),
            error: e.to_string(),
        })?;
        info!(
            "Loaded rate catalog from {} ({} instance types, {} volume types)",
            path.display(),
            catalog.instance_hourly.len(),
            catalog.volume_gb_month.len()
        );
        Ok(catalog)
    }

    async fn fetch_catalog(&self, url: &str) -> Result<RateCatalog> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        let body = response.text().await?;
        RateCatalog::from_json(&body)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_source_parsing() {
        assert_eq!(
            RateSource::parse("https://example.com/rates.json"),
            RateSource::Url("https://example.com/rates.json".to_string())
        );
        assert_eq!(
            RateSource::parse("./rates.json"),
            RateSource::File(PathBuf::from("./rates.json"))
        );
        assert_eq!(
            RateSource::resolve(Some("/etc/cloudcost/rates.json")),
            RateSource::File(PathBuf::from("/etc/cloudcost/rates.json"))
        );
    }

    #[tokio::test]
    async fn test_load_embedded() {
        let loader = RateLoader::new(true);
        let catalog = loader.load(&RateSource::Embedded).await.unwrap();
        assert!(catalog.instance_hourly.contains_key("t3.medium"));
    }

    #[tokio::test]
    async fn test_load_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"instance_hourly": {{"t3.medium": 0.05}}, "hours_per_month": 730}}"#
        )
        .unwrap();

        let loader = RateLoader::new(true);
        let catalog = loader
            .load(&RateSource::File(file.path().to_path_buf()))
            .await
            .unwrap();
        assert_eq!(catalog.hours_per_month, 730);
        assert_eq!(catalog.instance_hourly.len(), 1);
    }

    #[tokio::test]
    async fn test_load_invalid_file_reports_path() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let loader = RateLoader::new(true);
        let err = loader
            .load(&RateSource::File(file.path().to_path_buf()))
            .await
            .unwrap_err();
        assert!(matches!(err, CloudcostError::Parse { .. }));
    }

    #[tokio::test]
    async fn test_offline_url_uses_embedded() {
        let loader = RateLoader::new(true);
        let catalog = loader
            .load(&RateSource::Url("https://example.invalid/rates.json".to_string()))
            .await
            .unwrap();
        assert_eq!(catalog, RateCatalog::embedded().unwrap());
    }
}
