//! Configuration validation logic.

use url::Url;

use crate::config::loader::{Config, StorageBackend};
use crate::error::{Error, Result};
use crate::similarity::HASH_BITS;

/// Maximum concurrent downloads accepted.
const MAX_CONCURRENT_DOWNLOADS: usize = 64;

/// Validate the entire configuration.
pub fn validate_config(config: &Config) -> Result<()> {
    validate_threshold(config.detection.threshold)?;
    validate_concurrency(config.detection.max_concurrent_downloads)?;

    match config.storage.backend {
        StorageBackend::Local => {
            if config.storage.root.is_none() {
                return Err(Error::MissingConfig(
                    "storage.root (directory holding one sub-directory per bucket)".to_string(),
                ));
            }
        }
        StorageBackend::Http => {
            let api_url = config.storage.api_url.as_deref().ok_or_else(|| {
                Error::MissingConfig("storage.api_url (base URL of the storage API)".to_string())
            })?;
            validate_api_url(api_url)?;
        }
    }

    if config.storage.timeout_seconds == 0 {
        return Err(Error::ConfigValidation {
            field: "storage.timeout_seconds".to_string(),
            message: "Timeout must be at least one second".to_string(),
        });
    }

    Ok(())
}

/// Validate the similarity threshold.
pub fn validate_threshold(threshold: u32) -> Result<()> {
    if threshold == 0 || threshold > HASH_BITS {
        return Err(Error::ConfigValidation {
            field: "detection.threshold".to_string(),
            message: format!(
                "Threshold must be between 1 and {} (got {})",
                HASH_BITS, threshold
            ),
        });
    }
    Ok(())
}

/// Validate the download concurrency.
pub fn validate_concurrency(concurrency: usize) -> Result<()> {
    if concurrency == 0 || concurrency > MAX_CONCURRENT_DOWNLOADS {
        return Err(Error::ConfigValidation {
            field: "detection.max_concurrent_downloads".to_string(),
            message: format!(
                "Concurrency must be between 1 and {} (got {})",
                MAX_CONCURRENT_DOWNLOADS, concurrency
            ),
        });
    }
    Ok(())
}

/// Validate the storage API URL.
pub fn validate_api_url(api_url: &str) -> Result<()> {
    let url = Url::parse(api_url)?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(Error::ConfigValidation {
            field: "storage.api_url".to_string(),
            message: format!("Unsupported scheme '{}', expected http or https", url.scheme()),
        });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn local_config() -> Config {
        let mut config = Config::default();
        config.storage.root = Some(PathBuf::from("/srv/buckets"));
        config
    }

    #[test]
    fn test_valid_local_config() {
        assert!(validate_config(&local_config()).is_ok());
    }

    #[test]
    fn test_local_backend_requires_root() {
        let config = Config::default();
        assert!(matches!(
            validate_config(&config),
            Err(Error::MissingConfig(_))
        ));
    }

    #[test]
    fn test_http_backend_requires_valid_url() {
        let mut config = local_config();
        config.storage.backend = StorageBackend::Http;
        assert!(validate_config(&config).is_err());

        config.storage.api_url = Some("ftp://example.com".into());
        assert!(validate_config(&config).is_err());

        config.storage.api_url = Some("http://localhost:9000".into());
        assert!(validate_config(&config).is_ok());
    }

    #[test]
    fn test_threshold_bounds() {
        assert!(validate_threshold(0).is_err());
        assert!(validate_threshold(1).is_ok());
        assert!(validate_threshold(64).is_ok());
        assert!(validate_threshold(65).is_err());
    }

    #[test]
    fn test_concurrency_bounds() {
        assert!(validate_concurrency(0).is_err());
        assert!(validate_concurrency(4).is_ok());
        assert!(validate_concurrency(65).is_err());
    }
}
