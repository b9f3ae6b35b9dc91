//! MVG service configuration

use serde::{Deserialize, Serialize};

/// Configuration for the MVG fahrinfo API
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MvgConfig {
    /// Base URL of the MVG web API
    #[serde(default = "default_base_url")]
    pub base_url: String,

    /// API key sent in the `X-MVG-Authorization-Key` header.
    ///
    /// The default is the well-known static key the public web frontend uses;
    /// there is no per-user credential lifecycle.
    #[serde(default = "default_api_key")]
    pub api_key: String,

    /// User agent sent with every request
    #[serde(default = "default_user_agent")]
    pub user_agent: String,

    /// Connection timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_base_url() -> String {
    "https://www.mvg.de".to_string()
}

fn default_api_key() -> String {
    "5af1beca494712ed38d313714d4caff6".to_string()
}

fn default_user_agent() -> String {
    "mvg-api/0.1".to_string()
}

const fn default_timeout_secs() -> u64 {
    10
}

impl Default for MvgConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            api_key: default_api_key(),
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl MvgConfig {
    /// Create a configuration suitable for testing
    #[must_use]
    pub fn for_testing() -> Self {
        Self {
            timeout_secs: 5,
            ..Default::default()
        }
    }

    /// Validate the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if the configuration is invalid.
    pub fn validate(&self) -> Result<(), String> {
        if self.base_url.is_empty() {
            return Err("base_url must not be empty".to_string());
        }

        if self.api_key.is_empty() {
            return Err("api_key must not be empty".to_string());
        }

        if self.timeout_secs == 0 {
            return Err("timeout_secs must be greater than 0".to_string());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = MvgConfig::default();
        assert_eq!(config.base_url, "https://www.mvg.de");
        assert_eq!(config.timeout_secs, 10);
        assert!(!config.api_key.is_empty());
        assert!(config.user_agent.starts_with("mvg-api/"));
    }

    #[test]
    fn test_testing_config() {
        let config = MvgConfig::for_testing();
        assert_eq!(config.timeout_secs, 5);
        assert_eq!(config.base_url, MvgConfig::default().base_url);
    }

    #[test]
    fn test_validation_success() {
        assert!(MvgConfig::default().validate().is_ok());
    }

    #[test]
    fn test_validation_empty_base_url() {
        let config = MvgConfig {
            base_url: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_empty_api_key() {
        let config = MvgConfig {
            api_key: String::new(),
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validation_zero_timeout() {
        let config = MvgConfig {
            timeout_secs: 0,
            ..Default::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_all_fields_default_from_empty_document() {
        let config: MvgConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.base_url, MvgConfig::default().base_url);
        assert_eq!(config.api_key, MvgConfig::default().api_key);
        assert_eq!(config.timeout_secs, 10);
    }

    #[test]
    fn test_serialization_roundtrip() {
        let config = MvgConfig::default();
        let json = serde_json::to_string(&config).unwrap();
        let deserialized: MvgConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(deserialized.base_url, config.base_url);
        assert_eq!(deserialized.timeout_secs, config.timeout_secs);
    }
}
