use serde::{Deserialize, Serialize};

use crate::driver::Driver;
use crate::error::{Result, SyncError};

/// Database configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Target driver. Inferred from the URL scheme when omitted.
    #[serde(default)]
    pub driver: Option<Driver>,

    /// Connection URL.
    pub url: String,

    /// Connection checkout timeout in seconds.
    #[serde(default = "default_pool_timeout")]
    pub pool_timeout_secs: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            driver: None,
            url: String::new(),
            pool_timeout_secs: default_pool_timeout(),
        }
    }
}

fn default_pool_timeout() -> u64 {
    30
}

impl DatabaseConfig {
    /// The configured driver, checked against the URL scheme.
    pub fn resolve_driver(&self) -> Result<Driver> {
        if self.url.is_empty() {
            return Err(SyncError::Config("Database URL is not set".into()));
        }

        let from_url = Driver::from_url(&self.url)?;
        match self.driver {
            Some(driver) if driver != from_url => Err(SyncError::Config(format!(
                "Driver '{}' does not match database URL scheme '{}'",
                driver, from_url
            ))),
            Some(driver) => Ok(driver),
            None => Ok(from_url),
        }
    }
}
