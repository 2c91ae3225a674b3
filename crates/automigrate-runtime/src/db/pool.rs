use std::time::Duration;

use sqlx::any::AnyPoolOptions;
use sqlx::AnyPool;
use tracing::debug;

use automigrate_core::config::DatabaseConfig;
use automigrate_core::driver::{Driver, DriverProfile};
use automigrate_core::error::{Result, SyncError};

/// Database connection owned for the lifetime of one run.
///
/// The pool holds a single connection: statements are issued strictly one
/// after another and never contend.
#[derive(Clone)]
pub struct Database {
    pool: AnyPool,
    driver: Driver,
}

impl Database {
    /// Create a new database connection from configuration.
    pub async fn from_config(config: &DatabaseConfig) -> Result<Self> {
        let driver = config.resolve_driver()?;
        sqlx::any::install_default_drivers();

        let pool = Self::create_pool(&config.url, config.pool_timeout_secs)
            .await
            .map_err(|e| SyncError::Database(format!("Failed to connect to {}: {}", driver, e)))?;

        debug!(%driver, "Connected to database");
        Ok(Self { pool, driver })
    }

    async fn create_pool(url: &str, timeout_secs: u64) -> sqlx::Result<AnyPool> {
        AnyPoolOptions::new()
            .max_connections(1)
            .acquire_timeout(Duration::from_secs(timeout_secs))
            .connect(url)
            .await
    }

    pub fn pool(&self) -> &AnyPool {
        &self.pool
    }

    pub fn driver(&self) -> Driver {
        self.driver
    }

    /// Capability profile of the connected driver.
    pub fn profile(&self) -> DriverProfile {
        self.driver.profile()
    }

    /// Check database connectivity.
    pub async fn health_check(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map_err(|e| SyncError::Database(format!("Health check failed: {}", e)))?;
        Ok(())
    }

    /// Close the connection gracefully.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}
