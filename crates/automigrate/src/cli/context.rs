use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use clap::Args;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use automigrate_core::config::{LoggingConfig, SyncConfig};
use automigrate_core::driver::Driver;
use automigrate_core::schema::{ModelRegistry, SchemaFile};

/// Options shared by every command.
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Configuration file path.
    #[arg(short, long, default_value = "automigrate.toml", global = true)]
    pub config: String,

    /// Database driver (overrides config).
    #[arg(long, global = true)]
    pub driver: Option<String>,

    /// Database URL (overrides config).
    #[arg(long, env = "DATABASE_URL", global = true)]
    pub database_url: Option<String>,

    /// Schema declarations file (overrides config).
    #[arg(short, long, global = true)]
    pub schema: Option<String>,
}

/// Everything a command needs before touching the database.
pub struct Context {
    pub config: SyncConfig,
    pub registry: ModelRegistry,
}

impl Context {
    /// Load `.env`, configuration and schema, and start logging.
    pub fn load(args: &GlobalArgs) -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = load_config(args)?;
        init_tracing(&config.logging);

        info!("Loading schema from {}", config.schema.path);
        let registry = load_registry(&config.schema.path)?;
        debug!(tables = registry.len(), "Schema loaded");

        Ok(Self { config, registry })
    }

    /// Driver for a command that connects: URL and driver must agree.
    pub fn connected_driver(&self) -> Result<Driver> {
        Ok(self.config.database.resolve_driver()?)
    }

    /// Driver for a command that only renders statements: no URL needed.
    pub fn offline_driver(&self) -> Result<Driver> {
        match self.config.database.driver {
            Some(driver) => Ok(driver),
            None => self
                .connected_driver()
                .context("Set --driver or a database URL to choose the SQL dialect"),
        }
    }
}

/// Read the configuration file, falling back to defaults when it is absent,
/// then apply command-line overrides.
pub fn load_config(args: &GlobalArgs) -> Result<SyncConfig> {
    let path = Path::new(&args.config);
    let mut config = if path.exists() {
        SyncConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", args.config))?
    } else {
        SyncConfig::default_with_database_url("")
    };

    if let Some(driver) = &args.driver {
        config.database.driver = Some(driver.parse()?);
    }
    if let Some(url) = &args.database_url {
        config.database.url = url.clone();
    }
    if let Some(schema) = &args.schema {
        config.schema.path = schema.clone();
    } else if path.exists() {
        // Schema paths in a config file are relative to that file.
        config.schema.path = relative_to(path, &config.schema.path)
            .to_string_lossy()
            .into_owned();
    }

    Ok(config)
}

fn relative_to(config_path: &Path, schema_path: &str) -> PathBuf {
    let schema = Path::new(schema_path);
    match config_path.parent() {
        Some(dir) if schema.is_relative() => dir.join(schema),
        _ => schema.to_path_buf(),
    }
}

fn load_registry(path: &str) -> Result<ModelRegistry> {
    let registry = SchemaFile::from_file(path)?.into_registry()?;
    Ok(registry)
}

/// `RUST_LOG` wins over the configured level.
fn init_tracing(logging: &LoggingConfig) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);

    // A subscriber may already be installed, e.g. by tests.
    let _ = if logging.json_format {
        builder.json().try_init()
    } else {
        builder.try_init()
    };
}
