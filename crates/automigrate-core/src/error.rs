use thiserror::Error;

/// Core error type for schema synchronization.
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("SQL error: {0}")]
    Sql(#[from] sqlx::Error),

    #[error("Schema validation error: {0}")]
    Validation(String),

    #[error("Dependency cycle between tables: {}", .0.join(" -> "))]
    CyclicDependency(Vec<String>),

    #[error("Unknown database driver: {0}")]
    UnknownDriver(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl From<toml::de::Error> for SyncError {
    fn from(e: toml::de::Error) -> Self {
        SyncError::Serialization(e.to_string())
    }
}

/// Result type alias using SyncError.
pub type Result<T> = std::result::Result<T, SyncError>;
