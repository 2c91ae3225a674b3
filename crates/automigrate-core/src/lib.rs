pub mod config;
pub mod driver;
pub mod error;
pub mod schema;

pub use config::SyncConfig;
pub use driver::{Dialect, Driver, DriverProfile};
pub use error::{Result, SyncError};
pub use schema::{FieldDef, ForeignKeyDef, IndexDef, ModelRegistry, TableDef};
