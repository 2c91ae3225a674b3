//! Database driver profiles.
//!
//! Every supported engine gets one dialect struct implementing [`Dialect`]:
//!
//! - [`MySqlDialect`]: tables are created with `ENGINE=InnoDB`, foreign keys
//!   are added in a separate constraint step
//! - [`PostgresDialect`]: no table options, foreign keys added separately
//! - [`SqliteDialect`]: foreign keys are declared inline when the table is
//!   created, so there is no constraint step
//!
//! [`DriverProfile`] dispatches over the closed set of dialects with a plain
//! match, so adding an engine means adding one variant here.

mod mysql;
mod postgres;
mod sqlite;

pub use mysql::MySqlDialect;
pub use postgres::PostgresDialect;
pub use sqlite::SqliteDialect;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::error::{Result, SyncError};
use crate::schema::SqlType;

/// Identity of the target database technology.
///
/// Configuration values go through [`FromStr`], so `driver = "MySQL"` and
/// `--driver MySQL` accept the same names.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "String")]
pub enum Driver {
    MySql,
    Postgres,
    Sqlite,
}

impl Driver {
    /// Canonical lowercase name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Driver::MySql => "mysql",
            Driver::Postgres => "postgres",
            Driver::Sqlite => "sqlite",
        }
    }

    /// Infer the driver from a connection URL scheme.
    ///
    /// Only the schemes the connection layer understands are accepted.
    pub fn from_url(url: &str) -> Result<Self> {
        let scheme = url
            .split_once(':')
            .map(|(scheme, _)| scheme)
            .ok_or_else(|| SyncError::Config(format!("Database URL has no scheme: {}", url)))?;

        match scheme.to_ascii_lowercase().as_str() {
            "mysql" => Ok(Driver::MySql),
            "postgres" | "postgresql" => Ok(Driver::Postgres),
            "sqlite" => Ok(Driver::Sqlite),
            other => Err(SyncError::Config(format!(
                "Unsupported database URL scheme '{}', expected mysql, postgres or sqlite",
                other
            ))),
        }
    }

    /// The capability profile for this driver.
    pub fn profile(&self) -> DriverProfile {
        match self {
            Driver::MySql => DriverProfile::MySql(MySqlDialect),
            Driver::Postgres => DriverProfile::Postgres(PostgresDialect),
            Driver::Sqlite => DriverProfile::Sqlite(SqliteDialect),
        }
    }
}

impl fmt::Display for Driver {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl TryFrom<String> for Driver {
    type Error = SyncError;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl FromStr for Driver {
    type Err = SyncError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "mysql" | "mariadb" => Ok(Driver::MySql),
            "postgres" | "postgresql" | "pgsql" => Ok(Driver::Postgres),
            "sqlite" | "sqlite3" => Ok(Driver::Sqlite),
            other => Err(SyncError::UnknownDriver(other.to_string())),
        }
    }
}

/// SQL syntax and capability strategy for one database engine.
pub trait Dialect {
    /// The driver this dialect belongs to.
    fn driver(&self) -> Driver;

    /// Quote an identifier.
    fn quote_ident(&self, name: &str) -> String;

    /// Column type declaration for a portable SQL type.
    fn column_type(&self, ty: &SqlType) -> String;

    /// Type plus primary key clause for an auto-incrementing key column.
    fn auto_increment_column(&self, ty: &SqlType) -> String;

    /// Storage directive appended to every CREATE TABLE, if any.
    fn table_creation_option(&self) -> Option<&'static str>;

    /// Whether foreign keys need their own constraint step after tables exist.
    fn requires_explicit_foreign_keys(&self) -> bool;

    /// Query listing the column names of the table bound as its only parameter.
    fn list_columns_query(&self) -> String;

    /// Query listing the index names of the table bound as its only parameter.
    fn list_indexes_query(&self) -> String;

    /// Longest identifier the engine keeps intact, in bytes.
    fn max_identifier_length(&self) -> usize;

    /// Fit a derived object name within [`Dialect::max_identifier_length`].
    ///
    /// Names that are too long keep a prefix and gain a short hash of the
    /// full name, so the result is the same on every run.
    fn identifier(&self, name: &str) -> String {
        fit_identifier(name, self.max_identifier_length())
    }

    /// Default expression for generated UUID primary keys.
    fn uuid_default(&self) -> Option<&'static str> {
        None
    }

    /// Literal used to fill a new NOT NULL column on existing rows.
    fn not_null_filler(&self, ty: &SqlType) -> &'static str;

    /// Statement removing a table if it exists.
    fn drop_table_sql(&self, table: &str) -> String {
        format!("DROP TABLE IF EXISTS {}", self.quote_ident(table))
    }
}

/// Closed set of driver capability profiles.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DriverProfile {
    MySql(MySqlDialect),
    Postgres(PostgresDialect),
    Sqlite(SqliteDialect),
}

impl Dialect for DriverProfile {
    fn driver(&self) -> Driver {
        match self {
            DriverProfile::MySql(d) => d.driver(),
            DriverProfile::Postgres(d) => d.driver(),
            DriverProfile::Sqlite(d) => d.driver(),
        }
    }

    fn quote_ident(&self, name: &str) -> String {
        match self {
            DriverProfile::MySql(d) => d.quote_ident(name),
            DriverProfile::Postgres(d) => d.quote_ident(name),
            DriverProfile::Sqlite(d) => d.quote_ident(name),
        }
    }

    fn column_type(&self, ty: &SqlType) -> String {
        match self {
            DriverProfile::MySql(d) => d.column_type(ty),
            DriverProfile::Postgres(d) => d.column_type(ty),
            DriverProfile::Sqlite(d) => d.column_type(ty),
        }
    }

    fn auto_increment_column(&self, ty: &SqlType) -> String {
        match self {
            DriverProfile::MySql(d) => d.auto_increment_column(ty),
            DriverProfile::Postgres(d) => d.auto_increment_column(ty),
            DriverProfile::Sqlite(d) => d.auto_increment_column(ty),
        }
    }

    fn table_creation_option(&self) -> Option<&'static str> {
        match self {
            DriverProfile::MySql(d) => d.table_creation_option(),
            DriverProfile::Postgres(d) => d.table_creation_option(),
            DriverProfile::Sqlite(d) => d.table_creation_option(),
        }
    }

    fn requires_explicit_foreign_keys(&self) -> bool {
        match self {
            DriverProfile::MySql(d) => d.requires_explicit_foreign_keys(),
            DriverProfile::Postgres(d) => d.requires_explicit_foreign_keys(),
            DriverProfile::Sqlite(d) => d.requires_explicit_foreign_keys(),
        }
    }

    fn list_columns_query(&self) -> String {
        match self {
            DriverProfile::MySql(d) => d.list_columns_query(),
            DriverProfile::Postgres(d) => d.list_columns_query(),
            DriverProfile::Sqlite(d) => d.list_columns_query(),
        }
    }

    fn list_indexes_query(&self) -> String {
        match self {
            DriverProfile::MySql(d) => d.list_indexes_query(),
            DriverProfile::Postgres(d) => d.list_indexes_query(),
            DriverProfile::Sqlite(d) => d.list_indexes_query(),
        }
    }

    fn max_identifier_length(&self) -> usize {
        match self {
            DriverProfile::MySql(d) => d.max_identifier_length(),
            DriverProfile::Postgres(d) => d.max_identifier_length(),
            DriverProfile::Sqlite(d) => d.max_identifier_length(),
        }
    }

    fn uuid_default(&self) -> Option<&'static str> {
        match self {
            DriverProfile::MySql(d) => d.uuid_default(),
            DriverProfile::Postgres(d) => d.uuid_default(),
            DriverProfile::Sqlite(d) => d.uuid_default(),
        }
    }

    fn not_null_filler(&self, ty: &SqlType) -> &'static str {
        match self {
            DriverProfile::MySql(d) => d.not_null_filler(ty),
            DriverProfile::Postgres(d) => d.not_null_filler(ty),
            DriverProfile::Sqlite(d) => d.not_null_filler(ty),
        }
    }

    fn drop_table_sql(&self, table: &str) -> String {
        match self {
            DriverProfile::MySql(d) => d.drop_table_sql(table),
            DriverProfile::Postgres(d) => d.drop_table_sql(table),
            DriverProfile::Sqlite(d) => d.drop_table_sql(table),
        }
    }
}

/// Length of the hash suffix on shortened names.
const HASH_SUFFIX_LEN: usize = 8;

fn fit_identifier(name: &str, max_len: usize) -> String {
    if name.len() <= max_len {
        return name.to_string();
    }

    let digest = Sha256::digest(name.as_bytes());
    let suffix = hex::encode(&digest[..HASH_SUFFIX_LEN / 2]);

    let mut cut = max_len.saturating_sub(HASH_SUFFIX_LEN + 1);
    while !name.is_char_boundary(cut) {
        cut -= 1;
    }

    format!("{}_{}", &name[..cut], suffix)
}
