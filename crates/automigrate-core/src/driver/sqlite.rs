use super::{Dialect, Driver};
use crate::schema::SqlType;

/// SQLite dialect. Foreign keys only exist as part of CREATE TABLE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SqliteDialect;

impl Dialect for SqliteDialect {
    fn driver(&self) -> Driver {
        Driver::Sqlite
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn column_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::Uuid | SqlType::Text | SqlType::Jsonb => "TEXT".to_string(),
            SqlType::Varchar(None) => "VARCHAR(255)".to_string(),
            SqlType::Varchar(Some(len)) => format!("VARCHAR({})", len),
            SqlType::Integer | SqlType::BigInt => "INTEGER".to_string(),
            SqlType::Real | SqlType::DoublePrecision => "REAL".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamptz => "DATETIME".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
            SqlType::Bytea => "BLOB".to_string(),
        }
    }

    fn auto_increment_column(&self, _ty: &SqlType) -> String {
        // Only INTEGER PRIMARY KEY aliases the rowid.
        "INTEGER PRIMARY KEY AUTOINCREMENT".to_string()
    }

    fn max_identifier_length(&self) -> usize {
        usize::MAX
    }

    fn table_creation_option(&self) -> Option<&'static str> {
        None
    }

    fn requires_explicit_foreign_keys(&self) -> bool {
        false
    }

    fn list_columns_query(&self) -> String {
        "SELECT name FROM pragma_table_info(?) ORDER BY cid".to_string()
    }

    fn list_indexes_query(&self) -> String {
        "SELECT name FROM pragma_index_list(?)".to_string()
    }

    fn not_null_filler(&self, ty: &SqlType) -> &'static str {
        match ty {
            // ALTER TABLE ADD COLUMN rejects non-constant defaults.
            SqlType::Timestamptz => "'1970-01-01 00:00:00'",
            SqlType::Date => "'1970-01-01'",
            SqlType::Boolean => "0",
            SqlType::Varchar(_) | SqlType::Text | SqlType::Uuid => "''",
            SqlType::Jsonb => "'{}'",
            SqlType::Bytea => "X''",
            _ => "0",
        }
    }
}
