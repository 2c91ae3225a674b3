use super::{Dialect, Driver};
use crate::schema::SqlType;

/// MySQL / MariaDB dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MySqlDialect;

impl Dialect for MySqlDialect {
    fn driver(&self) -> Driver {
        Driver::MySql
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("`{}`", name.replace('`', "``"))
    }

    fn column_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::Uuid => "CHAR(36)".to_string(),
            SqlType::Varchar(None) => "VARCHAR(255)".to_string(),
            SqlType::Varchar(Some(len)) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Integer => "INT".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "FLOAT".to_string(),
            SqlType::DoublePrecision => "DOUBLE".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamptz => "DATETIME(3)".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
            SqlType::Jsonb => "JSON".to_string(),
            SqlType::Bytea => "LONGBLOB".to_string(),
        }
    }

    fn auto_increment_column(&self, ty: &SqlType) -> String {
        format!("{} AUTO_INCREMENT PRIMARY KEY", self.column_type(ty))
    }

    fn max_identifier_length(&self) -> usize {
        64
    }

    fn table_creation_option(&self) -> Option<&'static str> {
        Some("ENGINE=InnoDB")
    }

    fn requires_explicit_foreign_keys(&self) -> bool {
        true
    }

    fn list_columns_query(&self) -> String {
        "SELECT CAST(COLUMN_NAME AS CHAR) FROM information_schema.COLUMNS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ? ORDER BY ORDINAL_POSITION"
            .to_string()
    }

    fn list_indexes_query(&self) -> String {
        "SELECT DISTINCT CAST(INDEX_NAME AS CHAR) FROM information_schema.STATISTICS \
         WHERE TABLE_SCHEMA = DATABASE() AND TABLE_NAME = ?"
            .to_string()
    }

    fn not_null_filler(&self, ty: &SqlType) -> &'static str {
        match ty {
            SqlType::Varchar(_) | SqlType::Uuid => "''",
            // TEXT, BLOB and JSON only accept parenthesized expression defaults.
            SqlType::Text | SqlType::Bytea => "('')",
            SqlType::Jsonb => "('{}')",
            SqlType::Integer | SqlType::BigInt | SqlType::Decimal(_, _) => "0",
            SqlType::Real | SqlType::DoublePrecision => "0",
            SqlType::Boolean => "false",
            // DATETIME(3) rejects a default with a different precision.
            SqlType::Timestamptz => "CURRENT_TIMESTAMP(3)",
            SqlType::Date => "(CURRENT_DATE)",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_quote_ident_escapes_backticks() {
        assert_eq!(MySqlDialect.quote_ident("users"), "`users`");
        assert_eq!(MySqlDialect.quote_ident("we`ird"), "`we``ird`");
    }

    #[test]
    fn test_column_types() {
        assert_eq!(MySqlDialect.column_type(&SqlType::Uuid), "CHAR(36)");
        assert_eq!(MySqlDialect.column_type(&SqlType::Jsonb), "JSON");
        assert_eq!(
            MySqlDialect.auto_increment_column(&SqlType::BigInt),
            "BIGINT AUTO_INCREMENT PRIMARY KEY"
        );
    }
}
