use super::{Dialect, Driver};
use crate::schema::SqlType;

/// PostgreSQL dialect.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PostgresDialect;

impl Dialect for PostgresDialect {
    fn driver(&self) -> Driver {
        Driver::Postgres
    }

    fn quote_ident(&self, name: &str) -> String {
        format!("\"{}\"", name.replace('"', "\"\""))
    }

    fn column_type(&self, ty: &SqlType) -> String {
        match ty {
            SqlType::Uuid => "UUID".to_string(),
            SqlType::Varchar(None) => "VARCHAR(255)".to_string(),
            SqlType::Varchar(Some(len)) => format!("VARCHAR({})", len),
            SqlType::Text => "TEXT".to_string(),
            SqlType::Integer => "INTEGER".to_string(),
            SqlType::BigInt => "BIGINT".to_string(),
            SqlType::Real => "REAL".to_string(),
            SqlType::DoublePrecision => "DOUBLE PRECISION".to_string(),
            SqlType::Boolean => "BOOLEAN".to_string(),
            SqlType::Timestamptz => "TIMESTAMPTZ".to_string(),
            SqlType::Date => "DATE".to_string(),
            SqlType::Decimal(p, s) => format!("DECIMAL({}, {})", p, s),
            SqlType::Jsonb => "JSONB".to_string(),
            SqlType::Bytea => "BYTEA".to_string(),
        }
    }

    fn auto_increment_column(&self, ty: &SqlType) -> String {
        let serial = match ty {
            SqlType::Integer => "SERIAL",
            _ => "BIGSERIAL",
        };
        format!("{} PRIMARY KEY", serial)
    }

    fn max_identifier_length(&self) -> usize {
        63
    }

    fn table_creation_option(&self) -> Option<&'static str> {
        None
    }

    fn requires_explicit_foreign_keys(&self) -> bool {
        true
    }

    fn list_columns_query(&self) -> String {
        "SELECT column_name::text FROM information_schema.columns \
         WHERE table_schema = current_schema() AND table_name = $1 ORDER BY ordinal_position"
            .to_string()
    }

    fn list_indexes_query(&self) -> String {
        "SELECT indexname::text FROM pg_indexes \
         WHERE schemaname = current_schema() AND tablename = $1"
            .to_string()
    }

    fn uuid_default(&self) -> Option<&'static str> {
        Some("gen_random_uuid()")
    }

    fn not_null_filler(&self, ty: &SqlType) -> &'static str {
        match ty {
            SqlType::Timestamptz => "NOW()",
            SqlType::Uuid => "gen_random_uuid()",
            SqlType::Jsonb => "'{}'::jsonb",
            SqlType::Bytea => "''::bytea",
            SqlType::Varchar(_) | SqlType::Text => "''",
            SqlType::Boolean => "false",
            SqlType::Date => "CURRENT_DATE",
            _ => "0",
        }
    }
}
