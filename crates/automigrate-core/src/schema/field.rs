use serde::{Deserialize, Serialize};

use super::types::{RustType, SqlType};
use crate::driver::Dialect;

/// Definition of a model field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldDef {
    /// Field name in Rust (snake_case).
    pub name: String,

    /// Column name in SQL (may differ from field name).
    pub column_name: String,

    /// Rust type.
    pub rust_type: RustType,

    /// SQL type.
    pub sql_type: SqlType,

    /// Whether the field is nullable.
    pub nullable: bool,

    /// Field attributes.
    pub attributes: Vec<FieldAttribute>,

    /// Default value expression (SQL).
    pub default: Option<String>,
}

impl FieldDef {
    /// Create a new field definition.
    pub fn new(name: &str, rust_type: RustType) -> Self {
        let sql_type = rust_type.to_sql_type();
        let nullable = rust_type.is_nullable();
        let column_name = to_snake_case(name);

        Self {
            name: name.to_string(),
            column_name,
            rust_type,
            sql_type,
            nullable,
            attributes: Vec::new(),
            default: None,
        }
    }

    /// Add an attribute. `MaxLength` narrows a VARCHAR column.
    pub fn with_attribute(mut self, attribute: FieldAttribute) -> Self {
        if let FieldAttribute::MaxLength(len) = attribute {
            if let SqlType::Varchar(_) = self.sql_type {
                self.sql_type = SqlType::Varchar(Some(len));
            }
        }
        self.attributes.push(attribute);
        self
    }

    /// Set the default value expression.
    pub fn with_default(mut self, default: impl Into<String>) -> Self {
        self.default = Some(default.into());
        self
    }

    /// Override the column name.
    pub fn with_column_name(mut self, column_name: impl Into<String>) -> Self {
        self.column_name = column_name.into();
        self
    }

    /// Check if this field is part of the primary key.
    pub fn is_primary_key(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, FieldAttribute::Id | FieldAttribute::IdAuto))
    }

    /// Check if this field is an auto-incrementing key.
    pub fn is_auto_increment(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, FieldAttribute::IdAuto))
    }

    /// Check if this field is indexed.
    pub fn is_indexed(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, FieldAttribute::Indexed))
    }

    /// Check if this field is unique.
    pub fn is_unique(&self) -> bool {
        self.attributes
            .iter()
            .any(|a| matches!(a, FieldAttribute::Unique))
    }

    /// Generate the SQL column definition.
    ///
    /// `inline_primary_key` is false when the table declares a composite key,
    /// in which case the key is emitted as a table constraint instead.
    pub fn to_sql_column<D: Dialect + ?Sized>(&self, dialect: &D, inline_primary_key: bool) -> String {
        let column = dialect.quote_ident(&self.column_name);
        let primary_key = inline_primary_key && self.is_primary_key();

        if primary_key && self.is_auto_increment() {
            return format!("{} {}", column, dialect.auto_increment_column(&self.sql_type));
        }

        let mut parts = vec![column, dialect.column_type(&self.sql_type)];

        if primary_key {
            parts.push("PRIMARY KEY".to_string());
        } else if !self.nullable {
            parts.push("NOT NULL".to_string());
        }

        if self.is_unique() && !primary_key {
            parts.push("UNIQUE".to_string());
        }

        if let Some(ref default) = self.default {
            parts.push(format!("DEFAULT {}", default));
        } else if primary_key && matches!(self.sql_type, SqlType::Uuid) {
            if let Some(generator) = dialect.uuid_default() {
                parts.push(format!("DEFAULT {}", generator));
            }
        }

        parts.join(" ")
    }
}

/// Field attributes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldAttribute {
    /// Primary key column.
    Id,
    /// Auto-incrementing primary key.
    IdAuto,
    /// Create an index on this field.
    Indexed,
    /// Unique constraint.
    Unique,
    /// Maximum length for strings.
    MaxLength(u32),
}

/// Convert a string to snake_case.
pub(crate) fn to_snake_case(s: &str) -> String {
    let mut result = String::new();
    for (i, c) in s.chars().enumerate() {
        if c.is_uppercase() {
            if i > 0 {
                result.push('_');
            }
            result.extend(c.to_lowercase());
        } else {
            result.push(c);
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::driver::Driver;

    #[test]
    fn test_field_def_basic() {
        let field = FieldDef::new("email", RustType::String);
        assert_eq!(field.name, "email");
        assert_eq!(field.column_name, "email");
        assert!(!field.nullable);
    }

    #[test]
    fn test_field_def_nullable() {
        let field = FieldDef::new("avatar_url", RustType::Option(Box::new(RustType::String)));
        assert!(field.nullable);
    }

    #[test]
    fn test_max_length_narrows_varchar() {
        let field = FieldDef::new("email", RustType::String).with_attribute(FieldAttribute::MaxLength(100));
        assert_eq!(field.sql_type, SqlType::Varchar(Some(100)));

        let field = FieldDef::new("age", RustType::I32).with_attribute(FieldAttribute::MaxLength(100));
        assert_eq!(field.sql_type, SqlType::Integer);
    }

    #[test]
    fn test_uuid_primary_key_postgres() {
        let field = FieldDef::new("id", RustType::Uuid).with_attribute(FieldAttribute::Id);
        let sql = field.to_sql_column(&Driver::Postgres.profile(), true);
        assert_eq!(sql, "\"id\" UUID PRIMARY KEY DEFAULT gen_random_uuid()");

        let sql = field.to_sql_column(&Driver::MySql.profile(), true);
        assert_eq!(sql, "`id` CHAR(36) PRIMARY KEY");
    }

    #[test]
    fn test_auto_increment_key() {
        let field = FieldDef::new("id", RustType::I64).with_attribute(FieldAttribute::IdAuto);
        assert_eq!(
            field.to_sql_column(&Driver::Sqlite.profile(), true),
            "\"id\" INTEGER PRIMARY KEY AUTOINCREMENT"
        );
        assert_eq!(
            field.to_sql_column(&Driver::MySql.profile(), true),
            "`id` BIGINT AUTO_INCREMENT PRIMARY KEY"
        );
    }

    #[test]
    fn test_composite_key_member_is_not_inline() {
        let field = FieldDef::new("user_id", RustType::I64).with_attribute(FieldAttribute::Id);
        assert_eq!(
            field.to_sql_column(&Driver::Postgres.profile(), false),
            "\"user_id\" BIGINT NOT NULL"
        );
    }

    #[test]
    fn test_unique_with_default() {
        let field = FieldDef::new("email", RustType::String)
            .with_attribute(FieldAttribute::Unique)
            .with_default("''");
        assert_eq!(
            field.to_sql_column(&Driver::Postgres.profile(), true),
            "\"email\" VARCHAR(255) NOT NULL UNIQUE DEFAULT ''"
        );
    }

    #[test]
    fn test_to_snake_case() {
        assert_eq!(to_snake_case("createdAt"), "created_at");
        assert_eq!(to_snake_case("userId"), "user_id");
        assert_eq!(to_snake_case("HTTPServer"), "h_t_t_p_server");
    }
}
