//! Table declarations read from a TOML schema file.
//!
//! ```toml
//! [[tables]]
//! name = "posts"
//!
//! [[tables.fields]]
//! name = "id"
//! type = "i64"
//! attributes = ["id_auto"]
//!
//! [[tables.fields]]
//! name = "title"
//! type = "String"
//! attributes = [{ max_length = 200 }]
//!
//! [[tables.foreign_keys]]
//! column = "id_auth"
//! references = "auths"
//! references_column = "auth_id"
//! on_delete = "cascade"
//! ```

use std::path::Path;

use serde::Deserialize;
use tracing::debug;

use super::field::{FieldAttribute, FieldDef};
use super::model::{ForeignKeyDef, IndexDef, TableDef};
use super::registry::ModelRegistry;
use super::types::RustType;
use crate::error::{Result, SyncError};

/// Root of a schema declaration file.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SchemaFile {
    #[serde(default)]
    pub tables: Vec<TableSpec>,
}

/// One `[[tables]]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TableSpec {
    pub name: String,

    #[serde(default)]
    pub depends_on: Vec<String>,

    #[serde(default)]
    pub fields: Vec<FieldSpec>,

    #[serde(default)]
    pub indexes: Vec<IndexDef>,

    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,
}

/// One `[[tables.fields]]` entry.
#[derive(Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldSpec {
    pub name: String,

    /// Rust type string, e.g. `Option<String>`.
    #[serde(rename = "type")]
    pub rust_type: String,

    /// Column name override.
    #[serde(default)]
    pub column: Option<String>,

    #[serde(default)]
    pub attributes: Vec<FieldAttribute>,

    #[serde(default)]
    pub default: Option<String>,
}

impl SchemaFile {
    /// Load a schema file from disk.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| {
            SyncError::Config(format!("Failed to read schema file {}: {}", path.display(), e))
        })?;

        Self::parse_toml(&content)
    }

    /// Parse a schema from a TOML string.
    pub fn parse_toml(content: &str) -> Result<Self> {
        toml::from_str(content)
            .map_err(|e| SyncError::Config(format!("Failed to parse schema: {}", e)))
    }

    /// Convert declarations into table definitions.
    pub fn into_tables(self) -> Result<Vec<TableDef>> {
        self.tables.into_iter().map(TableSpec::into_table).collect()
    }

    /// Convert declarations and build a validated registry.
    pub fn into_registry(self) -> Result<ModelRegistry> {
        let tables = self.into_tables()?;
        debug!("Loaded {} table declarations", tables.len());
        ModelRegistry::from_tables(tables)
    }
}

impl TableSpec {
    fn into_table(self) -> Result<TableDef> {
        let mut table = TableDef::new(self.name);
        for spec in self.fields {
            table.fields.push(spec.into_field(&table.name)?);
        }
        table.indexes = self.indexes;
        table.foreign_keys = self.foreign_keys;
        table.depends_on = self.depends_on;
        Ok(table)
    }
}

impl FieldSpec {
    fn into_field(self, table: &str) -> Result<FieldDef> {
        let rust_type = RustType::from_type_string(&self.rust_type).ok_or_else(|| {
            SyncError::Validation(format!(
                "Field '{}.{}' has unsupported type '{}'",
                table, self.name, self.rust_type
            ))
        })?;

        let mut field = self
            .attributes
            .into_iter()
            .fold(FieldDef::new(&self.name, rust_type), FieldDef::with_attribute);

        if let Some(column) = self.column {
            field = field.with_column_name(column);
        }
        if let Some(default) = self.default {
            field = field.with_default(default);
        }

        Ok(field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::model::ReferentialAction;
    use crate::schema::types::SqlType;
    use std::fs;
    use tempfile::TempDir;

    const SCHEMA: &str = r#"
        [[tables]]
        name = "posts"

        [[tables.fields]]
        name = "postId"
        type = "i64"
        attributes = ["id_auto"]

        [[tables.fields]]
        name = "title"
        type = "String"
        attributes = [{ max_length = 200 }, "indexed"]

        [[tables.fields]]
        name = "body"
        type = "Option<String>"

        [[tables.fields]]
        name = "id_auth"
        type = "i64"

        [[tables.foreign_keys]]
        column = "id_auth"
        references = "auths"
        references_column = "auth_id"
        on_delete = "cascade"

        [[tables]]
        name = "auths"

        [[tables.fields]]
        name = "auth_id"
        type = "i64"
        attributes = ["id_auto"]

        [[tables.fields]]
        name = "email"
        type = "String"
        attributes = ["unique"]
        default = "''"
    "#;

    #[test]
    fn test_parse_schema() {
        let tables = SchemaFile::parse_toml(SCHEMA).unwrap().into_tables().unwrap();
        assert_eq!(tables.len(), 2);

        let posts = &tables[0];
        assert_eq!(posts.fields[0].column_name, "post_id");
        assert!(posts.fields[0].is_auto_increment());
        assert_eq!(posts.fields[1].sql_type, SqlType::Varchar(Some(200)));
        assert!(posts.fields[1].is_indexed());
        assert!(posts.fields[2].nullable);
        assert_eq!(posts.foreign_keys[0].references_column, "auth_id");
        assert_eq!(posts.foreign_keys[0].on_delete, Some(ReferentialAction::Cascade));

        let auths = &tables[1];
        assert!(auths.fields[1].is_unique());
        assert_eq!(auths.fields[1].default.as_deref(), Some("''"));
    }

    #[test]
    fn test_schema_into_registry_orders_tables() {
        let registry = SchemaFile::parse_toml(SCHEMA).unwrap().into_registry().unwrap();
        let order: Vec<&str> = registry.create_order().iter().map(|t| t.name.as_str()).collect();
        assert_eq!(order, vec!["auths", "posts"]);
    }

    #[test]
    fn test_unsupported_type() {
        let schema = r#"
            [[tables]]
            name = "widgets"

            [[tables.fields]]
            name = "shape"
            type = "Shape"
        "#;
        let err = SchemaFile::parse_toml(schema).unwrap().into_tables().unwrap_err();
        assert!(err.to_string().contains("widgets.shape"));
    }

    #[test]
    fn test_unknown_keys_are_rejected() {
        let schema = r#"
            [[tables]]
            name = "widgets"
            colour = "blue"
        "#;
        assert!(matches!(
            SchemaFile::parse_toml(schema),
            Err(SyncError::Config(_))
        ));
    }

    #[test]
    fn test_from_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("schema.toml");
        fs::write(&path, SCHEMA).unwrap();

        let schema = SchemaFile::from_file(&path).unwrap();
        assert_eq!(schema.tables.len(), 2);

        assert!(SchemaFile::from_file(dir.path().join("missing.toml")).is_err());
    }
}
