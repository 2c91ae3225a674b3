use serde::Serialize;

use automigrate_core::driver::Dialect;
use automigrate_core::schema::{FieldAttribute, FieldDef, ForeignKeyDef, IndexDef, TableDef};

/// Additive changes bringing one live table in line with its definition.
///
/// Only missing tables, columns and indexes are produced. Existing columns
/// are never altered or dropped, whatever their current type.
#[derive(Debug, Clone, Serialize)]
pub struct SchemaDiff {
    /// Changes to be applied.
    pub entries: Vec<DiffEntry>,
}

impl SchemaDiff {
    /// Create an empty diff.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Compare a table definition to its live counterpart, if any.
    pub fn from_comparison<D: Dialect + ?Sized>(
        table: &TableDef,
        live: Option<&DatabaseTable>,
        dialect: &D,
    ) -> Self {
        let mut entries = Vec::new();

        match live {
            None => {
                entries.push(DiffEntry::create_table(table, dialect));
                for index in table.all_indexes() {
                    entries.push(DiffEntry::create_index(&table.name, &index, dialect));
                }
            }
            Some(db) => {
                for field in &table.fields {
                    if !db.has_column(&field.column_name) {
                        entries.push(DiffEntry::add_column(&table.name, field, dialect));
                        if field.is_unique() && !field.is_primary_key() {
                            let index = unique_column_index(&table.name, field);
                            entries.push(DiffEntry::create_index(&table.name, &index, dialect));
                        }
                    }
                }

                for index in table.all_indexes() {
                    if !db.has_index(&index.index_name_for(&table.name, dialect)) {
                        entries.push(DiffEntry::create_index(&table.name, &index, dialect));
                    }
                }
            }
        }

        Self { entries }
    }

    /// Check if there are any changes.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for SchemaDiff {
    fn default() -> Self {
        Self::new()
    }
}

/// A single schema change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DiffEntry {
    /// What the change does.
    pub action: DiffAction,
    /// Affected table name.
    pub table_name: String,
    /// Human-readable description.
    pub details: String,
    /// SQL to apply.
    pub sql: String,
}

impl DiffEntry {
    pub fn drop_table<D: Dialect + ?Sized>(table_name: &str, dialect: &D) -> Self {
        Self {
            action: DiffAction::DropTable,
            table_name: table_name.to_string(),
            details: format!("Drop table {}", table_name),
            sql: dialect.drop_table_sql(table_name),
        }
    }

    pub fn create_table<D: Dialect + ?Sized>(table: &TableDef, dialect: &D) -> Self {
        // Inline foreign keys only exist where there is no constraint step.
        let references = if dialect.requires_explicit_foreign_keys() {
            Vec::new()
        } else {
            table
                .foreign_keys
                .iter()
                .map(|fk| fk.references.clone())
                .collect()
        };

        Self {
            action: DiffAction::CreateTable {
                columns: table.column_names().into_iter().map(String::from).collect(),
                references,
            },
            table_name: table.name.clone(),
            details: format!("Create table {}", table.name),
            sql: table.to_create_table_sql(dialect),
        }
    }

    pub fn add_column<D: Dialect + ?Sized>(table_name: &str, field: &FieldDef, dialect: &D) -> Self {
        Self {
            action: DiffAction::AddColumn {
                column: field.column_name.clone(),
            },
            table_name: table_name.to_string(),
            details: format!("Add column {}", field.column_name),
            sql: add_column_sql(table_name, field, dialect),
        }
    }

    pub fn create_index<D: Dialect + ?Sized>(table_name: &str, index: &IndexDef, dialect: &D) -> Self {
        let name = index.index_name_for(table_name, dialect);
        Self {
            details: format!("Create index {}", name),
            action: DiffAction::AddIndex { index: name },
            table_name: table_name.to_string(),
            sql: index.to_create_index_sql(table_name, dialect),
        }
    }

    pub fn add_foreign_key<D: Dialect + ?Sized>(
        table_name: &str,
        foreign_key: &ForeignKeyDef,
        dialect: &D,
    ) -> Self {
        let constraint = foreign_key.constraint_name_for(table_name, dialect);
        Self {
            details: format!(
                "Add foreign key {} referencing {}",
                constraint, foreign_key.references
            ),
            action: DiffAction::AddForeignKey {
                constraint,
                references: foreign_key.references.clone(),
            },
            table_name: table_name.to_string(),
            sql: foreign_key.to_add_constraint_sql(table_name, dialect),
        }
    }

    /// The kind of change, without its payload.
    pub fn kind(&self) -> ChangeKind {
        match self.action {
            DiffAction::DropTable => ChangeKind::DropTable,
            DiffAction::CreateTable { .. } => ChangeKind::CreateTable,
            DiffAction::AddColumn { .. } => ChangeKind::AddColumn,
            DiffAction::AddIndex { .. } => ChangeKind::AddIndex,
            DiffAction::AddForeignKey { .. } => ChangeKind::AddForeignKey,
        }
    }
}

/// Unique index standing in for a `UNIQUE` clause on an added column.
fn unique_column_index(table_name: &str, field: &FieldDef) -> IndexDef {
    IndexDef::new(vec![field.column_name.clone()])
        .unique()
        .named(format!("uq_{}_{}", table_name, field.column_name))
}

fn add_column_sql<D: Dialect + ?Sized>(table_name: &str, field: &FieldDef, dialect: &D) -> String {
    // SQLite cannot add a UNIQUE column; uniqueness comes from a separate index.
    let mut field = field.clone();
    field.attributes.retain(|a| *a != FieldAttribute::Unique);

    if !field.nullable && field.default.is_none() {
        // Existing rows need a value for the new NOT NULL column.
        field.default = Some(dialect.not_null_filler(&field.sql_type).to_string());
    }
    let column = field.to_sql_column(dialect, false);

    format!(
        "ALTER TABLE {} ADD COLUMN {}",
        dialect.quote_ident(table_name),
        column
    )
}

/// Type of schema change, with the objects it touches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum DiffAction {
    DropTable,
    CreateTable {
        columns: Vec<String>,
        /// Tables referenced by inline foreign keys.
        references: Vec<String>,
    },
    AddColumn {
        column: String,
    },
    AddIndex {
        index: String,
    },
    AddForeignKey {
        constraint: String,
        references: String,
    },
}

/// Discriminant of [`DiffAction`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChangeKind {
    DropTable,
    CreateTable,
    AddColumn,
    AddIndex,
    AddForeignKey,
}

/// Representation of a database table (from introspection).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatabaseTable {
    pub name: String,
    pub columns: Vec<String>,
    pub indexes: Vec<String>,
}

impl DatabaseTable {
    pub fn has_column(&self, name: &str) -> bool {
        self.columns.iter().any(|c| c.eq_ignore_ascii_case(name))
    }

    pub fn has_index(&self, name: &str) -> bool {
        self.indexes.iter().any(|i| i == name)
    }
}
