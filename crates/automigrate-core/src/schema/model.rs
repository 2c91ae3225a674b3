use serde::{Deserialize, Serialize};

use super::field::FieldDef;
use crate::driver::Dialect;

/// A table definition: columns, indexes and the foreign keys it holds.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableDef {
    /// Table name in SQL.
    pub name: String,

    /// Column definitions in declaration order.
    pub fields: Vec<FieldDef>,

    /// Declared indexes.
    #[serde(default)]
    pub indexes: Vec<IndexDef>,

    /// Foreign keys held by this table.
    #[serde(default)]
    pub foreign_keys: Vec<ForeignKeyDef>,

    /// Tables that must exist first even without a foreign key.
    #[serde(default)]
    pub depends_on: Vec<String>,
}

impl TableDef {
    /// Create an empty table definition.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
            indexes: Vec::new(),
            foreign_keys: Vec::new(),
            depends_on: Vec::new(),
        }
    }

    pub fn with_field(mut self, field: FieldDef) -> Self {
        self.fields.push(field);
        self
    }

    pub fn with_index(mut self, index: IndexDef) -> Self {
        self.indexes.push(index);
        self
    }

    pub fn with_foreign_key(mut self, foreign_key: ForeignKeyDef) -> Self {
        self.foreign_keys.push(foreign_key);
        self
    }

    pub fn depends_on(mut self, table: impl Into<String>) -> Self {
        self.depends_on.push(table.into());
        self
    }

    /// Look up a field by column name.
    pub fn column(&self, column_name: &str) -> Option<&FieldDef> {
        self.fields.iter().find(|f| f.column_name == column_name)
    }

    /// All column names in declaration order.
    pub fn column_names(&self) -> Vec<&str> {
        self.fields.iter().map(|f| f.column_name.as_str()).collect()
    }

    /// Fields forming the primary key.
    pub fn primary_key(&self) -> Vec<&FieldDef> {
        self.fields.iter().filter(|f| f.is_primary_key()).collect()
    }

    /// Names of the tables this table depends on, without duplicates or itself.
    pub fn dependencies(&self) -> Vec<&str> {
        let mut deps: Vec<&str> = Vec::new();
        let referenced = self.foreign_keys.iter().map(|fk| fk.references.as_str());
        for dep in referenced.chain(self.depends_on.iter().map(String::as_str)) {
            if dep != self.name && !deps.contains(&dep) {
                deps.push(dep);
            }
        }
        deps
    }

    /// Declared indexes plus single-column indexes for `Indexed` fields.
    pub fn all_indexes(&self) -> Vec<IndexDef> {
        let mut indexes = self.indexes.clone();
        for field in self.fields.iter().filter(|f| f.is_indexed()) {
            let covered = indexes
                .iter()
                .any(|idx| idx.columns.len() == 1 && idx.columns[0] == field.column_name);
            if !covered {
                indexes.push(IndexDef::new(vec![field.column_name.clone()]));
            }
        }
        indexes
    }

    /// Generate CREATE TABLE for the given dialect.
    ///
    /// Foreign keys are declared inline only for dialects that have no
    /// separate constraint step.
    pub fn to_create_table_sql<D: Dialect + ?Sized>(&self, dialect: &D) -> String {
        let primary_key = self.primary_key();
        let inline_primary_key = primary_key.len() <= 1;

        let mut definitions: Vec<String> = self
            .fields
            .iter()
            .map(|f| f.to_sql_column(dialect, inline_primary_key))
            .collect();

        if !inline_primary_key {
            let columns: Vec<String> = primary_key
                .iter()
                .map(|f| dialect.quote_ident(&f.column_name))
                .collect();
            definitions.push(format!("PRIMARY KEY ({})", columns.join(", ")));
        }

        if !dialect.requires_explicit_foreign_keys() {
            for fk in &self.foreign_keys {
                definitions.push(fk.to_constraint_clause(&self.name, dialect));
            }
        }

        let mut sql = format!(
            "CREATE TABLE {} (\n    {}\n)",
            dialect.quote_ident(&self.name),
            definitions.join(",\n    ")
        );

        if let Some(option) = dialect.table_creation_option() {
            sql.push(' ');
            sql.push_str(option);
        }

        sql
    }
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IndexDef {
    /// Explicit index name. Defaults to `idx_<table>_<columns>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Indexed column names.
    pub columns: Vec<String>,

    /// Whether the index enforces uniqueness.
    #[serde(default)]
    pub unique: bool,
}

impl IndexDef {
    pub fn new(columns: Vec<String>) -> Self {
        Self {
            name: None,
            columns,
            unique: false,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    /// Resolved index name on `table`.
    pub fn index_name(&self, table: &str) -> String {
        match self.name {
            Some(ref name) => name.clone(),
            None => format!("idx_{}_{}", table, self.columns.join("_")),
        }
    }

    /// Index name as the engine stores it.
    pub fn index_name_for<D: Dialect + ?Sized>(&self, table: &str, dialect: &D) -> String {
        dialect.identifier(&self.index_name(table))
    }

    /// Generate CREATE INDEX.
    pub fn to_create_index_sql<D: Dialect + ?Sized>(&self, table: &str, dialect: &D) -> String {
        let columns: Vec<String> = self.columns.iter().map(|c| dialect.quote_ident(c)).collect();
        format!(
            "CREATE {}INDEX {} ON {} ({})",
            if self.unique { "UNIQUE " } else { "" },
            dialect.quote_ident(&self.index_name_for(table, dialect)),
            dialect.quote_ident(table),
            columns.join(", ")
        )
    }
}

/// A foreign key held by a table, pointing at another table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ForeignKeyDef {
    /// Explicit constraint name. Defaults to `fk_<table>_<column>`.
    #[serde(default)]
    pub name: Option<String>,

    /// Local column holding the reference.
    pub column: String,

    /// Referenced table.
    pub references: String,

    /// Referenced column.
    #[serde(default = "default_references_column")]
    pub references_column: String,

    #[serde(default)]
    pub on_delete: Option<ReferentialAction>,

    #[serde(default)]
    pub on_update: Option<ReferentialAction>,
}

fn default_references_column() -> String {
    "id".to_string()
}

impl ForeignKeyDef {
    pub fn new(column: impl Into<String>, references: impl Into<String>) -> Self {
        Self {
            name: None,
            column: column.into(),
            references: references.into(),
            references_column: default_references_column(),
            on_delete: None,
            on_update: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn references_column(mut self, column: impl Into<String>) -> Self {
        self.references_column = column.into();
        self
    }

    pub fn on_delete(mut self, action: ReferentialAction) -> Self {
        self.on_delete = Some(action);
        self
    }

    pub fn on_update(mut self, action: ReferentialAction) -> Self {
        self.on_update = Some(action);
        self
    }

    /// Resolved constraint name on `table`.
    pub fn constraint_name(&self, table: &str) -> String {
        match self.name {
            Some(ref name) => name.clone(),
            None => format!("fk_{}_{}", table, self.column),
        }
    }

    /// Constraint name as the engine stores it.
    pub fn constraint_name_for<D: Dialect + ?Sized>(&self, table: &str, dialect: &D) -> String {
        dialect.identifier(&self.constraint_name(table))
    }

    /// `CONSTRAINT .. FOREIGN KEY .. REFERENCES ..` clause.
    pub fn to_constraint_clause<D: Dialect + ?Sized>(&self, table: &str, dialect: &D) -> String {
        let mut clause = format!(
            "CONSTRAINT {} FOREIGN KEY ({}) REFERENCES {} ({})",
            dialect.quote_ident(&self.constraint_name_for(table, dialect)),
            dialect.quote_ident(&self.column),
            dialect.quote_ident(&self.references),
            dialect.quote_ident(&self.references_column)
        );
        if let Some(action) = self.on_delete {
            clause.push_str(&format!(" ON DELETE {}", action.to_sql()));
        }
        if let Some(action) = self.on_update {
            clause.push_str(&format!(" ON UPDATE {}", action.to_sql()));
        }
        clause
    }

    /// Generate ALTER TABLE .. ADD CONSTRAINT.
    pub fn to_add_constraint_sql<D: Dialect + ?Sized>(&self, table: &str, dialect: &D) -> String {
        format!(
            "ALTER TABLE {} ADD {}",
            dialect.quote_ident(table),
            self.to_constraint_clause(table, dialect)
        )
    }
}

/// Action taken on referencing rows when the referenced row changes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReferentialAction {
    Cascade,
    SetNull,
    SetDefault,
    Restrict,
    NoAction,
}

impl ReferentialAction {
    pub fn to_sql(&self) -> &'static str {
        match self {
            ReferentialAction::Cascade => "CASCADE",
            ReferentialAction::SetNull => "SET NULL",
            ReferentialAction::SetDefault => "SET DEFAULT",
            ReferentialAction::Restrict => "RESTRICT",
            ReferentialAction::NoAction => "NO ACTION",
        }
    }
}
