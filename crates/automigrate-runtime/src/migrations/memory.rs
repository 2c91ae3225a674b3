use std::collections::BTreeMap;

use tokio::sync::Mutex;

use automigrate_core::error::{Result, SyncError};

use super::diff::{ChangeKind, DatabaseTable, DiffAction, DiffEntry};
use super::executor::{BoxFuture, SchemaExecutor};

/// In-memory DDL engine.
///
/// Tracks tables, columns, indexes and foreign-key references, and rejects
/// changes a real engine would reject: duplicate objects, references to
/// missing tables, and dropping a table another table still references.
/// Used to preview a run and to exercise the orchestrator without a server.
#[derive(Debug, Default)]
pub struct MemoryExecutor {
    state: Mutex<MemoryState>,
}

#[derive(Debug, Default)]
struct MemoryState {
    tables: BTreeMap<String, MemoryTable>,
    applied: Vec<DiffEntry>,
    failures: Vec<InjectedFailure>,
}

#[derive(Debug, Default)]
struct MemoryTable {
    columns: Vec<String>,
    indexes: Vec<String>,
    constraints: Vec<String>,
    /// Tables referenced by this table's foreign keys.
    references: Vec<String>,
}

#[derive(Debug)]
struct InjectedFailure {
    table: String,
    kind: ChangeKind,
    message: String,
}

impl MemoryExecutor {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed an existing table.
    pub fn with_table<I, S>(mut self, name: &str, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let table = MemoryTable {
            columns: columns.into_iter().map(Into::into).collect(),
            ..Default::default()
        };
        self.state.get_mut().tables.insert(name.to_string(), table);
        self
    }

    /// Make every change of `kind` on `table` fail with `message`.
    pub fn fail_on(mut self, table: &str, kind: ChangeKind, message: impl Into<String>) -> Self {
        self.state.get_mut().failures.push(InjectedFailure {
            table: table.to_string(),
            kind,
            message: message.into(),
        });
        self
    }

    /// Existing table names, sorted.
    pub async fn table_names(&self) -> Vec<String> {
        self.state.lock().await.tables.keys().cloned().collect()
    }

    pub async fn columns(&self, table: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map(|t| t.columns.clone())
    }

    pub async fn constraints(&self, table: &str) -> Option<Vec<String>> {
        self.state
            .lock()
            .await
            .tables
            .get(table)
            .map(|t| t.constraints.clone())
    }

    /// Every successfully applied change, in order.
    pub async fn applied(&self) -> Vec<DiffEntry> {
        self.state.lock().await.applied.clone()
    }
}

impl MemoryState {
    fn apply(&mut self, entry: &DiffEntry) -> Result<()> {
        if let Some(failure) = self
            .failures
            .iter()
            .find(|f| f.table == entry.table_name && f.kind == entry.kind())
        {
            return Err(SyncError::Database(failure.message.clone()));
        }

        let name = entry.table_name.as_str();
        match &entry.action {
            DiffAction::DropTable => {
                if let Some((other, _)) = self
                    .tables
                    .iter()
                    .find(|(other, t)| other.as_str() != name && t.references.iter().any(|r| r == name))
                {
                    return Err(SyncError::Database(format!(
                        "cannot drop table {} because table {} references it",
                        name, other
                    )));
                }
                self.tables.remove(name);
            }
            DiffAction::CreateTable {
                columns,
                references,
            } => {
                if self.tables.contains_key(name) {
                    return Err(SyncError::Database(format!("table {} already exists", name)));
                }
                self.require_referenced(name, references.iter())?;
                self.tables.insert(
                    name.to_string(),
                    MemoryTable {
                        columns: columns.clone(),
                        references: references.clone(),
                        ..Default::default()
                    },
                );
            }
            DiffAction::AddColumn { column } => {
                let table = self.table_mut(name)?;
                if table.columns.contains(column) {
                    return Err(SyncError::Database(format!(
                        "duplicate column {} on table {}",
                        column, name
                    )));
                }
                table.columns.push(column.clone());
            }
            DiffAction::AddIndex { index } => {
                let table = self.table_mut(name)?;
                if table.indexes.contains(index) {
                    return Err(SyncError::Database(format!("index {} already exists", index)));
                }
                table.indexes.push(index.clone());
            }
            DiffAction::AddForeignKey {
                constraint,
                references,
            } => {
                self.require_referenced(name, std::iter::once(references))?;
                let table = self.table_mut(name)?;
                if table.constraints.contains(constraint) {
                    return Err(SyncError::Database(format!(
                        "constraint {} already exists",
                        constraint
                    )));
                }
                table.constraints.push(constraint.clone());
                table.references.push(references.clone());
            }
        }

        self.applied.push(entry.clone());
        Ok(())
    }

    fn table_mut(&mut self, name: &str) -> Result<&mut MemoryTable> {
        self.tables
            .get_mut(name)
            .ok_or_else(|| SyncError::Database(format!("table {} does not exist", name)))
    }

    fn require_referenced<'a>(
        &self,
        name: &str,
        references: impl Iterator<Item = &'a String>,
    ) -> Result<()> {
        for referenced in references {
            if referenced != name && !self.tables.contains_key(referenced) {
                return Err(SyncError::Database(format!(
                    "table {} references missing table {}",
                    name, referenced
                )));
            }
        }
        Ok(())
    }
}

impl SchemaExecutor for MemoryExecutor {
    fn introspect<'a>(&'a self, table: &'a str) -> BoxFuture<'a, Result<Option<DatabaseTable>>> {
        Box::pin(async move {
            let state = self.state.lock().await;
            Ok(state.tables.get(table).map(|t| DatabaseTable {
                name: table.to_string(),
                columns: t.columns.clone(),
                indexes: t.indexes.clone(),
            }))
        })
    }

    fn apply<'a>(&'a self, entry: &'a DiffEntry) -> BoxFuture<'a, Result<()>> {
        Box::pin(async move { self.state.lock().await.apply(entry) })
    }
}
