use std::collections::{BTreeSet, HashMap, HashSet};

use tracing::debug;

use super::model::TableDef;
use crate::error::{Result, SyncError};

/// Validated set of table definitions with a dependency-derived order.
///
/// A table that holds a foreign key into another table depends on it: the
/// referenced table is created first and dropped last. The order is computed
/// once at build time; ties are broken by registration order.
#[derive(Debug, Clone)]
pub struct ModelRegistry {
    /// Tables in registration order.
    tables: Vec<TableDef>,

    /// Indices into `tables`, parents before children.
    create_order: Vec<usize>,
}

impl ModelRegistry {
    /// Start building a registry.
    pub fn builder() -> ModelRegistryBuilder {
        ModelRegistryBuilder::default()
    }

    /// Build a registry from a list of tables.
    pub fn from_tables(tables: impl IntoIterator<Item = TableDef>) -> Result<Self> {
        tables
            .into_iter()
            .fold(Self::builder(), |builder, table| builder.register(table))
            .build()
    }

    /// Tables with every dependency before its dependents.
    pub fn create_order(&self) -> Vec<&TableDef> {
        self.create_order.iter().map(|&i| &self.tables[i]).collect()
    }

    /// Exact reverse of [`create_order`](Self::create_order).
    pub fn drop_order(&self) -> Vec<&TableDef> {
        self.create_order
            .iter()
            .rev()
            .map(|&i| &self.tables[i])
            .collect()
    }

    /// Get a table by name.
    pub fn get(&self, name: &str) -> Option<&TableDef> {
        self.tables.iter().find(|t| t.name == name)
    }

    /// Tables in registration order.
    pub fn tables(&self) -> &[TableDef] {
        &self.tables
    }

    /// Total number of foreign keys across all tables.
    pub fn foreign_key_count(&self) -> usize {
        self.tables.iter().map(|t| t.foreign_keys.len()).sum()
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

/// Collects table registrations before validation.
#[derive(Debug, Default)]
pub struct ModelRegistryBuilder {
    tables: Vec<TableDef>,
}

impl ModelRegistryBuilder {
    /// Register a table; its foreign keys become dependency edges.
    pub fn register(mut self, table: TableDef) -> Self {
        self.tables.push(table);
        self
    }

    /// Register a table with extra dependencies beyond its foreign keys.
    pub fn register_with<I, S>(self, mut table: TableDef, depends_on: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        table.depends_on.extend(depends_on.into_iter().map(Into::into));
        self.register(table)
    }

    /// Validate the definitions and compute the creation order.
    pub fn build(self) -> Result<ModelRegistry> {
        let tables = self.tables;
        if tables.is_empty() {
            return Err(SyncError::Config("No tables registered".into()));
        }

        let mut index: HashMap<&str, usize> = HashMap::new();
        for (i, table) in tables.iter().enumerate() {
            if index.insert(table.name.as_str(), i).is_some() {
                return Err(SyncError::Validation(format!(
                    "Table '{}' is registered twice",
                    table.name
                )));
            }
        }

        for table in &tables {
            validate_table(table, &tables, &index)?;
        }

        let create_order = topological_order(&tables, &index)?;
        debug!(
            "Table creation order: {:?}",
            create_order
                .iter()
                .map(|&i| tables[i].name.as_str())
                .collect::<Vec<_>>()
        );

        Ok(ModelRegistry {
            tables,
            create_order,
        })
    }
}

fn validate_table(table: &TableDef, tables: &[TableDef], index: &HashMap<&str, usize>) -> Result<()> {
    if table.fields.is_empty() {
        return Err(SyncError::Validation(format!(
            "Table '{}' has no columns",
            table.name
        )));
    }

    let mut seen = HashSet::new();
    for field in &table.fields {
        if !seen.insert(field.column_name.as_str()) {
            return Err(SyncError::Validation(format!(
                "Column '{}' is declared twice on table '{}'",
                field.column_name, table.name
            )));
        }
    }

    let primary_key = table.primary_key();
    if primary_key.len() > 1 && primary_key.iter().any(|f| f.is_auto_increment()) {
        return Err(SyncError::Validation(format!(
            "Table '{}' combines an auto-increment key with a composite primary key",
            table.name
        )));
    }

    for idx in &table.indexes {
        if idx.columns.is_empty() {
            return Err(SyncError::Validation(format!(
                "Index '{}' has no columns",
                idx.index_name(&table.name)
            )));
        }
        if let Some(missing) = idx.columns.iter().find(|c| table.column(c).is_none()) {
            return Err(SyncError::Validation(format!(
                "Index '{}' references unknown column '{}.{}'",
                idx.index_name(&table.name),
                table.name,
                missing
            )));
        }
    }

    for fk in &table.foreign_keys {
        if table.column(&fk.column).is_none() {
            return Err(SyncError::Validation(format!(
                "Foreign key '{}' uses unknown column '{}.{}'",
                fk.constraint_name(&table.name),
                table.name,
                fk.column
            )));
        }
        let target = index
            .get(fk.references.as_str())
            .map(|&i| &tables[i])
            .ok_or_else(|| {
                SyncError::Validation(format!(
                    "Foreign key '{}' references unregistered table '{}'",
                    fk.constraint_name(&table.name),
                    fk.references
                ))
            })?;
        if target.column(&fk.references_column).is_none() {
            return Err(SyncError::Validation(format!(
                "Foreign key '{}' references unknown column '{}.{}'",
                fk.constraint_name(&table.name),
                target.name,
                fk.references_column
            )));
        }
    }

    if let Some(missing) = table
        .depends_on
        .iter()
        .find(|dep| !index.contains_key(dep.as_str()))
    {
        return Err(SyncError::Validation(format!(
            "Table '{}' depends on unregistered table '{}'",
            table.name, missing
        )));
    }

    Ok(())
}

/// Kahn's algorithm; among ready tables the earliest registered goes first.
fn topological_order(tables: &[TableDef], index: &HashMap<&str, usize>) -> Result<Vec<usize>> {
    let mut remaining_deps: Vec<usize> = vec![0; tables.len()];
    let mut dependents: Vec<Vec<usize>> = vec![Vec::new(); tables.len()];

    for (i, table) in tables.iter().enumerate() {
        for dep in table.dependencies() {
            let parent = index[dep];
            remaining_deps[i] += 1;
            dependents[parent].push(i);
        }
    }

    let mut ready: BTreeSet<usize> = (0..tables.len())
        .filter(|&i| remaining_deps[i] == 0)
        .collect();
    let mut order = Vec::with_capacity(tables.len());

    while let Some(next) = ready.pop_first() {
        order.push(next);
        for &child in &dependents[next] {
            remaining_deps[child] -= 1;
            if remaining_deps[child] == 0 {
                ready.insert(child);
            }
        }
    }

    if order.len() < tables.len() {
        return Err(SyncError::CyclicDependency(find_cycle(tables, index, &remaining_deps)));
    }

    Ok(order)
}

/// Walk dependencies among unresolved tables until a table repeats.
fn find_cycle(tables: &[TableDef], index: &HashMap<&str, usize>, remaining_deps: &[usize]) -> Vec<String> {
    let unresolved = |i: usize| remaining_deps[i] > 0;
    let Some(start) = (0..tables.len()).find(|&i| unresolved(i)) else {
        return Vec::new();
    };

    let mut path = vec![start];
    let mut current = start;
    loop {
        // Every unresolved table waits on at least one other unresolved table.
        let Some(next) = tables[current]
            .dependencies()
            .into_iter()
            .map(|dep| index[dep])
            .find(|&i| unresolved(i))
        else {
            break;
        };

        if let Some(pos) = path.iter().position(|&i| i == next) {
            let mut cycle: Vec<String> = path[pos..]
                .iter()
                .map(|&i| tables[i].name.clone())
                .collect();
            cycle.push(tables[next].name.clone());
            return cycle;
        }

        path.push(next);
        current = next;
    }

    path.into_iter().map(|i| tables[i].name.clone()).collect()
}
