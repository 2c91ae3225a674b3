mod field;
mod loader;
mod model;
mod registry;
mod types;

pub use field::{FieldAttribute, FieldDef};
pub use loader::{FieldSpec, SchemaFile, TableSpec};
pub use model::{ForeignKeyDef, IndexDef, ReferentialAction, TableDef};
pub use registry::{ModelRegistry, ModelRegistryBuilder};
pub use types::{RustType, SqlType};
