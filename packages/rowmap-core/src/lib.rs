//! Metadata-driven mapping of plain record types onto relational tables.
//!
//! Provides type descriptors built from field declarations, condition
//! coalescing, parameterized SQL generation, a CRUD orchestrator over an
//! external database driver, and an in-memory reference engine.

pub mod condition;
pub mod config;
pub mod context;
pub mod descriptor;
pub mod entity;
pub mod error;
pub mod sql;
pub mod value;

pub use condition::{Bag, ConditionSet, SortOrder, SortSpec};
pub use config::MapperConfig;
pub use context::{Connection, DataContext, MemoryContext, PagedList, SqlContext};
pub use descriptor::{
    DescriptorRegistry, EntityDeclaration, FieldDeclaration, FieldDescriptor, KeyRole,
    TypeDescriptor,
};
pub use entity::{Entity, Row};
pub use error::{ArgumentError, ConfigError, Error, Result};
pub use value::{FieldValue, Value, ValueKind};
