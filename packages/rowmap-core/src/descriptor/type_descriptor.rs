//! Entity declarations and resolved type descriptors.

use std::collections::{HashMap, HashSet};

use serde::Deserialize;

use crate::condition::{SortOrder, SortSpec};
use crate::config::MapperConfig;
use crate::error::ConfigError;
use crate::sql::StatementCache;

use super::field::{FieldDeclaration, FieldDescriptor, KeyRole};

/// Table mapping and field metadata as declared on an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct EntityDeclaration {
    /// Entity name; also the default table name
    pub name: String,
    #[serde(default)]
    pub schema: Option<String>,
    #[serde(default)]
    pub table: Option<String>,
    #[serde(default)]
    pub fields: Vec<FieldDeclaration>,
}

impl EntityDeclaration {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            schema: None,
            table: None,
            fields: Vec::new(),
        }
    }

    pub fn schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = Some(schema.into());
        self
    }

    pub fn table(mut self, table: impl Into<String>) -> Self {
        self.table = Some(table.into());
        self
    }

    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.fields.push(field);
        self
    }
}

/// Resolved table mapping for one entity type.
///
/// Built once per type and shared read-only. Holds the derived field
/// views and the cache of statements that depend only on its shape.
#[derive(Debug)]
pub struct TypeDescriptor {
    /// Entity name
    pub name: String,
    pub schema: Option<String>,
    pub table: String,
    fields: Vec<FieldDescriptor>,
    by_name: HashMap<String, usize>,
    keys: Vec<usize>,
    insertable: Vec<usize>,
    updateable: Vec<usize>,
    date_stamps: Vec<usize>,
    identity: Option<usize>,
    sequential: Option<usize>,
    soft_delete: Option<usize>,
    statements: StatementCache,
}

impl TypeDescriptor {
    /// Resolves and validates a declaration.
    ///
    /// # Returns
    /// `Err(ConfigError)` for duplicate fields, conflicting flags, or an
    /// invalid key combination.
    pub fn build(decl: &EntityDeclaration, config: &MapperConfig) -> Result<Self, ConfigError> {
        let entity = decl.name.as_str();

        let mut seen = HashSet::new();
        for field in &decl.fields {
            if !seen.insert(field.name.as_str()) {
                return Err(ConfigError::DuplicateField {
                    entity: entity.to_string(),
                    field: field.name.clone(),
                });
            }
        }

        let fields = decl
            .fields
            .iter()
            .map(|f| FieldDescriptor::resolve(entity, f))
            .collect::<Result<Vec<_>, _>>()?;

        let positions = |pred: &dyn Fn(&FieldDescriptor) -> bool| -> Vec<usize> {
            fields
                .iter()
                .enumerate()
                .filter(|(_, f)| pred(f))
                .map(|(i, _)| i)
                .collect()
        };

        let keys = positions(&|f| f.is_key());
        let identities = positions(&|f| f.key_role == KeyRole::Identity);
        let sequentials = positions(&|f| f.key_role == KeyRole::Sequential);
        let soft_deletes = positions(&|f| f.is_soft_delete());

        if identities.len() > 1 {
            return Err(ConfigError::MultipleIdentityKeys {
                entity: entity.to_string(),
            });
        }
        if !identities.is_empty() && keys.len() > 1 {
            return Err(ConfigError::IdentityWithOtherKeys {
                entity: entity.to_string(),
            });
        }
        if sequentials.len() > 1 {
            return Err(ConfigError::MultipleSequentialKeys {
                entity: entity.to_string(),
            });
        }
        if soft_deletes.len() > 1 {
            return Err(ConfigError::MultipleSoftDeleteFields {
                entity: entity.to_string(),
            });
        }

        let schema = decl
            .schema
            .clone()
            .or_else(|| config.default_schema.clone())
            .filter(|s| !s.trim().is_empty());

        Ok(Self {
            name: entity.to_string(),
            schema,
            table: decl.table.clone().unwrap_or_else(|| entity.to_string()),
            insertable: positions(&|f| f.key_role != KeyRole::Identity),
            updateable: positions(&|f| f.is_updateable()),
            date_stamps: positions(&|f| f.is_date_stamp),
            by_name: fields
                .iter()
                .enumerate()
                .map(|(i, f)| (f.name.clone(), i))
                .collect(),
            identity: identities.first().copied(),
            sequential: sequentials.first().copied(),
            soft_delete: soft_deletes.first().copied(),
            keys,
            fields,
            statements: StatementCache::default(),
        })
    }

    /// `[schema].[table]`, or `[table]` without a schema.
    pub fn table_identifier(&self) -> String {
        match &self.schema {
            Some(schema) => format!("[{}].[{}]", schema, self.table),
            None => format!("[{}]", self.table),
        }
    }

    /// Looks up a field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&i| &self.fields[i])
    }

    /// All fields in declaration order; also the select list.
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn keys(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.pick(&self.keys)
    }

    pub fn key_count(&self) -> usize {
        self.keys.len()
    }

    pub fn assigned_keys(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.keys().filter(|f| f.key_role == KeyRole::Assigned)
    }

    pub fn identity_key(&self) -> Option<&FieldDescriptor> {
        self.identity.map(|i| &self.fields[i])
    }

    pub fn sequential_key(&self) -> Option<&FieldDescriptor> {
        self.sequential.map(|i| &self.fields[i])
    }

    pub fn soft_delete_field(&self) -> Option<&FieldDescriptor> {
        self.soft_delete.map(|i| &self.fields[i])
    }

    /// Every field except the Identity key.
    pub fn insertable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.pick(&self.insertable)
    }

    /// Non-key, editable fields that are neither soft-delete nor date stamps.
    pub fn updateable_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.pick(&self.updateable)
    }

    pub fn date_stamp_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.pick(&self.date_stamps)
    }

    pub fn required_fields(&self) -> impl Iterator<Item = &FieldDescriptor> {
        self.fields.iter().filter(|f| f.is_required)
    }

    /// All key fields ascending.
    pub fn default_sort(&self) -> SortSpec {
        self.keys()
            .map(|f| (f.name.clone(), SortOrder::Ascending))
            .collect()
    }

    pub(crate) fn statements(&self) -> &StatementCache {
        &self.statements
    }

    fn pick<'a>(&'a self, positions: &'a [usize]) -> impl Iterator<Item = &'a FieldDescriptor> {
        positions.iter().map(move |&i| &self.fields[i])
    }
}
