//! Field declarations and resolved field descriptors.

use std::borrow::Cow;
use std::fmt;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::value::{Value, ValueKind};

/// Primary-key behavior of a field.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum KeyRole {
    #[default]
    NotAKey,
    /// Generated by the database on insert
    Identity,
    /// Caller-supplied GUID
    Guid,
    /// Caller-supplied value
    Assigned,
    /// Max + 1, scoped by the Assigned keys
    Sequential,
}

impl KeyRole {
    /// Role of an implied or unqualified key of the given kind.
    fn infer(kind: ValueKind) -> Self {
        match kind {
            ValueKind::Int => KeyRole::Identity,
            ValueKind::Guid => KeyRole::Guid,
            _ => KeyRole::Assigned,
        }
    }

    /// Roles whose value is never written by callers.
    fn forces_read_only(self) -> bool {
        matches!(self, KeyRole::Identity | KeyRole::Guid | KeyRole::Sequential)
    }
}

impl fmt::Display for KeyRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            KeyRole::NotAKey => "NotAKey",
            KeyRole::Identity => "Identity",
            KeyRole::Guid => "Guid",
            KeyRole::Assigned => "Assigned",
            KeyRole::Sequential => "Sequential",
        };
        f.write_str(name)
    }
}

/// Values written to a soft-delete field.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SoftDeleteValues {
    /// Value set on create
    pub inserted: Value,
    /// Value marking a deleted row
    pub deleted: Value,
}

/// Field metadata as declared on an entity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct FieldDeclaration {
    pub name: String,
    pub kind: ValueKind,
    #[serde(default)]
    pub column: Option<String>,
    /// Marks the field as a key with an inferred role
    #[serde(default)]
    pub key: bool,
    #[serde(default)]
    pub key_role: Option<KeyRole>,
    #[serde(default)]
    pub required: bool,
    #[serde(default)]
    pub read_only: Option<bool>,
    #[serde(default)]
    pub editable: Option<bool>,
    #[serde(default)]
    pub date_stamp: bool,
    #[serde(default)]
    pub soft_delete: Option<SoftDeleteValues>,
}

impl FieldDeclaration {
    pub fn new(name: impl Into<String>, kind: ValueKind) -> Self {
        Self {
            name: name.into(),
            kind,
            column: None,
            key: false,
            key_role: None,
            required: false,
            read_only: None,
            editable: None,
            date_stamp: false,
            soft_delete: None,
        }
    }

    /// Maps the field to a column with a different name.
    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.column = Some(column.into());
        self
    }

    /// Marks the field as a key, inferring the role from its kind.
    pub fn key(mut self) -> Self {
        self.key = true;
        self
    }

    pub fn key_role(mut self, role: KeyRole) -> Self {
        self.key_role = Some(role);
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn read_only(mut self, read_only: bool) -> Self {
        self.read_only = Some(read_only);
        self
    }

    pub fn editable(mut self, editable: bool) -> Self {
        self.editable = Some(editable);
        self
    }

    pub fn date_stamp(mut self) -> Self {
        self.date_stamp = true;
        self
    }

    pub fn soft_delete(mut self, inserted: impl Into<Value>, deleted: impl Into<Value>) -> Self {
        self.soft_delete = Some(SoftDeleteValues {
            inserted: inserted.into(),
            deleted: deleted.into(),
        });
        self
    }
}

/// Resolved, immutable metadata for one mapped field.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name, also the parameter and result-column name
    pub name: String,
    /// Mapped column name
    pub column: String,
    pub kind: ValueKind,
    pub key_role: KeyRole,
    pub is_editable: bool,
    pub is_read_only: bool,
    pub is_required: bool,
    pub is_date_stamp: bool,
    /// Date stamp refreshed on every update
    pub stamp_on_update: bool,
    pub soft_delete: Option<SoftDeleteValues>,
}

impl FieldDescriptor {
    /// Resolves a declaration on the named entity.
    ///
    /// Identity, Guid and Sequential keys and date stamps are always
    /// read-only and non-editable. Other fields follow their explicit
    /// flags, defaulting to editable.
    pub fn resolve(entity: &str, decl: &FieldDeclaration) -> Result<Self, ConfigError> {
        let implied_key = decl.name == "Id" || decl.name == format!("{entity}Id");
        let key_role = match decl.key_role {
            Some(role) => role,
            None if implied_key || decl.key => KeyRole::infer(decl.kind),
            None => KeyRole::NotAKey,
        };

        if matches!(key_role, KeyRole::Identity | KeyRole::Sequential) && decl.kind != ValueKind::Int
        {
            return Err(ConfigError::NonIntegerGeneratedKey {
                entity: entity.to_string(),
                field: decl.name.clone(),
                role: key_role.to_string(),
            });
        }

        let (is_read_only, is_editable) = if key_role.forces_read_only() || decl.date_stamp {
            (true, false)
        } else {
            let read_only = decl.read_only.unwrap_or(false);
            (read_only, decl.editable.unwrap_or(!read_only))
        };

        if is_read_only && is_editable {
            return Err(ConfigError::EditableConflict {
                entity: entity.to_string(),
                field: decl.name.clone(),
            });
        }

        let soft_delete = match &decl.soft_delete {
            Some(values) => Some(SoftDeleteValues {
                inserted: coerce_declared(entity, decl, values.inserted.clone())?,
                deleted: coerce_declared(entity, decl, values.deleted.clone())?,
            }),
            None => None,
        };

        Ok(Self {
            name: decl.name.clone(),
            column: decl.column.clone().unwrap_or_else(|| decl.name.clone()),
            kind: decl.kind,
            key_role,
            is_editable,
            is_read_only,
            is_required: decl.required,
            is_date_stamp: decl.date_stamp,
            stamp_on_update: decl.date_stamp && decl.read_only != Some(true),
            soft_delete,
        })
    }

    pub fn is_key(&self) -> bool {
        self.key_role != KeyRole::NotAKey
    }

    pub fn is_soft_delete(&self) -> bool {
        self.soft_delete.is_some()
    }

    /// Whether callers may write this field on update.
    pub fn is_updateable(&self) -> bool {
        !self.is_key() && self.is_editable && !self.is_soft_delete() && !self.is_date_stamp
    }

    /// Whether the value is produced by the mapper rather than the caller.
    pub fn is_generated(&self) -> bool {
        matches!(self.key_role, KeyRole::Identity | KeyRole::Sequential)
            || self.is_date_stamp
            || self.is_soft_delete()
    }

    /// Select-list entry, aliased to the field name when the column differs.
    pub fn column_select(&self) -> Cow<'_, str> {
        if self.column == self.name {
            Cow::Borrowed(&self.column)
        } else {
            Cow::Owned(format!("{} AS {}", self.column, self.name))
        }
    }
}

fn coerce_declared(entity: &str, decl: &FieldDeclaration, value: Value) -> Result<Value, ConfigError> {
    let shown = value.to_string();
    value.coerce(decl.kind).ok_or_else(|| {
        ConfigError::InvalidDeclaration(format!(
            "soft delete value {} on '{}.{}' is not a {}",
            shown, entity, decl.name, decl.kind
        ))
    })
}
