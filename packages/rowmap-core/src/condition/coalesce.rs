//! Normalizes loosely-typed input against a type descriptor.

use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::ArgumentError;
use crate::value::Value;

use super::{Bag, ConditionSet, SortOrder, SortSpec};

/// Whether an empty condition set is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    AtLeastOne,
    Optional,
}

/// Key and writable values split out of an update bag.
#[derive(Debug, Clone, PartialEq)]
pub struct UpdateSet {
    pub key: ConditionSet,
    pub values: ConditionSet,
}

impl UpdateSet {
    /// Key and update values as one parameter set.
    pub fn parameters(&self) -> ConditionSet {
        let mut params = self.key.clone();
        params.extend(self.values.clone());
        params
    }
}

/// Normalizes a key lookup into a condition set over every key field.
///
/// A scalar is accepted only for a type with exactly one key field of
/// the same kind. A field bag must name every key; other fields are
/// ignored. A type without key fields has no key lookup.
pub fn coalesce_key(desc: &TypeDescriptor, bag: Bag) -> Result<ConditionSet, ArgumentError> {
    if desc.key_count() == 0 {
        return Err(ArgumentError::NoKeyFields {
            entity: desc.name.clone(),
        });
    }
    match bag {
        Bag::Scalar(value) => scalar_key(desc, value),
        Bag::Fields(fields) => {
            let mut key = ConditionSet::new();
            for field in desc.keys() {
                let value = fields
                    .get(&field.name)
                    .ok_or_else(|| ArgumentError::MissingKeyField {
                        entity: desc.name.clone(),
                        field: field.name.clone(),
                    })?;
                key.insert(field.name.clone(), value.clone());
            }
            Ok(key)
        }
    }
}

/// Normalizes a general condition bag.
///
/// Every name must map to a field. A scalar is treated as a key.
pub fn coalesce_conditions(
    desc: &TypeDescriptor,
    bag: Bag,
    requirement: Requirement,
) -> Result<ConditionSet, ArgumentError> {
    let conditions = match bag {
        Bag::Scalar(value) => scalar_key(desc, value)?,
        Bag::Fields(fields) => {
            if let Some(unknown) = fields.names().find(|name| desc.field(name).is_none()) {
                return Err(ArgumentError::UnknownField {
                    entity: desc.name.clone(),
                    field: unknown.to_string(),
                });
            }
            fields
        }
    };

    if conditions.is_empty() && requirement == Requirement::AtLeastOne {
        return Err(ArgumentError::EmptyConditions {
            entity: desc.name.clone(),
        });
    }
    Ok(conditions)
}

/// Splits an update bag into the key and the values to write.
///
/// Unknown names are rejected. Mapped names that are keys, read-only,
/// soft-delete or date stamps are dropped without error.
pub fn coalesce_update(desc: &TypeDescriptor, bag: Bag) -> Result<UpdateSet, ArgumentError> {
    let fields = match bag {
        Bag::Fields(fields) => fields,
        Bag::Scalar(_) => {
            return Err(ArgumentError::NoUpdateableFields {
                entity: desc.name.clone(),
            })
        }
    };

    let key = coalesce_key(desc, Bag::Fields(fields.clone()))?;

    let mut values = ConditionSet::new();
    for (name, value) in fields {
        let field = desc
            .field(&name)
            .ok_or_else(|| ArgumentError::UnknownField {
                entity: desc.name.clone(),
                field: name.clone(),
            })?;
        if field.is_updateable() {
            values.insert(name, value);
        } else if !field.is_key() {
            tracing::trace!("Dropping non-updateable field {}.{}", desc.name, name);
        }
    }

    if values.is_empty() {
        return Err(ArgumentError::NoUpdateableFields {
            entity: desc.name.clone(),
        });
    }
    Ok(UpdateSet { key, values })
}

/// Resolves a sort spec to field descriptors, falling back to the
/// default sort when empty.
pub fn resolve_sort<'a>(
    desc: &'a TypeDescriptor,
    sort: &SortSpec,
) -> Result<Vec<(&'a FieldDescriptor, SortOrder)>, ArgumentError> {
    let default;
    let sort = if sort.is_empty() {
        default = desc.default_sort();
        &default
    } else {
        sort
    };

    sort.iter()
        .map(|(name, order)| {
            desc.field(name)
                .map(|f| (f, *order))
                .ok_or_else(|| ArgumentError::UnknownField {
                    entity: desc.name.clone(),
                    field: name.clone(),
                })
        })
        .collect()
}

fn scalar_key(desc: &TypeDescriptor, value: Value) -> Result<ConditionSet, ArgumentError> {
    let mut keys = desc.keys();
    let only = match (keys.next(), keys.next()) {
        (Some(field), None) => Some(field),
        _ => None,
    };

    match only {
        Some(field) if value.kind() == Some(field.kind) => {
            Ok(ConditionSet::new().with(field.name.clone(), value))
        }
        _ => Err(ArgumentError::ScalarKeyMismatch {
            entity: desc.name.clone(),
            expected: only
                .map(|f| f.kind.to_string())
                .unwrap_or_else(|| format!("{} key fields", desc.key_count())),
            got: value
                .kind()
                .map(|k| k.to_string())
                .unwrap_or_else(|| "null".to_string()),
        }),
    }
}
