//! Record types mapped onto tables.

use crate::descriptor::EntityDeclaration;
use crate::error::{Error, Result};
use crate::value::Value;

/// A result row keyed by field name, in select order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Row {
    columns: Vec<(String, Value)>,
}

impl Row {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a column, replacing an earlier column of the same name.
    pub fn push(&mut self, name: impl Into<String>, value: Value) {
        let name = name.into();
        match self.columns.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.columns.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.push(name, value.into());
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.columns.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.columns.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl IntoIterator for Row {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.columns.into_iter()
    }
}

impl<S: Into<String>> FromIterator<(S, Value)> for Row {
    fn from_iter<I: IntoIterator<Item = (S, Value)>>(iter: I) -> Self {
        let mut row = Row::new();
        for (name, value) in iter {
            row.push(name, value);
        }
        row
    }
}

/// A plain record type mapped onto a single table.
///
/// Field access is by declared field name. The [`entity_fields!`](crate::entity_fields)
/// macro generates `get` and `set` from a name-to-member list.
pub trait Entity: Default + Clone + Send + Sync + 'static {
    /// Declares the table mapping and field metadata.
    fn declaration() -> EntityDeclaration;

    /// Reads a field, `None` if the name is not a field of this type.
    fn get(&self, field: &str) -> Option<Value>;

    /// Writes a field, converting the value to the member's type.
    fn set(&mut self, field: &str, value: Value) -> Result<()>;

    /// Hydrates a record from a result row.
    fn from_row(row: Row) -> Result<Self> {
        let mut entity = Self::default();
        for (name, value) in row {
            entity.set(&name, value)?;
        }
        Ok(entity)
    }
}

/// Error for a `set` on a name the entity does not map.
pub fn unknown_field(field: &str, value: &Value) -> Error {
    Error::Mapping {
        field: field.to_string(),
        expected: "a mapped field".to_string(),
        got: value
            .kind()
            .map(|k| k.to_string())
            .unwrap_or_else(|| "null".to_string()),
    }
}

/// Implements [`Entity::get`] and [`Entity::set`] from `"Field" => member` pairs.
///
/// ```ignore
/// impl Entity for City {
///     fn declaration() -> EntityDeclaration { /* ... */ }
///     rowmap_core::entity_fields! { "CityId" => city_id, "CityName" => city_name }
/// }
/// ```
#[macro_export]
macro_rules! entity_fields {
    ($($name:literal => $member:ident),* $(,)?) => {
        fn get(&self, field: &str) -> Option<$crate::Value> {
            match field {
                $($name => Some($crate::FieldValue::into_value(self.$member.clone())),)*
                _ => None,
            }
        }

        fn set(&mut self, field: &str, value: $crate::Value) -> $crate::Result<()> {
            match field {
                $($name => {
                    self.$member = $crate::value::convert(field, value)?;
                    Ok(())
                })*
                _ => Err($crate::entity::unknown_field(field, &value)),
            }
        }
    };
}
