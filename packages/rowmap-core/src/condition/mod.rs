//! Condition input: property bags, condition sets and sort specs.

mod coalesce;
mod sort;

pub use coalesce::{
    coalesce_conditions, coalesce_key, coalesce_update, resolve_sort, Requirement, UpdateSet,
};
pub use sort::{SortOrder, SortSpec};

use uuid::Uuid;

use crate::value::Value;

/// Insertion-ordered `(field, value)` pairs.
///
/// Used for conditions, update sets and statement parameters. Inserting
/// an existing name replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConditionSet {
    entries: Vec<(String, Value)>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(n, _)| *n == name) {
            Some((_, existing)) => *existing = value,
            None => self.entries.push((name, value)),
        }
    }

    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.insert(name, value);
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.entries.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Appends every entry of `other`, replacing same-named values.
    pub fn extend(&mut self, other: ConditionSet) {
        for (name, value) in other.entries {
            self.insert(name, value);
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(n, _)| n.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v))
    }
}

impl IntoIterator for ConditionSet {
    type Item = (String, Value);
    type IntoIter = std::vec::IntoIter<(String, Value)>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl<S: Into<String>, V: Into<Value>> FromIterator<(S, V)> for ConditionSet {
    fn from_iter<I: IntoIterator<Item = (S, V)>>(iter: I) -> Self {
        let mut set = ConditionSet::new();
        for (name, value) in iter {
            set.insert(name, value);
        }
        set
    }
}

/// Loosely-typed key, condition or update input.
///
/// Either a bare value, which only stands for a single-field key, or a
/// set of named field values.
#[derive(Debug, Clone, PartialEq)]
pub enum Bag {
    Scalar(Value),
    Fields(ConditionSet),
}

impl Bag {
    /// An empty field set.
    pub fn empty() -> Self {
        Bag::Fields(ConditionSet::new())
    }
}

impl Default for Bag {
    fn default() -> Self {
        Bag::empty()
    }
}

impl From<ConditionSet> for Bag {
    fn from(set: ConditionSet) -> Self {
        Bag::Fields(set)
    }
}

impl From<Value> for Bag {
    fn from(value: Value) -> Self {
        Bag::Scalar(value)
    }
}

impl<const N: usize, V: Into<Value>> From<[(&str, V); N]> for Bag {
    fn from(fields: [(&str, V); N]) -> Self {
        Bag::Fields(fields.into_iter().collect())
    }
}

impl<S: Into<String>, V: Into<Value>> From<Vec<(S, V)>> for Bag {
    fn from(fields: Vec<(S, V)>) -> Self {
        Bag::Fields(fields.into_iter().collect())
    }
}

macro_rules! scalar_bag {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Bag {
                fn from(value: $ty) -> Self {
                    Bag::Scalar(value.into())
                }
            }
        )*
    };
}

scalar_bag!(i16, i32, i64, u8, u16, u32, bool, String, &str, Uuid);
