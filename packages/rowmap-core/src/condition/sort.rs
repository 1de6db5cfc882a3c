use std::fmt;

use serde::Deserialize;

/// Direction of one sort key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    pub fn keyword(self) -> &'static str {
        match self {
            SortOrder::Ascending => "ASC",
            SortOrder::Descending => "DESC",
        }
    }
}

impl fmt::Display for SortOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.keyword())
    }
}

/// Ordered list of `(field, direction)` sort keys.
///
/// An empty spec means the descriptor's default sort.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SortSpec {
    keys: Vec<(String, SortOrder)>,
}

impl SortSpec {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn by(mut self, field: impl Into<String>, order: SortOrder) -> Self {
        self.keys.push((field.into(), order));
        self
    }

    pub fn asc(self, field: impl Into<String>) -> Self {
        self.by(field, SortOrder::Ascending)
    }

    pub fn desc(self, field: impl Into<String>) -> Self {
        self.by(field, SortOrder::Descending)
    }

    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    pub fn len(&self) -> usize {
        self.keys.len()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, (String, SortOrder)> {
        self.keys.iter()
    }
}

impl FromIterator<(String, SortOrder)> for SortSpec {
    fn from_iter<I: IntoIterator<Item = (String, SortOrder)>>(iter: I) -> Self {
        Self {
            keys: iter.into_iter().collect(),
        }
    }
}

impl<const N: usize> From<[(&str, SortOrder); N]> for SortSpec {
    fn from(keys: [(&str, SortOrder); N]) -> Self {
        keys.into_iter().map(|(f, o)| (f.to_string(), o)).collect()
    }
}
