//! Mapper configuration.

use std::path::Path;

use serde::Deserialize;

use crate::error::ConfigError;

/// Mapper configuration.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MapperConfig {
    /// Schema applied to declarations that do not name one
    pub default_schema: Option<String>,
    /// Log every statement sent to the driver at debug level
    pub log_statements: bool,
}

impl MapperConfig {
    /// Loads configuration from a JSON file.
    ///
    /// Missing keys fall back to their defaults.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| {
            ConfigError::InvalidDeclaration(format!("cannot read {}: {}", path.display(), e))
        })?;
        Self::from_json(&text)
    }

    /// Parses configuration from JSON text.
    pub fn from_json(text: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(text).map_err(|e| ConfigError::InvalidDeclaration(e.to_string()))
    }

    /// Sets the default schema.
    pub fn with_default_schema(mut self, schema: impl Into<String>) -> Self {
        self.default_schema = Some(schema.into());
        self
    }

    /// Enables statement logging.
    pub fn with_statement_logging(mut self) -> Self {
        self.log_statements = true;
        self
    }
}
