//! Mapping error types.

use thiserror::Error;

/// Result type for mapping operations
pub type Result<T> = std::result::Result<T, Error>;

/// Boxed error raised by an external database driver.
pub type DriverError = Box<dyn std::error::Error + Send + Sync>;

/// Declaration errors detected while building a type descriptor.
///
/// Cached alongside the failed build, so every caller for the same type
/// observes the same error.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    /// More than one Identity key
    #[error("Type '{entity}' declares more than one Identity key")]
    MultipleIdentityKeys { entity: String },

    /// Identity key combined with other keys
    #[error("Type '{entity}' combines an Identity key with other key fields")]
    IdentityWithOtherKeys { entity: String },

    /// More than one Sequential key
    #[error("Type '{entity}' can only define a single Sequential key")]
    MultipleSequentialKeys { entity: String },

    /// More than one soft-delete field
    #[error("Type '{entity}' can only define a single soft delete field")]
    MultipleSoftDeleteFields { entity: String },

    /// Field marked both editable and read-only
    #[error("Field '{field}' on '{entity}' is marked both editable and read-only")]
    EditableConflict { entity: String, field: String },

    /// Field declared twice
    #[error("Field '{field}' declared more than once on '{entity}'")]
    DuplicateField { entity: String, field: String },

    /// Generated key on a non-integer field
    #[error("Field '{field}' on '{entity}' has role {role} but is not an integer field")]
    NonIntegerGeneratedKey {
        entity: String,
        field: String,
        role: String,
    },

    /// Declaration could not be parsed
    #[error("Invalid declaration: {0}")]
    InvalidDeclaration(String),
}

/// Caller-correctable errors raised per call.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ArgumentError {
    /// Key lookup missing a key field
    #[error("Failed to find key field '{field}' on '{entity}'")]
    MissingKeyField { entity: String, field: String },

    /// Key operation on a type without key fields
    #[error("Type '{entity}' has no key fields")]
    NoKeyFields { entity: String },

    /// Scalar key used where it cannot apply
    #[error("A single value key requires '{entity}' to have exactly one key field of kind {expected}, got {got}")]
    ScalarKeyMismatch {
        entity: String,
        expected: String,
        got: String,
    },

    /// Condition or sort names an unmapped field
    #[error("Failed to find field '{field}' on '{entity}'")]
    UnknownField { entity: String, field: String },

    /// No conditions where at least one is required
    #[error("Please specify at least one condition for '{entity}'")]
    EmptyConditions { entity: String },

    /// Update left with nothing to write
    #[error("Please provide one or more updateable fields for '{entity}'")]
    NoUpdateableFields { entity: String },

    /// Required field left empty on create
    #[error("Required field '{field}' on '{entity}' has no value")]
    RequiredFieldMissing { entity: String, field: String },

    /// Invalid paging window
    #[error("Invalid paging window: page size {page_size}, page number {page_number}")]
    InvalidPage { page_size: u32, page_number: u32 },
}

/// Mapping operation errors.
#[derive(Error, Debug)]
pub enum Error {
    /// Type declaration is invalid
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigError),

    /// Call arguments are invalid
    #[error("Argument error: {0}")]
    Argument(#[from] ArgumentError),

    /// Value could not be converted to or from an entity field
    #[error("Cannot map field '{field}': expected {expected}, got {got}")]
    Mapping {
        field: String,
        expected: String,
        got: String,
    },

    /// Stored data violates a key invariant
    #[error("Data integrity violation: {0}")]
    DataIntegrity(String),

    /// Error raised by the database driver
    #[error(transparent)]
    Driver(DriverError),
}

impl Error {
    /// Wraps a driver error without reinterpreting it.
    pub fn driver(err: impl Into<DriverError>) -> Self {
        Error::Driver(err.into())
    }

    /// Returns `true` for caller-correctable argument errors.
    pub fn is_argument(&self) -> bool {
        matches!(self, Error::Argument(_))
    }

    /// Returns `true` for declaration errors.
    pub fn is_configuration(&self) -> bool {
        matches!(self, Error::Configuration(_))
    }
}
