//! Field and type descriptors, and the registry that memoizes them.

mod field;
mod registry;
mod type_descriptor;

pub use field::{FieldDeclaration, FieldDescriptor, KeyRole, SoftDeleteValues};
pub use registry::DescriptorRegistry;
pub use type_descriptor::{EntityDeclaration, TypeDescriptor};
