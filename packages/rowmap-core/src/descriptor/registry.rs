use std::any::TypeId;
use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use crate::config::MapperConfig;
use crate::entity::Entity;
use crate::error::ConfigError;

use super::type_descriptor::TypeDescriptor;

type Entry = Result<Arc<TypeDescriptor>, ConfigError>;

/// Registry of type descriptors keyed by entity type.
///
/// Owned by the hosting application and shared between contexts. Each
/// descriptor is built on first use; a failed build is cached too, so
/// every later lookup returns the same `ConfigError`.
#[derive(Debug, Default)]
pub struct DescriptorRegistry {
    config: MapperConfig,
    descriptors: RwLock<HashMap<TypeId, Entry>>,
}

impl DescriptorRegistry {
    /// Creates an empty registry with default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: MapperConfig) -> Self {
        Self {
            config,
            descriptors: RwLock::new(HashMap::new()),
        }
    }

    pub fn config(&self) -> &MapperConfig {
        &self.config
    }

    /// Returns the descriptor for `T`, building it on first access.
    ///
    /// Concurrent first callers race for the write lock; the winner builds
    /// and the rest observe its completed entry.
    pub fn descriptor<T: Entity>(&self) -> Result<Arc<TypeDescriptor>, ConfigError> {
        let type_id = TypeId::of::<T>();

        if let Some(entry) = self.descriptors.read().get(&type_id) {
            return entry.clone();
        }

        let mut descriptors = self.descriptors.write();
        descriptors
            .entry(type_id)
            .or_insert_with(|| self.build::<T>())
            .clone()
    }

    /// Checks if a descriptor (or failed build) exists for `T`.
    pub fn contains<T: Entity>(&self) -> bool {
        self.descriptors.read().contains_key(&TypeId::of::<T>())
    }

    /// Returns the number of cached entries.
    pub fn len(&self) -> usize {
        self.descriptors.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.descriptors.read().is_empty()
    }

    fn build<T: Entity>(&self) -> Entry {
        let decl = T::declaration();
        match TypeDescriptor::build(&decl, &self.config) {
            Ok(descriptor) => {
                tracing::info!(
                    "Built descriptor for {} on {} with {} fields",
                    descriptor.name,
                    descriptor.table_identifier(),
                    descriptor.fields().len()
                );
                Ok(Arc::new(descriptor))
            }
            Err(e) => {
                tracing::warn!("Descriptor for {} rejected: {}", decl.name, e);
                Err(e)
            }
        }
    }
}
