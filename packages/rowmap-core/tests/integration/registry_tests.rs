//! Descriptor registry lifecycle and configuration loading.

use std::sync::Arc;

use ntest::timeout;
use tempfile::tempdir;

use rowmap_core::{ConfigError, DescriptorRegistry, MapperConfig};

use super::helpers::{Broken, City, Element};

#[timeout(5000)]
#[test]
fn test_concurrent_first_access_builds_once() {
    let registry = Arc::new(DescriptorRegistry::new());

    let descriptors: Vec<_> = std::thread::scope(|scope| {
        let handles: Vec<_> = (0..8)
            .map(|_| scope.spawn(|| registry.descriptor::<City>().unwrap()))
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(descriptors
        .windows(2)
        .all(|pair| Arc::ptr_eq(&pair[0], &pair[1])));
    assert_eq!(registry.len(), 1);
}

#[timeout(1000)]
#[test]
fn test_failed_build_is_cached() {
    let registry = DescriptorRegistry::new();
    let first = registry.descriptor::<Broken>().unwrap_err();
    let second = registry.descriptor::<Broken>().unwrap_err();

    assert_eq!(
        first,
        ConfigError::MultipleIdentityKeys {
            entity: "Broken".into()
        }
    );
    assert_eq!(first, second);
    assert!(registry.contains::<Broken>());
    assert!(!registry.contains::<Element>());
}

#[timeout(1000)]
#[test]
fn test_registry_uses_loaded_config() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("rowmap.json");
    std::fs::write(&path, r#"{ "default_schema": "geo", "log_statements": true }"#).unwrap();

    let config = MapperConfig::load(&path).unwrap();
    let registry = DescriptorRegistry::with_config(config);
    assert!(registry.config().log_statements);

    let city = registry.descriptor::<City>().unwrap();
    assert_eq!(city.table_identifier(), "[geo].[Cities]");
}
