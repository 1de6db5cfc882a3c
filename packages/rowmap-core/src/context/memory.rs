//! In-process reference engine with the same CRUD semantics as [`SqlContext`](super::SqlContext).

use std::any::{Any, TypeId};
use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;

use crate::condition::{
    coalesce_conditions, coalesce_key, coalesce_update, resolve_sort, Bag, ConditionSet,
    Requirement, SortOrder, SortSpec,
};
use crate::descriptor::{DescriptorRegistry, FieldDescriptor, TypeDescriptor};
use crate::entity::Entity;
use crate::error::{Error, Result};
use crate::value::Value;

use super::partition::Partition;
use super::{check_required, parameters_of, stamp_insert, DataContext, PageWindow, PagedList};

type AnyPartition = Arc<dyn Any + Send + Sync>;

/// [`DataContext`] holding records in memory, one partition per type.
///
/// Generated keys follow the database rules: Identity is the partition
/// maximum plus one and Sequential is the maximum within the row's
/// Assigned-key scope plus one.
pub struct MemoryContext {
    registry: Arc<DescriptorRegistry>,
    partitions: RwLock<HashMap<TypeId, AnyPartition>>,
}

impl MemoryContext {
    pub fn new(registry: Arc<DescriptorRegistry>) -> Self {
        Self {
            registry,
            partitions: RwLock::new(HashMap::new()),
        }
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    /// Replaces every stored record of type `T`.
    pub fn seed<T: Entity>(&self, rows: Vec<T>) -> Result<()> {
        let desc = self.registry.descriptor::<T>()?;
        tracing::debug!("Seeding {} with {} rows", desc.name, rows.len());
        self.partition::<T>()?.replace(rows);
        Ok(())
    }

    fn descriptor<T: Entity>(&self) -> Result<Arc<TypeDescriptor>> {
        Ok(self.registry.descriptor::<T>()?)
    }

    fn partition<T: Entity>(&self) -> Result<Arc<Partition<T>>> {
        let type_id = TypeId::of::<T>();
        let existing = self.partitions.read().get(&type_id).cloned();
        let partition = match existing {
            Some(partition) => partition,
            None => self
                .partitions
                .write()
                .entry(type_id)
                .or_insert_with(|| Arc::new(Partition::<T>::new()) as AnyPartition)
                .clone(),
        };
        partition
            .downcast::<Partition<T>>()
            .map_err(|_| Error::DataIntegrity("partition holds a different record type".to_string()))
    }

    fn find<T: Entity>(&self, conditions: &ConditionSet) -> Result<Vec<T>> {
        let predicate = Predicate::new(conditions);
        Ok(self
            .partition::<T>()?
            .load()
            .iter()
            .filter(|row| predicate.matches(*row))
            .cloned()
            .collect())
    }

    fn find_one<T: Entity>(&self, desc: &TypeDescriptor, key: &ConditionSet) -> Result<Option<T>> {
        let mut rows = self.find::<T>(key)?;
        match rows.len() {
            0 | 1 => Ok(rows.pop()),
            n => Err(duplicate_key(desc, n)),
        }
    }

    fn remove<T: Entity>(&self, desc: &TypeDescriptor, conditions: &ConditionSet) -> Result<()> {
        let predicate = Predicate::new(conditions);
        let removed = self.partition::<T>()?.mutate(|rows| {
            let before = rows.len();
            rows.retain(|row| !predicate.matches(row));
            Ok(before - rows.len())
        })?;
        tracing::debug!("Deleted {} {} rows", removed, desc.name);
        Ok(())
    }
}

impl DataContext for MemoryContext {
    async fn create<T: Entity>(&self, mut entity: T) -> Result<T> {
        let desc = self.descriptor::<T>()?;
        check_required(&desc, &entity)?;

        let created = self.partition::<T>()?.mutate(|rows| {
            if let Some(sequential) = desc.sequential_key() {
                let scope = parameters_of(&entity, desc.assigned_keys());
                let predicate = Predicate::new(&scope);
                let next = next_value(rows.iter().filter(|row| predicate.matches(*row)), sequential);
                entity.set(&sequential.name, Value::Int(next))?;
            }
            if let Some(identity) = desc.identity_key() {
                let next = next_value(rows.iter(), identity);
                entity.set(&identity.name, Value::Int(next))?;
            }
            stamp_insert(&desc, &mut entity, Utc::now())?;
            rows.push(entity.clone());
            Ok(entity)
        })?;

        tracing::debug!("Created {} row", desc.name);
        Ok(created)
    }

    async fn read<T: Entity>(&self, key: impl Into<Bag>) -> Result<Option<T>> {
        let desc = self.descriptor::<T>()?;
        let key = coalesce_key(&desc, key.into())?;
        self.find_one(&desc, &key)
    }

    async fn read_all<T: Entity>(&self) -> Result<Vec<T>> {
        self.descriptor::<T>()?;
        Ok(Vec::clone(&self.partition::<T>()?.load()))
    }

    async fn read_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<Vec<T>> {
        let desc = self.descriptor::<T>()?;
        let conditions = coalesce_conditions(&desc, conditions.into(), Requirement::AtLeastOne)?;
        self.find(&conditions)
    }

    async fn read_page<T: Entity>(
        &self,
        conditions: impl Into<Bag>,
        sort: SortSpec,
        page_size: u32,
        page_number: u32,
    ) -> Result<PagedList<T>> {
        let desc = self.descriptor::<T>()?;
        let window = PageWindow::new(page_size, page_number)?;
        let conditions = coalesce_conditions(&desc, conditions.into(), Requirement::Optional)?;
        let comparator = Comparator::new(resolve_sort(&desc, &sort)?);

        let mut rows = self.find::<T>(&conditions)?;
        rows.sort_by(|a, b| comparator.compare(a, b));

        let total_rows = rows.len() as u64;
        let page = rows
            .into_iter()
            .skip(window.offset())
            .take(window.page_size as usize)
            .collect();
        Ok(PagedList::new(page, total_rows, window))
    }

    async fn update<T: Entity>(&self, values: impl Into<Bag>) -> Result<Option<T>> {
        let desc = self.descriptor::<T>()?;
        let update = coalesce_update(&desc, values.into())?;
        let predicate = Predicate::new(&update.key);

        let updated = self.partition::<T>()?.mutate(|rows| {
            let mut matches = rows.iter_mut().filter(|row| predicate.matches(&**row));
            let Some(row) = matches.next() else {
                return Ok(None);
            };
            let extra = matches.count();
            if extra > 0 {
                return Err(duplicate_key(&desc, 1 + extra));
            }

            for (name, value) in update.values.iter() {
                row.set(name, value.clone())?;
            }
            let now = Value::DateTime(Utc::now());
            for field in desc.date_stamp_fields().filter(|f| f.stamp_on_update) {
                row.set(&field.name, now.clone())?;
            }
            Ok(Some(row.clone()))
        })?;

        tracing::debug!(
            "Updated {} row: {}",
            desc.name,
            if updated.is_some() { "found" } else { "missing" }
        );
        Ok(updated)
    }

    async fn delete<T: Entity>(&self, key: impl Into<Bag>) -> Result<()> {
        let desc = self.descriptor::<T>()?;
        let key = coalesce_key(&desc, key.into())?;
        self.remove::<T>(&desc, &key)
    }

    async fn delete_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<()> {
        let desc = self.descriptor::<T>()?;
        let conditions = coalesce_conditions(&desc, conditions.into(), Requirement::AtLeastOne)?;
        self.remove::<T>(&desc, &conditions)
    }
}

/// Field equality filter with SQL semantics: `Null` matches nothing.
struct Predicate<'a> {
    conditions: &'a ConditionSet,
}

impl<'a> Predicate<'a> {
    fn new(conditions: &'a ConditionSet) -> Self {
        Self { conditions }
    }

    fn matches<T: Entity>(&self, row: &T) -> bool {
        self.conditions.iter().all(|(name, expected)| {
            !expected.is_null()
                && row
                    .get(name)
                    .is_some_and(|actual| actual.compare(expected) == Ordering::Equal)
        })
    }
}

/// Lexicographic row ordering over resolved sort keys.
struct Comparator {
    keys: Vec<(String, SortOrder)>,
}

impl Comparator {
    fn new(keys: Vec<(&FieldDescriptor, SortOrder)>) -> Self {
        Self {
            keys: keys
                .into_iter()
                .map(|(f, order)| (f.name.clone(), order))
                .collect(),
        }
    }

    fn compare<T: Entity>(&self, a: &T, b: &T) -> Ordering {
        for (name, order) in &self.keys {
            let left = a.get(name).unwrap_or_default();
            let right = b.get(name).unwrap_or_default();
            let ordering = match order {
                SortOrder::Ascending => left.compare(&right),
                SortOrder::Descending => right.compare(&left),
            };
            if ordering != Ordering::Equal {
                return ordering;
            }
        }
        Ordering::Equal
    }
}

fn next_value<'a, T: Entity>(rows: impl Iterator<Item = &'a T>, field: &FieldDescriptor) -> i64 {
    rows.filter_map(|row| row.get(&field.name).and_then(|v| v.as_i64()))
        .max()
        .unwrap_or(0)
        + 1
}

fn duplicate_key(desc: &TypeDescriptor, count: usize) -> Error {
    Error::DataIntegrity(format!(
        "key lookup on '{}' matched {} rows",
        desc.name, count
    ))
}
