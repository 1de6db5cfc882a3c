//! CRUD contexts over a SQL driver or in-process storage.

mod memory;
mod partition;
mod sql;

pub use memory::MemoryContext;
pub use sql::{Connection, SqlContext};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::condition::{Bag, ConditionSet, SortSpec};
use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::entity::Entity;
use crate::error::{ArgumentError, Result};
use crate::value::Value;

/// CRUD operations over mapped entity types.
///
/// Keys, conditions and update sets are [`Bag`]s: either a bare key value
/// or named field values.
#[allow(async_fn_in_trait)]
pub trait DataContext {
    /// Inserts a record, filling generated keys, date stamps and the
    /// soft-delete value. Returns the hydrated record.
    async fn create<T: Entity>(&self, entity: T) -> Result<T>;

    /// Reads one record by key; `None` when no row matches.
    async fn read<T: Entity>(&self, key: impl Into<Bag>) -> Result<Option<T>>;

    /// Reads every record.
    async fn read_all<T: Entity>(&self) -> Result<Vec<T>>;

    /// Reads the records matching at least one condition.
    async fn read_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<Vec<T>>;

    /// Reads one page of matching records; empty conditions match everything.
    async fn read_page<T: Entity>(
        &self,
        conditions: impl Into<Bag>,
        sort: SortSpec,
        page_size: u32,
        page_number: u32,
    ) -> Result<PagedList<T>>;

    /// Updates the writable fields named in the bag, then re-reads the record.
    async fn update<T: Entity>(&self, values: impl Into<Bag>) -> Result<Option<T>>;

    /// Deletes one record by key. Missing keys are not an error.
    async fn delete<T: Entity>(&self, key: impl Into<Bag>) -> Result<()>;

    /// Deletes the records matching at least one condition.
    async fn delete_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<()>;
}

/// One page of results plus paging metadata.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PagedList<T> {
    pub rows: Vec<T>,
    pub total_rows: u64,
    pub total_pages: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> PagedList<T> {
    pub fn new(rows: Vec<T>, total_rows: u64, window: PageWindow) -> Self {
        Self {
            rows,
            total_rows,
            total_pages: total_rows.div_ceil(window.page_size),
            has_previous: window.first_row > 1,
            has_next: window.last_row < total_rows,
        }
    }
}

/// One-based row range covered by a page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub page_size: u64,
    pub first_row: u64,
    pub last_row: u64,
}

impl PageWindow {
    /// # Returns
    /// `Err(ArgumentError::InvalidPage)` when either argument is zero.
    pub fn new(page_size: u32, page_number: u32) -> std::result::Result<Self, ArgumentError> {
        if page_size == 0 || page_number == 0 {
            return Err(ArgumentError::InvalidPage {
                page_size,
                page_number,
            });
        }
        let page_size = u64::from(page_size);
        let first_row = (u64::from(page_number) - 1) * page_size + 1;
        Ok(Self {
            page_size,
            first_row,
            last_row: first_row + page_size - 1,
        })
    }

    /// Zero-based offset of the first row.
    pub fn offset(&self) -> usize {
        (self.first_row - 1) as usize
    }
}

/// Field values of a record as statement parameters.
pub(crate) fn parameters_of<'a, T: Entity>(
    entity: &T,
    fields: impl Iterator<Item = &'a FieldDescriptor>,
) -> ConditionSet {
    fields
        .map(|f| (f.name.clone(), entity.get(&f.name).unwrap_or_default()))
        .collect()
}

/// Rejects a create that leaves a caller-supplied required field empty.
pub(crate) fn check_required<T: Entity>(desc: &TypeDescriptor, entity: &T) -> Result<()> {
    for field in desc.required_fields().filter(|f| !f.is_generated()) {
        if entity.get(&field.name).map_or(true, |v| v.is_null()) {
            return Err(ArgumentError::RequiredFieldMissing {
                entity: desc.name.clone(),
                field: field.name.clone(),
            }
            .into());
        }
    }
    Ok(())
}

/// Sets every date stamp to `now` and the soft-delete field to its
/// inserted value.
pub(crate) fn stamp_insert<T: Entity>(
    desc: &TypeDescriptor,
    entity: &mut T,
    now: DateTime<Utc>,
) -> Result<()> {
    for field in desc.date_stamp_fields() {
        entity.set(&field.name, Value::DateTime(now))?;
    }
    if let Some(field) = desc.soft_delete_field() {
        if let Some(values) = &field.soft_delete {
            entity.set(&field.name, values.inserted.clone())?;
        }
    }
    Ok(())
}
