//! CRUD orchestration over an external SQL driver.

use std::sync::Arc;

use chrono::Utc;

use crate::condition::{
    coalesce_conditions, coalesce_key, coalesce_update, Bag, ConditionSet, Requirement, SortSpec,
};
use crate::descriptor::{DescriptorRegistry, TypeDescriptor};
use crate::entity::{Entity, Row};
use crate::error::{DriverError, Error, Result};
use crate::sql::{self, Parameters, FIRST_ROW_PARAM, LAST_ROW_PARAM};
use crate::value::Value;

use super::{check_required, parameters_of, stamp_insert, DataContext, PageWindow, PagedList};

/// Database driver seam.
///
/// Statements are T-SQL with `@name` parameters; every parameter set
/// names each placeholder in the statement.
#[allow(async_fn_in_trait)]
pub trait Connection {
    /// Runs a statement returning rows, keyed by result column name.
    async fn query(&self, sql: &str, params: &Parameters) -> std::result::Result<Vec<Row>, DriverError>;

    /// Runs a statement returning a single value.
    async fn query_scalar(
        &self,
        sql: &str,
        params: &Parameters,
    ) -> std::result::Result<Option<Value>, DriverError>;

    /// Runs a statement returning the affected row count.
    async fn execute(&self, sql: &str, params: &Parameters) -> std::result::Result<u64, DriverError>;
}

/// [`DataContext`] that issues statements through a [`Connection`].
pub struct SqlContext<C> {
    connection: C,
    registry: Arc<DescriptorRegistry>,
}

impl<C: Connection> SqlContext<C> {
    pub fn new(connection: C, registry: Arc<DescriptorRegistry>) -> Self {
        Self {
            connection,
            registry,
        }
    }

    pub fn connection(&self) -> &C {
        &self.connection
    }

    pub fn registry(&self) -> &Arc<DescriptorRegistry> {
        &self.registry
    }

    fn descriptor<T: Entity>(&self) -> Result<Arc<TypeDescriptor>> {
        Ok(self.registry.descriptor::<T>()?)
    }

    fn log(&self, sql: &str, params: &Parameters) {
        if self.registry.config().log_statements {
            tracing::debug!("Executing {} with {} parameters", sql, params.len());
        }
    }

    async fn rows(&self, sql: &str, params: &Parameters) -> Result<Vec<Row>> {
        self.log(sql, params);
        self.connection.query(sql, params).await.map_err(Error::Driver)
    }

    async fn scalar(&self, sql: &str, params: &Parameters) -> Result<Option<Value>> {
        self.log(sql, params);
        self.connection
            .query_scalar(sql, params)
            .await
            .map_err(Error::Driver)
    }

    async fn execute(&self, sql: &str, params: &Parameters) -> Result<u64> {
        self.log(sql, params);
        self.connection.execute(sql, params).await.map_err(Error::Driver)
    }

    async fn read_by_key<T: Entity>(&self, desc: &TypeDescriptor, key: &ConditionSet) -> Result<Option<T>> {
        let mut rows = self.rows(sql::select_by_key(desc), key).await?;
        match rows.len() {
            0 => Ok(None),
            1 => rows.pop().map(T::from_row).transpose(),
            n => Err(Error::DataIntegrity(format!(
                "key lookup on '{}' matched {} rows",
                desc.name, n
            ))),
        }
    }
}

impl<C: Connection> DataContext for SqlContext<C> {
    async fn create<T: Entity>(&self, mut entity: T) -> Result<T> {
        let desc = self.descriptor::<T>()?;
        check_required(&desc, &entity)?;

        if let (Some(sequential), Some(statement)) =
            (desc.sequential_key(), sql::next_sequential_id(&desc))
        {
            let scope = parameters_of(&entity, desc.assigned_keys());
            let next = self.scalar(statement, &scope).await?.ok_or_else(|| {
                Error::DataIntegrity(format!("no next sequential value for '{}'", desc.name))
            })?;
            entity.set(&sequential.name, next)?;
        }

        stamp_insert(&desc, &mut entity, Utc::now())?;

        let params = parameters_of(&entity, desc.insertable_fields());
        match desc.identity_key() {
            Some(identity) => {
                let rows = self.rows(sql::insert(&desc), &params).await?;
                let value = rows
                    .first()
                    .and_then(|row| row.get(&identity.name))
                    .cloned()
                    .ok_or_else(|| {
                        Error::DataIntegrity(format!(
                            "insert into '{}' returned no identity",
                            desc.name
                        ))
                    })?;
                entity.set(&identity.name, value)?;
            }
            None => {
                self.execute(sql::insert(&desc), &params).await?;
            }
        }
        Ok(entity)
    }

    async fn read<T: Entity>(&self, key: impl Into<Bag>) -> Result<Option<T>> {
        let desc = self.descriptor::<T>()?;
        let key = coalesce_key(&desc, key.into())?;
        self.read_by_key(&desc, &key).await
    }

    async fn read_all<T: Entity>(&self) -> Result<Vec<T>> {
        let desc = self.descriptor::<T>()?;
        let rows = self.rows(sql::select_all(&desc), &Parameters::new()).await?;
        rows.into_iter().map(T::from_row).collect()
    }

    async fn read_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<Vec<T>> {
        let desc = self.descriptor::<T>()?;
        let conditions = coalesce_conditions(&desc, conditions.into(), Requirement::AtLeastOne)?;
        let statement = sql::select_where(&desc, &conditions)?;
        let rows = self.rows(&statement, &conditions).await?;
        rows.into_iter().map(T::from_row).collect()
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
        let page_statement = sql::select_page(&desc, &conditions, &sort)?;

        let count = self
            .scalar(&sql::count_where(&desc, &conditions)?, &conditions)
            .await?;
        let total_rows = match count {
            None => 0,
            Some(value) => value
                .as_i64()
                .and_then(|n| u64::try_from(n).ok())
                .ok_or_else(|| Error::DataIntegrity(format!("invalid row count {}", value)))?,
        };

        let mut params = conditions;
        params.insert(FIRST_ROW_PARAM, Value::Int(window.first_row as i64));
        params.insert(LAST_ROW_PARAM, Value::Int(window.last_row as i64));
        let rows = self
            .rows(&page_statement, &params)
            .await?
            .into_iter()
            .map(T::from_row)
            .collect::<Result<Vec<_>>>()?;

        Ok(PagedList::new(rows, total_rows, window))
    }

    async fn update<T: Entity>(&self, values: impl Into<Bag>) -> Result<Option<T>> {
        let desc = self.descriptor::<T>()?;
        let update = coalesce_update(&desc, values.into())?;
        let statement = sql::update(&desc, &update.values)?;
        self.execute(&statement, &update.parameters()).await?;
        self.read_by_key(&desc, &update.key).await
    }

    async fn delete<T: Entity>(&self, key: impl Into<Bag>) -> Result<()> {
        let desc = self.descriptor::<T>()?;
        let key = coalesce_key(&desc, key.into())?;
        self.execute(sql::delete_by_key(&desc), &key).await?;
        Ok(())
    }

    async fn delete_list<T: Entity>(&self, conditions: impl Into<Bag>) -> Result<()> {
        let desc = self.descriptor::<T>()?;
        let conditions = coalesce_conditions(&desc, conditions.into(), Requirement::AtLeastOne)?;
        let statement = sql::delete_where(&desc, &conditions)?;
        self.execute(&statement, &conditions).await?;
        Ok(())
    }
}
