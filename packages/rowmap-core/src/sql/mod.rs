//! Parameterized SQL statement generation.

mod builder;
mod cache;

pub use builder::{
    count_where, delete, delete_by_key, delete_where, insert, next_sequential_id, order_by,
    select_all, select_by_key, select_page, select_where, update, where_clause, where_key,
    FIRST_ROW_PARAM, LAST_ROW_PARAM,
};
pub(crate) use cache::StatementCache;

use crate::condition::ConditionSet;

/// Named statement parameters; each name binds as `@name`.
pub type Parameters = ConditionSet;
