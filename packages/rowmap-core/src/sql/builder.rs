//! T-SQL statement text for a type descriptor.
//!
//! Every value travels as a named parameter `@Field`; only identifiers
//! derived from the descriptor are spliced into the text.

use crate::condition::{resolve_sort, ConditionSet, SortSpec};
use crate::descriptor::{FieldDescriptor, TypeDescriptor};
use crate::error::ArgumentError;

use super::cache::StatementKind;

/// Parameter holding the first row number of a page.
pub const FIRST_ROW_PARAM: &str = "__FirstRow";
/// Parameter holding the last row number of a page.
pub const LAST_ROW_PARAM: &str = "__LastRow";

/// `SELECT <column selects> FROM <table>`
pub fn select_all(desc: &TypeDescriptor) -> &str {
    desc.statements().get_or_render(StatementKind::SelectAll, || {
        format!("SELECT {} FROM {}", column_selects(desc), desc.table_identifier())
    })
}

/// Select-all filtered by every key field.
pub fn select_by_key(desc: &TypeDescriptor) -> &str {
    desc.statements().get_or_render(StatementKind::SelectByKey, || {
        append(select_all(desc), where_key(desc))
    })
}

/// Select-all filtered by the named conditions.
pub fn select_where(desc: &TypeDescriptor, conditions: &ConditionSet) -> Result<String, ArgumentError> {
    Ok(append(select_all(desc), &where_clause(desc, conditions)?))
}

/// `SELECT COUNT(*) FROM <table> [WHERE ...]`
pub fn count_where(desc: &TypeDescriptor, conditions: &ConditionSet) -> Result<String, ArgumentError> {
    let count = format!("SELECT COUNT(*) FROM {}", desc.table_identifier());
    Ok(append(&count, &where_clause(desc, conditions)?))
}

/// One page of rows numbered by `ROW_NUMBER()` over the sort.
///
/// The window is bound through the `@__FirstRow` and `@__LastRow`
/// parameters.
pub fn select_page(
    desc: &TypeDescriptor,
    conditions: &ConditionSet,
    sort: &SortSpec,
) -> Result<String, ArgumentError> {
    let order = order_by(desc, sort)?;
    let inner = append(
        &format!(
            "SELECT ROW_NUMBER() OVER (ORDER BY {}) AS __RowNumber, {} FROM {}",
            order,
            column_selects(desc),
            desc.table_identifier()
        ),
        &where_clause(desc, conditions)?,
    );
    let names = desc
        .fields()
        .iter()
        .map(|f| f.name.as_str())
        .collect::<Vec<_>>()
        .join(", ");

    Ok(format!(
        "SELECT {} FROM ({}) AS __Paged WHERE __RowNumber BETWEEN @{} AND @{} ORDER BY __RowNumber",
        names, inner, FIRST_ROW_PARAM, LAST_ROW_PARAM
    ))
}

/// `Column ASC|DESC, ...` for the sort, or the default sort when empty.
///
/// With no sort keys at all, orders by `(SELECT NULL)`.
pub fn order_by(desc: &TypeDescriptor, sort: &SortSpec) -> Result<String, ArgumentError> {
    let resolved = resolve_sort(desc, sort)?;
    if resolved.is_empty() {
        return Ok("(SELECT NULL)".to_string());
    }
    Ok(resolved
        .iter()
        .map(|(field, order)| format!("{} {}", field.column, order.keyword()))
        .collect::<Vec<_>>()
        .join(", "))
}

/// `WHERE Key1 = @Key1 AND ...` over every key field.
pub fn where_key(desc: &TypeDescriptor) -> &str {
    desc.statements()
        .get_or_render(StatementKind::WhereKey, || equalities("WHERE", " AND ", desc.keys()))
}

/// `WHERE Col = @Field AND ...` over the named conditions; empty when there are none.
pub fn where_clause(desc: &TypeDescriptor, conditions: &ConditionSet) -> Result<String, ArgumentError> {
    let fields = lookup(desc, conditions)?;
    Ok(equalities("WHERE", " AND ", fields.into_iter()))
}

/// Insert of every insertable field.
///
/// With an Identity key the statement outputs the inserted identity,
/// aliased to its field name. A type with nothing to insert uses
/// `DEFAULT VALUES`.
pub fn insert(desc: &TypeDescriptor) -> &str {
    desc.statements().get_or_render(StatementKind::Insert, || {
        let fields: Vec<&FieldDescriptor> = desc.insertable_fields().collect();
        let columns = fields
            .iter()
            .map(|f| f.column.as_str())
            .collect::<Vec<_>>()
            .join(", ");
        let values = fields
            .iter()
            .map(|f| format!("@{}", f.name))
            .collect::<Vec<_>>()
            .join(", ");
        let output = desc
            .identity_key()
            .map(|f| format!(" OUTPUT inserted.{}", f.column_select()))
            .unwrap_or_default();

        if fields.is_empty() {
            return format!("INSERT INTO {}{} DEFAULT VALUES", desc.table_identifier(), output);
        }
        format!(
            "INSERT INTO {} ({}){} VALUES ({})",
            desc.table_identifier(),
            columns,
            output,
            values
        )
    })
}

/// Update of the given fields, filtered by every key.
///
/// Names that are not updateable are skipped. Date stamps refreshed on
/// update are set to `GETDATE()`.
///
/// # Returns
/// `Err(ArgumentError::NoUpdateableFields)` when nothing writable remains.
pub fn update(desc: &TypeDescriptor, values: &ConditionSet) -> Result<String, ArgumentError> {
    let fields: Vec<&FieldDescriptor> = values
        .names()
        .filter_map(|name| desc.field(name))
        .filter(|f| f.is_updateable())
        .collect();

    if fields.is_empty() {
        return Err(ArgumentError::NoUpdateableFields {
            entity: desc.name.clone(),
        });
    }

    let mut assignments: Vec<String> = fields
        .iter()
        .map(|f| format!("{} = @{}", f.column, f.name))
        .collect();
    assignments.extend(
        desc.date_stamp_fields()
            .filter(|f| f.stamp_on_update)
            .map(|f| format!("{} = GETDATE()", f.column)),
    );

    Ok(format!(
        "UPDATE {} SET {} {}",
        desc.table_identifier(),
        assignments.join(", "),
        where_key(desc)
    ))
}

/// `DELETE FROM <table>`
pub fn delete(desc: &TypeDescriptor) -> &str {
    desc.statements().get_or_render(StatementKind::Delete, || {
        format!("DELETE FROM {}", desc.table_identifier())
    })
}

/// Delete filtered by every key field.
pub fn delete_by_key(desc: &TypeDescriptor) -> &str {
    desc.statements().get_or_render(StatementKind::DeleteByKey, || {
        append(delete(desc), where_key(desc))
    })
}

/// Delete filtered by the named conditions.
pub fn delete_where(desc: &TypeDescriptor, conditions: &ConditionSet) -> Result<String, ArgumentError> {
    Ok(append(delete(desc), &where_clause(desc, conditions)?))
}

/// Next value of the Sequential key, scoped by the Assigned keys.
///
/// `None` when the type has no Sequential key.
pub fn next_sequential_id(desc: &TypeDescriptor) -> Option<&str> {
    let sequential = desc.sequential_key()?;
    Some(desc.statements().get_or_render(StatementKind::NextSequentialId, || {
        let select = format!(
            "SELECT COALESCE(MAX({}), 0) + 1 FROM {}",
            sequential.column,
            desc.table_identifier()
        );
        append(&select, &equalities("WHERE", " AND ", desc.assigned_keys()))
    }))
}

fn column_selects(desc: &TypeDescriptor) -> String {
    desc.fields()
        .iter()
        .map(|f| f.column_select())
        .collect::<Vec<_>>()
        .join(", ")
}

fn lookup<'a>(
    desc: &'a TypeDescriptor,
    conditions: &ConditionSet,
) -> Result<Vec<&'a FieldDescriptor>, ArgumentError> {
    conditions
        .names()
        .map(|name| {
            desc.field(name).ok_or_else(|| ArgumentError::UnknownField {
                entity: desc.name.clone(),
                field: name.to_string(),
            })
        })
        .collect()
}

fn equalities<'a>(
    keyword: &str,
    separator: &str,
    fields: impl Iterator<Item = &'a FieldDescriptor>,
) -> String {
    let terms: Vec<String> = fields
        .map(|f| format!("{} = @{}", f.column, f.name))
        .collect();
    if terms.is_empty() {
        String::new()
    } else {
        format!("{} {}", keyword, terms.join(separator))
    }
}

fn append(statement: &str, clause: &str) -> String {
    if clause.is_empty() {
        statement.to_string()
    } else {
        format!("{} {}", statement, clause)
    }
}
