use thiserror::Error;

pub const LIST_TABLES_SQL: &str = "SHOW TABLES";
const ORDER_COLUMN: &str = "id";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SqlGenerationError {
    #[error("table name cannot be empty")]
    EmptyTableName,
}

/// SQL text with positional `?` placeholders and the integers bound to them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BoundQuery {
    sql: String,
    params: Vec<u64>,
}

impl BoundQuery {
    #[must_use]
    pub fn new(sql: impl Into<String>, params: Vec<u64>) -> Self {
        Self {
            sql: sql.into(),
            params,
        }
    }

    #[must_use]
    pub fn sql(&self) -> &str {
        &self.sql
    }

    #[must_use]
    pub fn params(&self) -> &[u64] {
        &self.params
    }
}

#[must_use]
pub fn quote_identifier(identifier: &str) -> String {
    format!("`{}`", identifier.replace('`', "``"))
}

fn table_sql(table: &str) -> Result<String, SqlGenerationError> {
    let trimmed = table.trim();
    if trimmed.is_empty() {
        return Err(SqlGenerationError::EmptyTableName);
    }
    Ok(quote_identifier(trimmed))
}

pub fn preview_select_sql(table: &str, limit: u64) -> Result<BoundQuery, SqlGenerationError> {
    Ok(BoundQuery::new(
        format!("SELECT * FROM {} LIMIT ?", table_sql(table)?),
        vec![limit],
    ))
}

/// The filter is a raw SQL condition typed by the user; a blank filter drops
/// the `WHERE` clause but keeps the ordering.
pub fn filtered_select_sql(
    table: &str,
    filter: &str,
    limit: u64,
) -> Result<BoundQuery, SqlGenerationError> {
    let table = table_sql(table)?;
    let order = quote_identifier(ORDER_COLUMN);
    let filter = filter.trim();

    let sql = if filter.is_empty() {
        format!("SELECT * FROM {table} ORDER BY {order} LIMIT ?")
    } else {
        format!("SELECT * FROM {table} WHERE {filter} ORDER BY {order} LIMIT ?")
    };
    Ok(BoundQuery::new(sql, vec![limit]))
}

pub fn offset_page_sql(
    table: &str,
    limit: u64,
    offset: u64,
) -> Result<BoundQuery, SqlGenerationError> {
    Ok(BoundQuery::new(
        format!("SELECT * FROM {} LIMIT ? OFFSET ?", table_sql(table)?),
        vec![limit, offset],
    ))
}
