use async_trait::async_trait;
use diesel::prelude::*;
use diesel::query_builder::{BoxedSqlQuery, SqlQuery};
use diesel::sql_types::{BigInt, Double, Nullable, Text};
use diesel::sqlite::{Sqlite, SqliteConnection};
use serde_json::{Map, Value};
use std::sync::Arc;

use records_sync_core::apply::LocalTableStore;
use records_sync_core::errors::{DatabaseError, Error, Result};
use records_sync_core::transform::{LocalRow, RowKey};
use records_sync_core::utils::validate_identifier;

use crate::db::{get_connection, DbPool, WriteHandle};
use crate::errors::StorageError;
use crate::utils::{chunk_for_json_object, quote_ident};

type BoxedQuery<'f> = BoxedSqlQuery<'f, Sqlite, SqlQuery>;

#[derive(QueryableByName, Debug)]
struct RowJson {
    #[diesel(sql_type = Text)]
    row_json: String,
}

/// Row access to local tables by natural key.
///
/// Table and column names are validated identifiers; values are always bound.
pub struct LocalTableRepository {
    pool: Arc<DbPool>,
    writer: WriteHandle,
}

impl LocalTableRepository {
    pub fn new(pool: Arc<DbPool>, writer: WriteHandle) -> Self {
        Self { pool, writer }
    }

    /// Number of rows in `table`.
    pub fn count_rows(&self, table: &str) -> Result<i64> {
        #[derive(QueryableByName)]
        struct Count {
            #[diesel(sql_type = BigInt)]
            n: i64,
        }

        let sql = format!("SELECT COUNT(*) AS n FROM {}", quoted(table)?);
        let mut conn = get_connection(&self.pool)?;
        let count = diesel::sql_query(sql)
            .get_result::<Count>(&mut conn)
            .map_err(StorageError::from)?;
        Ok(count.n)
    }
}

fn quoted(name: &str) -> Result<String> {
    validate_identifier(name).map(quote_ident)
}

fn bind_value<'f>(query: BoxedQuery<'f>, value: &Value) -> BoxedQuery<'f> {
    match value {
        Value::Null => query.bind::<Nullable<Text>, _>(None::<String>),
        Value::Bool(b) => query.bind::<BigInt, _>(i64::from(*b)),
        Value::Number(n) => match (n.as_i64(), n.as_f64()) {
            (Some(i), _) => query.bind::<BigInt, _>(i),
            (None, Some(f)) => query.bind::<Double, _>(f),
            (None, None) => query.bind::<Text, _>(n.to_string()),
        },
        Value::String(s) => query.bind::<Text, _>(s.clone()),
        other => query.bind::<Text, _>(other.to_string()),
    }
}

/// `"a" = ? AND "b" = ?` for the key columns.
fn key_clause(key: &RowKey) -> Result<String> {
    if key.parts().is_empty() {
        return Err(Error::Database(DatabaseError::QueryFailed(
            "Row key has no columns".to_string(),
        )));
    }
    let parts = key
        .columns()
        .map(|c| quoted(c).map(|q| format!("{} = ?", q)))
        .collect::<Result<Vec<_>>>()?;
    Ok(parts.join(" AND "))
}

fn bind_key<'f>(mut query: BoxedQuery<'f>, key: &RowKey) -> BoxedQuery<'f> {
    for (_, value) in key.parts() {
        query = bind_value(query, value);
    }
    query
}

fn json_object_expr(columns: &[String]) -> Result<String> {
    let pairs = columns
        .iter()
        .map(|c| quoted(c).map(|q| format!("'{}', {}", c, q)))
        .collect::<Result<Vec<_>>>()?;
    Ok(format!("json_object({})", pairs.join(", ")))
}

fn select_chunk(
    conn: &mut SqliteConnection,
    table: &str,
    key: &RowKey,
    columns: &[String],
) -> Result<Option<Map<String, Value>>> {
    let sql = format!(
        "SELECT {} AS row_json FROM {} WHERE {} LIMIT 1",
        json_object_expr(columns)?,
        quoted(table)?,
        key_clause(key)?
    );
    let query = bind_key(diesel::sql_query(sql).into_boxed::<Sqlite>(), key);
    let found = query
        .get_result::<RowJson>(conn)
        .optional()
        .map_err(StorageError::from)?;

    match found {
        Some(row) => match serde_json::from_str::<Value>(&row.row_json)? {
            Value::Object(map) => Ok(Some(map)),
            other => Err(Error::Database(DatabaseError::Internal(format!(
                "Expected a JSON object row from {}, got {}",
                table, other
            )))),
        },
        None => Ok(None),
    }
}

#[async_trait]
impl LocalTableStore for LocalTableRepository {
    async fn find_row(
        &self,
        table: &str,
        key: &RowKey,
        columns: &[String],
    ) -> Result<Option<LocalRow>> {
        let mut conn = get_connection(&self.pool)?;

        if columns.is_empty() {
            return Ok(select_chunk(&mut conn, table, key, &[])?.map(|_| LocalRow::new()));
        }

        let mut merged = Map::new();
        for chunk in chunk_for_json_object(columns) {
            match select_chunk(&mut conn, table, key, chunk)? {
                Some(part) => merged.extend(part),
                None => return Ok(None),
            }
        }

        let mut row = LocalRow::new();
        for column in columns {
            let value = merged.get(column).cloned().unwrap_or(Value::Null);
            row.insert(column.clone(), value);
        }
        Ok(Some(row))
    }

    async fn insert_row(&self, table: &str, row: &LocalRow) -> Result<()> {
        if row.is_empty() {
            return Err(Error::Database(DatabaseError::QueryFailed(format!(
                "Nothing to insert into {}",
                table
            ))));
        }
        let columns = row
            .columns()
            .map(|c| quoted(c))
            .collect::<Result<Vec<_>>>()?;
        let placeholders = vec!["?"; columns.len()].join(", ");
        let sql = format!(
            "INSERT INTO {} ({}) VALUES ({})",
            quoted(table)?,
            columns.join(", "),
            placeholders
        );
        let values: Vec<Value> = row.iter().map(|(_, v)| v.clone()).collect();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<()> {
                let mut query = diesel::sql_query(sql).into_boxed::<Sqlite>();
                for value in &values {
                    query = bind_value(query, value);
                }
                query.execute(conn).map_err(StorageError::from)?;
                Ok(())
            })
            .await
    }

    async fn update_row(&self, table: &str, key: &RowKey, changes: &LocalRow) -> Result<usize> {
        if changes.is_empty() {
            return Ok(0);
        }
        let assignments = changes
            .columns()
            .map(|c| quoted(c).map(|q| format!("{} = ?", q)))
            .collect::<Result<Vec<_>>>()?;
        let sql = format!(
            "UPDATE {} SET {} WHERE {}",
            quoted(table)?,
            assignments.join(", "),
            key_clause(key)?
        );
        let values: Vec<Value> = changes.iter().map(|(_, v)| v.clone()).collect();
        let key = key.clone();

        self.writer
            .exec(move |conn: &mut SqliteConnection| -> Result<usize> {
                let mut query = diesel::sql_query(sql).into_boxed::<Sqlite>();
                for value in &values {
                    query = bind_value(query, value);
                }
                query = bind_key(query, &key);
                Ok(query.execute(conn).map_err(StorageError::from)?)
            })
            .await
    }
}
