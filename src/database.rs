//! Schema introspection and query execution against the live database.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::postgres::{PgConnection, PgPool, PgRow, PgTypeKind};
use sqlx::types::chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Utc};
use sqlx::types::{Decimal, JsonValue, Uuid};
use sqlx::{Column, Postgres, Row, TypeInfo, ValueRef};
use tracing::{debug, warn};

use crate::config::{ConnectionConfig, ErrorDisclosure};
use crate::error::SchemaError;
use crate::types::{ExecutionResult, GeneratedQuery, SchemaDescription};

const DEFAULT_SCHEMA: &str = "public";
const UNSUPPORTED: &str = "<unsupported>";
const REDACTED_FAILURE: &str =
    "Error: the query could not be executed. Details were withheld by configuration.";

/// Rows of a generated query that reach the answer prompt.
pub const MAX_RESULT_ROWS: usize = 100;
/// Longer values are cut and end with `...`.
pub const MAX_VALUE_CHARS: usize = 300;

#[async_trait]
pub trait SchemaProvider: Send + Sync {
    /// Describes the tables as they are right now. Never cached.
    async fn get_schema(&self) -> Result<SchemaDescription, SchemaError>;
}

#[async_trait]
pub trait QueryExecutor: Send + Sync {
    /// Runs `query`. Any failure comes back as [`ExecutionResult::Failed`].
    async fn run(&self, query: &GeneratedQuery) -> ExecutionResult;
}

/// A live database handle: both halves the pipeline needs.
pub trait Database: SchemaProvider + QueryExecutor {}

impl<T: SchemaProvider + QueryExecutor> Database for T {}

pub struct PgDatabase {
    db: PgPool,
    schema: String,
    sample_rows: u32,
    disclosure: ErrorDisclosure,
}

impl PgDatabase {
    pub async fn connect(
        config: &ConnectionConfig,
        sample_rows: u32,
        disclosure: ErrorDisclosure,
    ) -> Result<Self, anyhow::Error> {
        let pool = PgPool::connect_with(config.connect_options()?).await?;

        Ok(PgDatabase {
            db: pool,
            schema: DEFAULT_SCHEMA.to_string(),
            sample_rows,
            disclosure,
        })
    }

    /// Describe the tables of `schema` instead of `public`.
    pub fn with_schema(mut self, schema: impl Into<String>) -> Self {
        self.schema = schema.into();
        self
    }

    async fn table_names(&self) -> Result<Vec<String>, sqlx::Error> {
        sqlx::query_scalar(
            "SELECT table_name::text FROM information_schema.tables \
             WHERE table_schema = $1 AND table_type = 'BASE TABLE' \
             ORDER BY table_name",
        )
        .bind(self.schema.as_str())
        .fetch_all(&self.db)
        .await
    }

    async fn columns(&self, table_name: &str) -> Result<Vec<ColumnInfo>, sqlx::Error> {
        let rows: Vec<(String, String, String, String, Vec<String>)> = sqlx::query_as(
            "SELECT c.column_name::text, c.data_type::text, c.udt_name::text, c.is_nullable::text, \
                    COALESCE((SELECT array_agg(e.enumlabel::text ORDER BY e.enumsortorder) \
                              FROM pg_catalog.pg_type t \
                              JOIN pg_catalog.pg_namespace n ON n.oid = t.typnamespace \
                              JOIN pg_catalog.pg_enum e ON e.enumtypid = t.oid \
                              WHERE t.typname = c.udt_name AND n.nspname = c.udt_schema), \
                             ARRAY[]::text[]) \
             FROM information_schema.columns c \
             WHERE c.table_schema = $1 AND c.table_name = $2 \
             ORDER BY c.ordinal_position",
        )
        .bind(self.schema.as_str())
        .bind(table_name)
        .fetch_all(&self.db)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(name, data_type, udt_name, is_nullable, enum_labels)| ColumnInfo {
                name,
                data_type: column_type(&data_type, &udt_name),
                nullable: is_nullable == "YES",
                enum_labels,
            })
            .collect())
    }

    async fn sample(&self, table_name: &str) -> Result<Vec<Record>, sqlx::Error> {
        let sql = format!(
            "SELECT * FROM {}.{} LIMIT {}",
            quote_ident(&self.schema),
            quote_ident(table_name),
            self.sample_rows
        );
        let rows = sqlx::query(&sql).persistent(false).fetch_all(&self.db).await?;

        Ok(rows.iter().map(record).collect())
    }

    /// Runs `sql` in a read-only transaction that is always rolled back.
    /// Returns at most [`MAX_RESULT_ROWS`] rows and whether more were available.
    async fn fetch_read_only(&self, sql: &str) -> Result<(Vec<PgRow>, bool), sqlx::Error> {
        let mut tx = self.db.begin().await?;
        sqlx::query("SET TRANSACTION READ ONLY")
            .execute(&mut *tx)
            .await?;

        let rows = fetch_capped(&mut *tx, sql).await;
        let rolled_back = tx.rollback().await;

        let rows = rows?;
        rolled_back?;
        Ok(rows)
    }
}

async fn fetch_capped(conn: &mut PgConnection, sql: &str) -> Result<(Vec<PgRow>, bool), sqlx::Error> {
    let mut stream = sqlx::query(sql).persistent(false).fetch(conn);
    let mut rows = Vec::new();

    while let Some(row) = stream.try_next().await? {
        if rows.len() == MAX_RESULT_ROWS {
            return Ok((rows, true));
        }
        rows.push(row);
    }

    Ok((rows, false))
}

#[async_trait]
impl SchemaProvider for PgDatabase {
    async fn get_schema(&self) -> Result<SchemaDescription, SchemaError> {
        let mut tables_info = Vec::new();

        for table_name in self.table_names().await? {
            let columns = self.columns(&table_name).await?;

            let sample = if self.sample_rows == 0 {
                None
            } else {
                match self.sample(&table_name).await {
                    Ok(rows) => Some(rows),
                    Err(e) => {
                        warn!(table = %table_name, error = %e, "skipping sample rows");
                        None
                    }
                }
            };

            tables_info.push(render_table(&table_name, &columns, sample.as_deref()));
        }

        debug!(schema = %self.schema, tables = tables_info.len(), "schema described");

        Ok(SchemaDescription::new(tables_info.join("\n\n")))
    }
}

#[async_trait]
impl QueryExecutor for PgDatabase {
    async fn run(&self, query: &GeneratedQuery) -> ExecutionResult {
        match self.fetch_read_only(query.as_str()).await {
            Ok((rows, truncated)) => {
                debug!(rows = rows.len(), truncated, "generated query returned rows");
                let records: Vec<Record> = rows.iter().map(record).collect();
                ExecutionResult::Rows(render_records(&records, truncated))
            }
            Err(e) => {
                warn!(error = %e, "generated query failed");
                failure_text(&e.to_string(), self.disclosure)
            }
        }
    }
}

/// Wraps a database error message according to the disclosure policy.
pub fn failure_text(message: &str, disclosure: ErrorDisclosure) -> ExecutionResult {
    match disclosure {
        ErrorDisclosure::Verbatim => ExecutionResult::Failed(format!("Error: {}", message)),
        ErrorDisclosure::Redacted => ExecutionResult::Failed(REDACTED_FAILURE.to_string()),
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub data_type: String,
    pub nullable: bool,
    /// Labels of an enum-typed column, in declaration order.
    pub enum_labels: Vec<String>,
}

/// `information_schema` reports `USER-DEFINED` and `ARRAY` for enums, domains
/// and arrays; the underlying type name is in `udt_name`.
pub fn column_type(data_type: &str, udt_name: &str) -> String {
    match data_type {
        "USER-DEFINED" => udt_name.to_string(),
        "ARRAY" => format!("{}[]", udt_name.strip_prefix('_').unwrap_or(udt_name)),
        _ => data_type.to_string(),
    }
}

/// One row as (column name, rendered value) pairs.
pub type Record = Vec<(String, String)>;

fn record(row: &PgRow) -> Record {
    row.columns()
        .iter()
        .enumerate()
        .map(|(index, column)| {
            (
                column.name().to_string(),
                truncate_value(render_value(row, index)),
            )
        })
        .collect()
}

fn render_value(row: &PgRow, index: usize) -> String {
    match row.try_get_raw(index) {
        Ok(raw) if raw.is_null() => return "NULL".to_string(),
        Ok(raw) => {
            if let PgTypeKind::Enum(_) = raw.type_info().kind() {
                return match raw.as_str() {
                    Ok(label) => format!("{:?}", label),
                    Err(_) => UNSUPPORTED.to_string(),
                };
            }
        }
        Err(_) => return UNSUPPORTED.to_string(),
    }

    if let Ok(text) = row.try_get::<String, _>(index) {
        return format!("{:?}", text);
    }

    decode::<i64>(row, index)
        .or_else(|| decode::<i32>(row, index))
        .or_else(|| decode::<i16>(row, index))
        .or_else(|| decode::<f64>(row, index))
        .or_else(|| decode::<f32>(row, index))
        .or_else(|| decode::<bool>(row, index))
        .or_else(|| decode::<Decimal>(row, index))
        .or_else(|| decode::<Uuid>(row, index))
        .or_else(|| decode::<JsonValue>(row, index))
        .or_else(|| decode::<NaiveDate>(row, index))
        .or_else(|| decode::<NaiveDateTime>(row, index))
        .or_else(|| decode::<DateTime<Utc>>(row, index))
        .or_else(|| decode::<NaiveTime>(row, index))
        .or_else(|| decode_array::<String>(row, index, |s| format!("{:?}", s)))
        .or_else(|| decode_array::<i64>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<i32>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<i16>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<f64>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<bool>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<Decimal>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<Uuid>(row, index, |v| v.to_string()))
        .or_else(|| decode_array::<NaiveDate>(row, index, |v| v.to_string()))
        .unwrap_or_else(|| {
            let type_name = row.column(index).type_info().name();
            debug!(column = index, type_name, "value type not rendered");
            UNSUPPORTED.to_string()
        })
}

fn decode<'r, T>(row: &'r PgRow, index: usize) -> Option<String>
where
    T: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres> + ToString,
{
    row.try_get::<T, _>(index).ok().map(|value| value.to_string())
}

fn decode_array<'r, T>(row: &'r PgRow, index: usize, render: fn(T) -> String) -> Option<String>
where
    Vec<Option<T>>: sqlx::Decode<'r, Postgres> + sqlx::Type<Postgres>,
{
    let items = row.try_get::<Vec<Option<T>>, _>(index).ok()?;
    let rendered: Vec<String> = items
        .into_iter()
        .map(|item| item.map(render).unwrap_or_else(|| "NULL".to_string()))
        .collect();

    Some(format!("[{}]", rendered.join(", ")))
}

fn truncate_value(value: String) -> String {
    match value.char_indices().nth(MAX_VALUE_CHARS) {
        Some((cut, _)) => format!("{}...", &value[..cut]),
        None => value,
    }
}

/// `[{ col: value, ... }, ...]`, or `[]` when nothing came back. A note is
/// appended when rows beyond [`MAX_RESULT_ROWS`] were dropped.
pub fn render_records(records: &[Record], truncated: bool) -> String {
    let rendered: Vec<String> = records
        .iter()
        .map(|record| {
            let fields: Vec<String> = record
                .iter()
                .map(|(column, value)| format!("{}: {}", column, value))
                .collect();
            format!("{{ {} }}", fields.join(", "))
        })
        .collect();

    let mut text = format!("[{}]", rendered.join(", "));
    if truncated {
        text.push_str(&format!(
            "\n(only the first {} rows are shown; the query returned more)",
            MAX_RESULT_ROWS
        ));
    }
    text
}

/// A `CREATE TABLE` sketch followed by an optional block of sample rows.
pub fn render_table(table_name: &str, columns: &[ColumnInfo], sample: Option<&[Record]>) -> String {
    let column_lines: Vec<String> = columns
        .iter()
        .map(|column| {
            let not_null = if column.nullable { "" } else { " NOT NULL" };
            let labels = if column.enum_labels.is_empty() {
                String::new()
            } else {
                let quoted: Vec<String> = column
                    .enum_labels
                    .iter()
                    .map(|label| format!("'{}'", label))
                    .collect();
                format!(" /* one of {} */", quoted.join(", "))
            };
            format!("\t{} {}{}{}", column.name, column.data_type, not_null, labels)
        })
        .collect();

    let mut info = format!("CREATE TABLE {} (\n{}\n)", table_name, column_lines.join(",\n"));

    if let Some(rows) = sample {
        let header: Vec<&str> = columns.iter().map(|c| c.name.as_str()).collect();
        info.push_str(&format!(
            "\n\n/*\n{} rows from {} table:\n{}",
            rows.len(),
            table_name,
            header.join("\t")
        ));
        for row in rows {
            let values: Vec<&str> = row.iter().map(|(_, value)| value.as_str()).collect();
            info.push('\n');
            info.push_str(&values.join("\t"));
        }
        info.push_str("\n*/");
    }

    info
}

fn quote_ident(ident: &str) -> String {
    format!("\"{}\"", ident.replace('"', "\"\""))
}
