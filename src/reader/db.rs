//! DuckDB query source

use super::RowSource;
use crate::error::{CompareError, Result};
use crate::value::{CellValue, ColumnType, Header, Row};
use chrono::{DateTime, Duration, NaiveDate, NaiveTime};
use duckdb::types::{TimeUnit, Value};
use duckdb::Connection;
use rust_decimal::Decimal;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Instant;

/// Map a SQL type name, as reported by `DESCRIBE`, to a column type
pub fn column_type_for_sql(type_name: &str) -> ColumnType {
    let upper = type_name.trim().to_uppercase();
    let base = upper.split('(').next().unwrap_or("").trim();
    match base {
        "INTEGER" | "INT" | "INT4" | "SIGNED" => ColumnType::Integer,
        "VARCHAR" | "CHAR" | "BPCHAR" | "TEXT" | "STRING" | "NCHAR" | "NVARCHAR"
        | "LONGVARCHAR" => ColumnType::String,
        "BOOLEAN" | "BOOL" | "LOGICAL" => ColumnType::Boolean,
        "REAL" | "FLOAT" | "FLOAT4" => ColumnType::Float,
        "DOUBLE" | "FLOAT8" | "DOUBLE PRECISION" => ColumnType::Double,
        "TINYINT" | "INT1" => ColumnType::Byte,
        "SMALLINT" | "INT2" | "SHORT" => ColumnType::Short,
        "BIGINT" | "INT8" | "LONG" => ColumnType::Long,
        "DATE" => ColumnType::LocalDate,
        "TIME" => ColumnType::LocalTime,
        "TIMESTAMP" | "DATETIME" => ColumnType::LocalDateTime,
        "DECIMAL" | "NUMERIC" => ColumnType::BigDecimal,
        _ => ColumnType::Object,
    }
}

/// Query executed against a DuckDB connection
#[derive(Debug, Clone)]
pub struct DbQuery {
    /// Statements run before the query (ATTACH, USE, CREATE ...)
    pub setup: Vec<String>,
    pub sql: String,
}

impl DbQuery {
    pub fn new(sql: impl Into<String>) -> Self {
        Self {
            setup: Vec::new(),
            sql: sql.into(),
        }
    }

    pub fn with_setup(mut self, statement: impl Into<String>) -> Self {
        self.setup.push(statement.into());
        self
    }

    fn select_sql(&self) -> &str {
        self.sql.trim().trim_end_matches(';').trim_end()
    }
}

/// Temporary table holding the result of the query being read
const RESULT_TABLE: &str = "tabcompare_result";

/// Rows pulled from the staged result per round trip
pub const DEFAULT_CHUNK_SIZE: usize = 1024;

/// Reads the result set of one query.
///
/// The query is executed on first use into a temporary table on the
/// source's own connection. Rows are then fetched in chunks, so at most one
/// chunk is held in memory here.
pub struct DbSource {
    connection: Option<Connection>,
    query: DbQuery,
    description: String,
    columns: Vec<String>,
    chunk_size: usize,
    staged: bool,
    fetched: usize,
    drained: bool,
    buffered: VecDeque<Vec<Value>>,
    current: Option<Vec<Value>>,
}

impl DbSource {
    pub fn new(connection: Connection, query: DbQuery, description: impl Into<String>) -> Self {
        Self {
            connection: Some(connection),
            query,
            description: description.into(),
            columns: Vec::new(),
            chunk_size: DEFAULT_CHUNK_SIZE,
            staged: false,
            fetched: 0,
            drained: false,
            buffered: VecDeque::new(),
            current: None,
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size.max(1);
        self
    }

    fn connection(&self) -> Result<&Connection> {
        self.connection
            .as_ref()
            .ok_or_else(|| CompareError::source_failure("executing query", "connection is closed"))
    }

    fn describe_columns(&self) -> Result<Vec<(String, String)>> {
        let sql = format!("DESCRIBE {}", self.query.select_sql());
        let mut stmt = self.connection()?.prepare(&sql).map_err(|e| {
            CompareError::source_failure(
                "reading header from query result",
                format!(
                    "No data in DB result set. Probably an update query has been used or there is no result at all: {}",
                    e
                ),
            )
        })?;
        let rows = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
            .map_err(|e| CompareError::source_failure("reading header from query result", e.to_string()))?;

        let mut columns = Vec::new();
        for row in rows {
            columns.push(row.map_err(|e| {
                CompareError::source_failure("reading header from query result", e.to_string())
            })?);
        }
        Ok(columns)
    }

    /// Materialize the query into a temporary table that later chunks are
    /// read from
    fn stage(&mut self) -> Result<()> {
        let started = Instant::now();
        let sql = format!(
            "CREATE OR REPLACE TEMP TABLE {} AS {}",
            RESULT_TABLE,
            self.query.select_sql()
        );
        self.connection()?
            .execute_batch(&sql)
            .map_err(|e| CompareError::source_failure("executing SQL query", e.to_string()))?;
        self.staged = true;

        log::debug!(
            "Query {} has been executed in {:.3} sec.",
            self.description,
            started.elapsed().as_secs_f64()
        );
        Ok(())
    }

    /// Pull the next chunk of staged rows into the buffer
    fn fetch_chunk(&mut self) -> Result<()> {
        let column_count = self.columns.len();
        let sql = format!(
            "SELECT * FROM {} LIMIT {} OFFSET {}",
            RESULT_TABLE, self.chunk_size, self.fetched
        );
        let chunk = {
            let mut stmt = self.connection()?.prepare(&sql).map_err(|e| {
                CompareError::source_failure("getting next query result row", e.to_string())
            })?;
            let rows = stmt
                .query_map([], |row| {
                    (0..column_count)
                        .map(|i| row.get::<_, Value>(i))
                        .collect::<std::result::Result<Vec<_>, _>>()
                })
                .map_err(|e| {
                    CompareError::source_failure("getting next query result row", e.to_string())
                })?;

            let mut chunk = VecDeque::with_capacity(self.chunk_size);
            for row in rows {
                chunk.push_back(row.map_err(|e| {
                    CompareError::source_failure("getting next query result row", e.to_string())
                })?);
            }
            chunk
        };

        self.fetched += chunk.len();
        self.drained = chunk.len() < self.chunk_size;
        self.buffered = chunk;
        Ok(())
    }
}

impl RowSource for DbSource {
    fn open(&mut self) -> Result<Header> {
        // Setup statements may create the objects the query describes.
        for statement in &self.query.setup {
            self.connection()?.execute_batch(statement).map_err(|e| {
                CompareError::source_failure("executing setup statement", e.to_string())
            })?;
        }
        let described = self.describe_columns()?;
        self.query.setup.clear();

        let header = Header::try_from_columns(
            described
                .iter()
                .map(|(name, type_name)| (name.clone(), column_type_for_sql(type_name))),
        )?;
        self.columns = described.into_iter().map(|(name, _)| name).collect();
        self.stage()?;
        Ok(header)
    }

    fn advance(&mut self) -> Result<bool> {
        if self.buffered.is_empty() && !self.drained {
            self.fetch_chunk()?;
        }
        self.current = self.buffered.pop_front();
        Ok(self.current.is_some())
    }

    fn read_row(&mut self, header: &Arc<Header>) -> Result<Row> {
        let record = self.current.take().ok_or_else(|| {
            CompareError::source_failure("reading query result row", "no current row")
        })?;

        let mut values = vec![None; header.len()];
        for (name, value) in self.columns.iter().zip(record) {
            let Some(index) = header.index_of(name) else {
                continue;
            };
            let column_type = header.column_type(name).unwrap_or(ColumnType::Object);
            values[index] = convert_value(value, column_type, name);
        }
        Ok(Row::new(header.clone(), values))
    }

    fn close(&mut self) -> Result<()> {
        self.buffered.clear();
        self.current = None;
        self.drained = true;
        if self.staged {
            self.staged = false;
            if let Some(connection) = &self.connection {
                connection
                    .execute_batch(&format!("DROP TABLE IF EXISTS {}", RESULT_TABLE))
                    .map_err(|e| {
                        CompareError::source_failure("dropping staged query result", e.to_string())
                    })?;
            }
        }
        if let Some(connection) = self.connection.take() {
            connection.close().map_err(|(_, e)| {
                CompareError::source_failure("closing database connection", e.to_string())
            })?;
        }
        Ok(())
    }

    fn describe(&self) -> String {
        format!("query {}", self.description)
    }
}

/// Convert a DuckDB value into the declared column type.
///
/// Values that do not fit the declared type are kept as their string
/// rendering; this is logged but never fatal.
pub fn convert_value(value: Value, column_type: ColumnType, column: &str) -> Option<CellValue> {
    if matches!(value, Value::Null) {
        return None;
    }

    let converted = match (column_type, &value) {
        (ColumnType::Integer, Value::Int(v)) => Some(CellValue::Integer(*v)),
        (ColumnType::Integer, Value::SmallInt(v)) => Some(CellValue::Integer(i32::from(*v))),
        (ColumnType::Integer, Value::TinyInt(v)) => Some(CellValue::Integer(i32::from(*v))),
        (ColumnType::Integer, Value::BigInt(v)) => i32::try_from(*v).ok().map(CellValue::Integer),
        (ColumnType::Boolean, Value::Boolean(v)) => Some(CellValue::Boolean(*v)),
        (ColumnType::Float, Value::Float(v)) => Some(CellValue::Float(*v)),
        (ColumnType::Float, Value::Double(v)) => Some(CellValue::Float(*v as f32)),
        (ColumnType::Double, Value::Double(v)) => Some(CellValue::Double(*v)),
        (ColumnType::Double, Value::Float(v)) => Some(CellValue::Double(f64::from(*v))),
        (ColumnType::Byte, Value::TinyInt(v)) => Some(CellValue::Byte(*v)),
        (ColumnType::Byte, Value::Int(v)) => i8::try_from(*v).ok().map(CellValue::Byte),
        (ColumnType::Short, Value::SmallInt(v)) => Some(CellValue::Short(*v)),
        (ColumnType::Short, Value::TinyInt(v)) => Some(CellValue::Short(i16::from(*v))),
        (ColumnType::Short, Value::Int(v)) => i16::try_from(*v).ok().map(CellValue::Short),
        (ColumnType::Long, Value::BigInt(v)) => Some(CellValue::Long(*v)),
        (ColumnType::Long, Value::Int(v)) => Some(CellValue::Long(i64::from(*v))),
        (ColumnType::Long, Value::SmallInt(v)) => Some(CellValue::Long(i64::from(*v))),
        (ColumnType::Long, Value::TinyInt(v)) => Some(CellValue::Long(i64::from(*v))),
        (ColumnType::Long, Value::UInt(v)) => Some(CellValue::Long(i64::from(*v))),
        (ColumnType::LocalDate, Value::Date32(days)) => date_from_days(*days).map(CellValue::Date),
        (ColumnType::LocalTime, Value::Time64(unit, v)) => {
            time_from_micros(to_micros(unit, *v)).map(CellValue::Time)
        }
        (ColumnType::LocalDateTime, Value::Timestamp(unit, v)) => {
            DateTime::from_timestamp_micros(to_micros(unit, *v))
                .map(|dt| CellValue::DateTime(dt.naive_utc()))
        }
        (ColumnType::BigDecimal, Value::Decimal(v)) => Some(CellValue::Decimal(*v)),
        (ColumnType::BigDecimal, Value::Int(v)) => Some(CellValue::Decimal(Decimal::from(*v))),
        (ColumnType::BigDecimal, Value::BigInt(v)) => Some(CellValue::Decimal(Decimal::from(*v))),
        (ColumnType::BigDecimal, Value::HugeInt(v)) => Decimal::try_from_i128_with_scale(*v, 0)
            .ok()
            .map(CellValue::Decimal),
        (ColumnType::String, Value::Text(v)) => Some(CellValue::String(v.clone())),
        (ColumnType::Object, other) => Some(CellValue::Object(render_value(other))),
        _ => None,
    };

    Some(converted.unwrap_or_else(|| {
        log::warn!(
            "Value {:?} of column '{}' is not convertible to {}, using its string form",
            value,
            column,
            column_type
        );
        CellValue::String(render_value(&value))
    }))
}

/// Generic string rendering of a DuckDB value
pub fn render_value(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::Boolean(v) => v.to_string(),
        Value::TinyInt(v) => v.to_string(),
        Value::SmallInt(v) => v.to_string(),
        Value::Int(v) => v.to_string(),
        Value::BigInt(v) => v.to_string(),
        Value::HugeInt(v) => v.to_string(),
        Value::UTinyInt(v) => v.to_string(),
        Value::USmallInt(v) => v.to_string(),
        Value::UInt(v) => v.to_string(),
        Value::UBigInt(v) => v.to_string(),
        Value::Float(v) => v.to_string(),
        Value::Double(v) => v.to_string(),
        Value::Decimal(v) => v.to_string(),
        Value::Text(v) => v.clone(),
        Value::Blob(v) => format!("<blob:{} bytes>", v.len()),
        Value::Date32(days) => date_from_days(*days)
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| days.to_string()),
        Value::Time64(unit, v) => time_from_micros(to_micros(unit, *v))
            .map(|t| t.format("%H:%M:%S%.f").to_string())
            .unwrap_or_else(|| v.to_string()),
        Value::Timestamp(unit, v) => DateTime::from_timestamp_micros(to_micros(unit, *v))
            .map(|dt| dt.naive_utc().format("%Y-%m-%d %H:%M:%S%.f").to_string())
            .unwrap_or_else(|| v.to_string()),
        other => format!("{:?}", other),
    }
}

fn to_micros(unit: &TimeUnit, value: i64) -> i64 {
    match unit {
        TimeUnit::Second => value.saturating_mul(1_000_000),
        TimeUnit::Millisecond => value.saturating_mul(1_000),
        TimeUnit::Microsecond => value,
        TimeUnit::Nanosecond => value / 1_000,
    }
}

fn date_from_days(days: i32) -> Option<NaiveDate> {
    NaiveDate::from_ymd_opt(1970, 1, 1)?.checked_add_signed(Duration::days(i64::from(days)))
}

fn time_from_micros(micros: i64) -> Option<NaiveTime> {
    let secs = u32::try_from(micros.div_euclid(1_000_000)).ok()?;
    let nanos = u32::try_from(micros.rem_euclid(1_000_000) * 1_000).ok()?;
    NaiveTime::from_num_seconds_from_midnight_opt(secs, nanos)
}
