//! Typed value model: column types, headers and rows

use crate::error::{CompareError, Result};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use indexmap::IndexMap;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// Declared type of a column, fixed for the lifetime of a dataset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ColumnType {
    Integer,
    Boolean,
    Float,
    Double,
    Byte,
    Short,
    Long,
    LocalDate,
    LocalTime,
    LocalDateTime,
    BigDecimal,
    String,
    Object,
}

impl fmt::Display for ColumnType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Integer => "INTEGER",
            Self::Boolean => "BOOLEAN",
            Self::Float => "FLOAT",
            Self::Double => "DOUBLE",
            Self::Byte => "BYTE",
            Self::Short => "SHORT",
            Self::Long => "LONG",
            Self::LocalDate => "LOCALDATE",
            Self::LocalTime => "LOCALTIME",
            Self::LocalDateTime => "LOCALDATETIME",
            Self::BigDecimal => "BIGDECIMAL",
            Self::String => "STRING",
            Self::Object => "OBJECT",
        };
        f.write_str(name)
    }
}

/// A single typed cell value
#[derive(Debug, Clone, PartialEq)]
pub enum CellValue {
    Integer(i32),
    Boolean(bool),
    Float(f32),
    Double(f64),
    Byte(i8),
    Short(i16),
    Long(i64),
    Date(NaiveDate),
    Time(NaiveTime),
    DateTime(NaiveDateTime),
    Decimal(Decimal),
    String(String),
    /// Opaque value kept as its generic string rendering
    Object(String),
}

impl CellValue {
    pub fn column_type(&self) -> ColumnType {
        match self {
            Self::Integer(_) => ColumnType::Integer,
            Self::Boolean(_) => ColumnType::Boolean,
            Self::Float(_) => ColumnType::Float,
            Self::Double(_) => ColumnType::Double,
            Self::Byte(_) => ColumnType::Byte,
            Self::Short(_) => ColumnType::Short,
            Self::Long(_) => ColumnType::Long,
            Self::Date(_) => ColumnType::LocalDate,
            Self::Time(_) => ColumnType::LocalTime,
            Self::DateTime(_) => ColumnType::LocalDateTime,
            Self::Decimal(_) => ColumnType::BigDecimal,
            Self::String(_) => ColumnType::String,
            Self::Object(_) => ColumnType::Object,
        }
    }
}

impl fmt::Display for CellValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Integer(v) => write!(f, "{}", v),
            Self::Boolean(v) => write!(f, "{}", v),
            Self::Float(v) => write!(f, "{}", v),
            Self::Double(v) => write!(f, "{}", v),
            Self::Byte(v) => write!(f, "{}", v),
            Self::Short(v) => write!(f, "{}", v),
            Self::Long(v) => write!(f, "{}", v),
            Self::Date(v) => write!(f, "{}", v.format("%Y-%m-%d")),
            Self::Time(v) => write!(f, "{}", v.format("%H:%M:%S%.f")),
            Self::DateTime(v) => write!(f, "{}", v.format("%Y-%m-%d %H:%M:%S%.f")),
            Self::Decimal(v) => write!(f, "{}", v),
            Self::String(v) | Self::Object(v) => f.write_str(v),
        }
    }
}

/// Ordered set of (column name, column type) pairs with unique names
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct Header {
    columns: IndexMap<String, ColumnType>,
}

impl Header {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a header from ordered pairs. A repeated name keeps its first
    /// position and type.
    pub fn from_columns<I, S>(columns: I) -> Self
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let mut header = Self::new();
        for (name, column_type) in columns {
            header.push(name, column_type);
        }
        header
    }

    /// Build a header from a source's column list, rejecting repeated names.
    ///
    /// Sources fill rows by position, so a dropped duplicate would shift
    /// every later value into the wrong column.
    pub fn try_from_columns<I, S>(columns: I) -> Result<Self>
    where
        I: IntoIterator<Item = (S, ColumnType)>,
        S: Into<String>,
    {
        let mut header = Self::new();
        for (name, column_type) in columns {
            let name = name.into();
            if header.contains(&name) {
                return Err(CompareError::column_failure(
                    "reading header",
                    name,
                    "column name occurs more than once",
                ));
            }
            header.push(name, column_type);
        }
        Ok(header)
    }

    /// Header where every column is a string, as delimited sources produce
    pub fn untyped<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::from_columns(names.into_iter().map(|n| (n, ColumnType::String)))
    }

    /// Append a column, returning false when the name is already present
    pub fn push(&mut self, name: impl Into<String>, column_type: ColumnType) -> bool {
        let name = name.into();
        if self.columns.contains_key(&name) {
            log::warn!("Duplicate column name '{}' in header is ignored", name);
            return false;
        }
        self.columns.insert(name, column_type);
        true
    }

    pub fn len(&self) -> usize {
        self.columns.len()
    }

    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.columns.contains_key(name)
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.columns.get_index_of(name)
    }

    pub fn column_type(&self, name: &str) -> Option<ColumnType> {
        self.columns.get(name).copied()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.columns.keys().map(String::as_str)
    }

    pub fn columns(&self) -> impl Iterator<Item = (&str, ColumnType)> {
        self.columns.iter().map(|(n, t)| (n.as_str(), *t))
    }
}

/// A row of typed values bound to the header it was read with.
///
/// Every header column has a slot; `None` marks an absent (null) value.
#[derive(Debug, Clone, PartialEq)]
pub struct Row {
    header: Arc<Header>,
    values: Vec<Option<CellValue>>,
}

impl Row {
    /// Create a row, padding missing trailing values as absent
    pub fn new(header: Arc<Header>, mut values: Vec<Option<CellValue>>) -> Self {
        values.resize(header.len(), None);
        Self { header, values }
    }

    /// Convenience constructor for string-only rows
    pub fn from_strings<S: AsRef<str>>(header: Arc<Header>, values: &[S]) -> Self {
        let values = values
            .iter()
            .map(|v| Some(CellValue::String(v.as_ref().to_string())))
            .collect();
        Self::new(header, values)
    }

    pub fn header(&self) -> &Arc<Header> {
        &self.header
    }

    pub fn has_column(&self, name: &str) -> bool {
        self.header.contains(name)
    }

    pub fn get(&self, name: &str) -> Option<&CellValue> {
        self.header
            .index_of(name)
            .and_then(|i| self.values.get(i))
            .and_then(Option::as_ref)
    }

    /// String rendering of a column value, `None` when absent or null
    pub fn text(&self, name: &str) -> Option<String> {
        self.get(name).map(CellValue::to_string)
    }

    /// Column names paired with rendered values, in header order
    pub fn rendered(&self) -> Vec<(String, Option<String>)> {
        self.header
            .names()
            .zip(self.values.iter())
            .map(|(name, value)| (name.to_string(), value.as_ref().map(CellValue::to_string)))
            .collect()
    }
}
