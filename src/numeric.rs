//! Numeric tolerance specification and decimal handling

use crate::error::{CompareError, Result};
use indexmap::IndexMap;
use rust_decimal::{Decimal, RoundingStrategy};
use std::str::FromStr;

/// Parameter name of the raw `column:scale` list
pub const NUMERIC_COLUMNS: &str = "NumericColumns";

/// Largest scale the decimal engine can represent
pub const MAX_SCALE: u32 = 28;

/// Columns compared as decimals, each with the number of fractional
/// digits kept when rounding
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NumericColumns {
    scales: IndexMap<String, u32>,
}

impl NumericColumns {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse the raw `"column:scale,column2"` form. A missing scale means 0.
    pub fn parse(raw: &str) -> Result<Self> {
        let mut columns = Self::new();
        for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
            let (column, scale) = match entry.split_once(':') {
                Some((column, scale)) => (column.trim(), parse_scale(column.trim(), scale.trim())?),
                None => (entry, 0),
            };
            if column.is_empty() {
                return Err(CompareError::config(
                    NUMERIC_COLUMNS,
                    format!("entry '{}' has no column name", entry),
                ));
            }
            columns.insert(column, scale);
        }
        Ok(columns)
    }

    pub fn insert(&mut self, column: impl Into<String>, scale: u32) {
        self.scales.insert(column.into(), scale);
    }

    pub fn with(mut self, column: impl Into<String>, scale: u32) -> Self {
        self.insert(column, scale);
        self
    }

    pub fn scale(&self, column: &str) -> Option<u32> {
        self.scales.get(column).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.scales.is_empty()
    }

    pub fn len(&self) -> usize {
        self.scales.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, u32)> {
        self.scales.iter().map(|(c, s)| (c.as_str(), *s))
    }
}

fn parse_scale(column: &str, raw: &str) -> Result<u32> {
    let scale: u32 = raw.parse().map_err(|_| {
        CompareError::config(
            NUMERIC_COLUMNS,
            format!(
                "Numeric column '{}' with specified scale '{}' couldn't be obtained: scale must be a non-negative integer",
                column, raw
            ),
        )
    })?;
    if scale > MAX_SCALE {
        return Err(CompareError::config(
            NUMERIC_COLUMNS,
            format!(
                "Numeric column '{}' has scale {} which exceeds the maximum of {}",
                column, scale, MAX_SCALE
            ),
        ));
    }
    Ok(scale)
}

/// Parse a textual number, tolerating surrounding whitespace and
/// scientific notation
pub fn parse_decimal(raw: &str) -> Option<Decimal> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    Decimal::from_str(trimmed)
        .or_else(|_| Decimal::from_scientific(trimmed))
        .ok()
}

/// Round half away from zero to `scale` fractional digits, normalized so
/// equal values render identically
pub fn round_to_scale(value: Decimal, scale: u32) -> Decimal {
    value
        .round_dp_with_strategy(scale, RoundingStrategy::MidpointAwayFromZero)
        .normalize()
}

/// Smallest difference that counts at `scale`, i.e. `10^-scale`
pub fn tolerance(scale: u32) -> Decimal {
    Decimal::new(1, scale.min(MAX_SCALE))
}

/// True when the values differ by less than one unit in the last kept
/// digit. Tightening the scale never widens the tolerance.
pub fn equal_at_scale(a: Decimal, b: Decimal, scale: u32) -> bool {
    a.checked_sub(b)
        .is_some_and(|diff| diff.abs() < tolerance(scale))
}
