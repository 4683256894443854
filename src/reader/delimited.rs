//! Delimited text source (CSV files and in-memory text)

use super::RowSource;
use crate::error::{CompareError, Result};
use crate::value::{CellValue, ColumnType, Header, Row};
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::Arc;

/// Where delimited text comes from
#[derive(Debug, Clone)]
pub enum DelimitedInput {
    File(PathBuf),
    Text(String),
}

/// Reads delimited records; the first record is the header and every
/// column is typed as a string.
pub struct DelimitedSource {
    input: DelimitedInput,
    delimiter: u8,
    reader: Option<csv::Reader<Box<dyn Read>>>,
    record: csv::StringRecord,
}

impl DelimitedSource {
    pub fn new(input: DelimitedInput, delimiter: u8) -> Self {
        Self {
            input,
            delimiter,
            reader: None,
            record: csv::StringRecord::new(),
        }
    }

    pub fn from_file(path: impl Into<PathBuf>, delimiter: u8) -> Self {
        Self::new(DelimitedInput::File(path.into()), delimiter)
    }

    pub fn from_text(text: impl Into<String>, delimiter: u8) -> Self {
        Self::new(DelimitedInput::Text(text.into()), delimiter)
    }

    fn open_input(&self) -> Result<Box<dyn Read>> {
        match &self.input {
            DelimitedInput::File(path) => {
                let file = File::open(path).map_err(|e| {
                    CompareError::source_failure(
                        format!("opening file '{}'", path.display()),
                        e.to_string(),
                    )
                })?;
                Ok(Box::new(BufReader::new(file)))
            }
            DelimitedInput::Text(text) => Ok(Box::new(Cursor::new(text.clone().into_bytes()))),
        }
    }
}

impl RowSource for DelimitedSource {
    fn open(&mut self) -> Result<Header> {
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(self.delimiter)
            .has_headers(true)
            .flexible(true)
            .from_reader(self.open_input()?);

        let names = reader
            .headers()
            .map_err(|e| CompareError::source_failure("reading header", e.to_string()))?
            .clone();
        let header = Header::try_from_columns(names.iter().map(|n| (n, ColumnType::String)))?;
        self.reader = Some(reader);
        Ok(header)
    }

    fn advance(&mut self) -> Result<bool> {
        let reader = self
            .reader
            .as_mut()
            .ok_or_else(|| CompareError::source_failure("reading record", "source is not open"))?;
        reader
            .read_record(&mut self.record)
            .map_err(|e| CompareError::source_failure("reading record", e.to_string()))
    }

    fn read_row(&mut self, header: &Arc<Header>) -> Result<Row> {
        let values = self
            .record
            .iter()
            .take(header.len())
            .map(|field| Some(CellValue::String(field.to_string())))
            .collect();
        Ok(Row::new(header.clone(), values))
    }

    fn close(&mut self) -> Result<()> {
        self.reader = None;
        Ok(())
    }

    fn describe(&self) -> String {
        match &self.input {
            DelimitedInput::File(path) => format!("file '{}'", path.display()),
            DelimitedInput::Text(text) => format!("text ({} bytes)", text.len()),
        }
    }
}
