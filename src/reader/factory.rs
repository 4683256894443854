//! Reader construction from a source format tag

use super::db::{DbQuery, DbSource};
use super::delimited::DelimitedSource;
use super::script::{ScriptCommand, ScriptSource};
use super::{RowSource, Side, TableDataReader};
use crate::config::SourceSettings;
use crate::error::{CompareError, Result};
use crate::sql;
use anyhow::Context;
use duckdb::Connection;
use std::fmt;
use std::path::{Path, PathBuf};

/// Kind of source a dataset is read from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    /// Inline SQL query
    Query,
    /// Path to a query file
    QueryFile,
    /// Path to a delimited text file
    CsvFile,
    /// Inline shell commands whose output is delimited text
    Script,
    /// Path to an executable whose output is delimited text
    ScriptFile,
}

impl SourceFormat {
    pub const ALL: [SourceFormat; 5] = [
        SourceFormat::Query,
        SourceFormat::QueryFile,
        SourceFormat::CsvFile,
        SourceFormat::Script,
        SourceFormat::ScriptFile,
    ];

    pub fn tag(&self) -> &'static str {
        match self {
            SourceFormat::Query => "Query",
            SourceFormat::QueryFile => "QueryFile",
            SourceFormat::CsvFile => "CsvFile",
            SourceFormat::Script => "Script",
            SourceFormat::ScriptFile => "ScriptFile",
        }
    }

    /// Parse a format tag read from `parameter`. Tags are case-sensitive.
    pub fn parse(tag: &str, parameter: &str) -> Result<Self> {
        Self::ALL
            .into_iter()
            .find(|f| f.tag() == tag.trim())
            .ok_or_else(|| CompareError::UnsupportedFormat {
                parameter: parameter.to_string(),
                format: tag.to_string(),
                acceptable: Self::ALL
                    .iter()
                    .map(|f| format!("'{}'", f.tag()))
                    .collect::<Vec<_>>()
                    .join(", "),
            })
    }

    /// True for formats read as delimited text
    pub fn is_delimited(&self) -> bool {
        matches!(
            self,
            SourceFormat::CsvFile | SourceFormat::Script | SourceFormat::ScriptFile
        )
    }
}

impl fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.tag())
    }
}

/// Supplies database connections for query sources
pub trait ConnectionProvider {
    fn connection(&self, side: Side, database: Option<&Path>) -> anyhow::Result<Connection>;
}

/// Opens the configured DuckDB database file, or an in-memory database
#[derive(Debug, Default, Clone, Copy)]
pub struct DuckDbConnections;

impl ConnectionProvider for DuckDbConnections {
    fn connection(&self, side: Side, database: Option<&Path>) -> anyhow::Result<Connection> {
        match database {
            Some(path) => Connection::open(path).with_context(|| {
                format!("Failed to open {} database '{}'", side, path.display())
            }),
            None => Connection::open_in_memory()
                .with_context(|| format!("Failed to open in-memory database for {} data", side)),
        }
    }
}

/// Build a reader for one side. Nothing is executed or read until the
/// reader is first used.
pub fn open_reader(
    settings: &SourceSettings,
    connections: &dyn ConnectionProvider,
) -> Result<TableDataReader> {
    let side = settings.side;
    let source = build_source(settings, connections).map_err(|e| e.at_side(side, None))?;
    log::debug!("Prepared {} reader for {}", side, source.describe());
    Ok(TableDataReader::new(side, source))
}

fn build_source(
    settings: &SourceSettings,
    connections: &dyn ConnectionProvider,
) -> Result<Box<dyn RowSource>> {
    let side = settings.side;
    let source: Box<dyn RowSource> = match settings.format {
        SourceFormat::Query | SourceFormat::QueryFile => {
            let query = match settings.format {
                SourceFormat::QueryFile => sql::parse_sql_file(Path::new(&settings.source))?,
                _ => DbQuery::new(settings.source.as_str()),
            };
            let connection = connections.connection(side, settings.database.as_deref())?;
            Box::new(DbSource::new(connection, query, format!("for {} data", side)))
        }
        SourceFormat::CsvFile => Box::new(DelimitedSource::from_file(
            PathBuf::from(&settings.source),
            settings.delimiter,
        )),
        SourceFormat::Script => Box::new(ScriptSource::new(
            side,
            ScriptCommand::Inline {
                commands: settings.source.clone(),
                shell: settings.shell.clone(),
                shell_option: settings.shell_option.clone(),
            },
            settings.delimiter,
        )),
        SourceFormat::ScriptFile => Box::new(ScriptSource::new(
            side,
            ScriptCommand::File {
                path: PathBuf::from(&settings.source),
                args: settings.script_params.clone(),
            },
            settings.delimiter,
        )),
    };
    Ok(source)
}
