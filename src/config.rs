//! Comparison parameters
//!
//! Raw parameters are an ordered string map, built from command-line flags
//! or loaded from a JSON file. They are validated here, before any reader is
//! opened.

use crate::compare::CompareOptions;
use crate::error::{CompareError, Result};
use crate::numeric::{NumericColumns, NUMERIC_COLUMNS};
use crate::reader::{Side, SourceFormat};
use indexmap::IndexMap;
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

pub const EXPECTED_FORMAT: &str = "ExpectedFormat";
pub const EXPECTED_SOURCE: &str = "ExpectedSource";
pub const ACTUAL_FORMAT: &str = "ActualFormat";
pub const ACTUAL_SOURCE: &str = "ActualSource";
pub const KEY_COLUMNS: &str = "KeyColumns";
pub const CHECK_DUPLICATES: &str = "CheckDuplicates";

/// A parameter that can be set for both sides at once or for each side.
///
/// The common name wins when present, then the side-specific one.
#[derive(Debug, Clone, Copy)]
pub struct SideParameter {
    pub common: &'static str,
    pub expected: &'static str,
    pub actual: &'static str,
}

impl SideParameter {
    /// Name of the parameter that applies to `side` given what is set
    pub fn resolve_name(&self, params: &RawParams, side: Side) -> &'static str {
        if params.contains_key(self.common) {
            self.common
        } else {
            match side {
                Side::Expected => self.expected,
                Side::Actual => self.actual,
            }
        }
    }
}

pub const CSV_DELIMITER: SideParameter = SideParameter {
    common: "CsvDelimiterCommon",
    expected: "CsvDelimiterExpected",
    actual: "CsvDelimiterActual",
};
pub const SCRIPT_SHELL_NAME: SideParameter = SideParameter {
    common: "ScriptShellNameCommon",
    expected: "ScriptShellNameExpected",
    actual: "ScriptShellNameActual",
};
pub const SCRIPT_SHELL_OPTION: SideParameter = SideParameter {
    common: "ScriptShellOptionCommon",
    expected: "ScriptShellOptionExpected",
    actual: "ScriptShellOptionActual",
};
pub const SCRIPT_FILE_PARAMS: SideParameter = SideParameter {
    common: "ScriptFileParamsCommon",
    expected: "ScriptFileParamsExpected",
    actual: "ScriptFileParamsActual",
};
pub const DATABASE: SideParameter = SideParameter {
    common: "DatabaseCommon",
    expected: "ExpectedDatabase",
    actual: "ActualDatabase",
};

pub const DEFAULT_DELIMITER: &str = ",";
pub const DEFAULT_SHELL: &str = "bash";
pub const DEFAULT_SHELL_OPTION: &str = "-c";

pub type RawParams = IndexMap<String, String>;

/// Load parameters from a JSON file holding one object.
///
/// Numbers and booleans are taken in their textual form; nulls are skipped.
pub fn load_params_file(path: &Path) -> Result<RawParams> {
    let content = fs::read_to_string(path).map_err(|e| {
        CompareError::source_failure(
            format!("reading parameters file '{}'", path.display()),
            e.to_string(),
        )
    })?;
    let value: Value = serde_json::from_str(&content)?;
    let Value::Object(entries) = value else {
        return Err(CompareError::source_failure(
            format!("reading parameters file '{}'", path.display()),
            "top-level value must be an object",
        ));
    };

    let mut params = RawParams::new();
    for (name, value) in entries {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            Value::Null => continue,
            other => {
                return Err(CompareError::config(
                    name,
                    format!("expected a string, number or boolean, got {}", other),
                ))
            }
        };
        params.insert(name, text);
    }
    Ok(params)
}

/// Everything needed to build the reader for one side
#[derive(Debug, Clone, PartialEq)]
pub struct SourceSettings {
    pub side: Side,
    pub format: SourceFormat,
    pub source: String,
    pub delimiter: u8,
    pub shell: String,
    pub shell_option: String,
    pub script_params: String,
    pub database: Option<PathBuf>,
}

impl SourceSettings {
    /// Settings with every optional value at its default
    pub fn new(side: Side, format: SourceFormat, source: impl Into<String>) -> Self {
        Self {
            side,
            format,
            source: source.into(),
            delimiter: b',',
            shell: DEFAULT_SHELL.to_string(),
            shell_option: DEFAULT_SHELL_OPTION.to_string(),
            script_params: String::new(),
            database: None,
        }
    }

    /// Resolve the settings of one side from raw parameters
    pub fn from_params(params: &RawParams, side: Side) -> Result<Self> {
        let (format_param, source_param) = match side {
            Side::Expected => (EXPECTED_FORMAT, EXPECTED_SOURCE),
            Side::Actual => (ACTUAL_FORMAT, ACTUAL_SOURCE),
        };
        let format = SourceFormat::parse(required(params, format_param)?, format_param)?;
        let mut settings = Self::new(side, format, required(params, source_param)?);

        if format.is_delimited() {
            settings.delimiter = delimiter(params, side)?;
        }
        settings.shell = side_value(params, SCRIPT_SHELL_NAME, side, DEFAULT_SHELL);
        settings.shell_option = side_value(params, SCRIPT_SHELL_OPTION, side, DEFAULT_SHELL_OPTION);
        settings.script_params = side_value(params, SCRIPT_FILE_PARAMS, side, "");
        let database = side_value(params, DATABASE, side, "");
        if !database.trim().is_empty() {
            settings.database = Some(PathBuf::from(database.trim()));
        }
        Ok(settings)
    }
}

/// Validated settings of one comparison run
#[derive(Debug, Clone)]
pub struct CompareSettings {
    pub expected: SourceSettings,
    pub actual: SourceSettings,
    pub options: CompareOptions,
}

impl CompareSettings {
    pub fn from_params(params: &RawParams) -> Result<Self> {
        let options = CompareOptions {
            key_columns: parse_key_columns(params.get(KEY_COLUMNS).map(String::as_str).unwrap_or("")),
            numeric_columns: NumericColumns::parse(
                params.get(NUMERIC_COLUMNS).map(String::as_str).unwrap_or(""),
            )?,
            check_duplicates: match params.get(CHECK_DUPLICATES) {
                Some(raw) => parse_bool(raw, CHECK_DUPLICATES)?,
                None => false,
            },
        };
        Ok(Self {
            expected: SourceSettings::from_params(params, Side::Expected)?,
            actual: SourceSettings::from_params(params, Side::Actual)?,
            options,
        })
    }

    pub fn side(&self, side: Side) -> &SourceSettings {
        match side {
            Side::Expected => &self.expected,
            Side::Actual => &self.actual,
        }
    }
}

fn required<'a>(params: &'a RawParams, name: &str) -> Result<&'a str> {
    match params.get(name).map(|v| v.trim()) {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(CompareError::config(name, "parameter is required")),
    }
}

fn side_value(params: &RawParams, parameter: SideParameter, side: Side, default: &str) -> String {
    params
        .get(parameter.resolve_name(params, side))
        .cloned()
        .unwrap_or_else(|| default.to_string())
}

/// Delimiter for one side: a single character, `\t` meaning tab
pub fn delimiter(params: &RawParams, side: Side) -> Result<u8> {
    let name = CSV_DELIMITER.resolve_name(params, side);
    let raw = params
        .get(name)
        .map(String::as_str)
        .unwrap_or(DEFAULT_DELIMITER);
    parse_delimiter(raw, name)
}

pub fn parse_delimiter(raw: &str, parameter: &str) -> Result<u8> {
    let value = raw.replace("\\t", "\t");
    let mut chars = value.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) if c.is_ascii() => Ok(c as u8),
        (Some(_), None) => Err(CompareError::config(
            parameter,
            "CSV delimiter must be an ASCII character",
        )),
        _ => Err(CompareError::config(
            parameter,
            "CSV delimiter has invalid format: it should be 1 character in length",
        )),
    }
}

/// Split a comma-separated column list, keeping first occurrences in order
pub fn parse_key_columns(raw: &str) -> Vec<String> {
    let mut columns: Vec<String> = Vec::new();
    for column in raw.split(',').map(str::trim).filter(|c| !c.is_empty()) {
        if !columns.iter().any(|c| c == column) {
            columns.push(column.to_string());
        }
    }
    columns
}

pub fn parse_bool(raw: &str, parameter: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "yes" | "y" | "1" => Ok(true),
        "false" | "no" | "n" | "0" | "" => Ok(false),
        other => Err(CompareError::config(
            parameter,
            format!("'{}' is not a boolean value", other),
        )),
    }
}
