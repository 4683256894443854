//! Query file parsing
//!
//! A query file holds, in order: optional comment lines carrying an
//! `ATTACH ... (TYPE ...)` connection statement, optional setup statements
//! (USE, CREATE, INSERT ...), and the query itself starting at the first
//! line that begins with SELECT or WITH and running to the end of the file.

use crate::error::{CompareError, Result};
use crate::reader::db::DbQuery;
use std::env;
use std::fs;
use std::path::Path;

/// Parse a query file from disk
pub fn parse_sql_file(file_path: &Path) -> Result<DbQuery> {
    let content = fs::read_to_string(file_path).map_err(|e| {
        CompareError::source_failure(
            format!("reading query file '{}'", file_path.display()),
            e.to_string(),
        )
    })?;
    parse_sql(&content, &file_path.display().to_string())
}

/// Split query text into setup statements and the query.
///
/// `origin` names the text in error messages.
pub fn parse_sql(content: &str, origin: &str) -> Result<DbQuery> {
    let mut attach = Vec::new();
    let mut setup_lines = Vec::new();
    let mut query_lines = Vec::new();

    for line in content.lines() {
        let trimmed = line.trim();
        if !query_lines.is_empty() {
            query_lines.push(line);
            continue;
        }

        if let Some(comment) = comment_body(trimmed) {
            if is_attach_statement(comment) {
                attach.push(substitute_env_vars(comment)?);
            }
        } else if starts_query(trimmed) {
            query_lines.push(line);
        } else if !trimmed.is_empty() {
            setup_lines.push(line);
        }
    }

    if query_lines.is_empty() {
        return Err(CompareError::config(origin, "no SELECT or WITH query found"));
    }

    let mut query = DbQuery::new(query_lines.join("\n").trim());
    for statement in attach.into_iter().chain(split_statements(&setup_lines.join("\n"))) {
        query = query.with_setup(statement);
    }
    Ok(query)
}

fn comment_body(line: &str) -> Option<&str> {
    line.strip_prefix("--")
        .or_else(|| line.strip_prefix("//"))
        .map(str::trim)
}

fn is_attach_statement(comment: &str) -> bool {
    let upper = comment.to_uppercase();
    upper.starts_with("ATTACH") && upper.contains("TYPE")
}

fn starts_query(line: &str) -> bool {
    let upper = line.to_uppercase();
    upper.starts_with("SELECT") || upper.starts_with("WITH")
}

fn split_statements(setup: &str) -> Vec<String> {
    setup
        .split(';')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}

/// Replace `{VAR_NAME}` placeholders with environment variable values
pub fn substitute_env_vars(text: &str) -> Result<String> {
    let mut result = text.to_string();
    let mut start = 0;
    while let Some(open) = result[start..].find('{').map(|p| start + p) {
        let Some(close) = result[open..].find('}').map(|p| open + p) else {
            break;
        };
        let name = &result[open + 1..close];
        let value = env::var(name).map_err(|_| {
            CompareError::source_failure(
                "preparing connection statement",
                format!("Environment variable '{}' not found", name),
            )
        })?;
        result.replace_range(open..=close, &value);
        start = open + value.len();
    }
    Ok(result)
}
