//! Regex-based parser for the restricted SELECT form
//!
//! Keywords, table names and field names are case-insensitive. The quoted
//! value is taken literally and may contain spaces but not `'`.

use std::sync::OnceLock;

use regex::Regex;

use super::ast::{Filter, Projection, Query, Table};
use super::errors::{QueryError, QueryResult};

const SELECT_PATTERN: &str = r"(?i)^\s*SELECT\s+(\*|[a-z_]+)\s+FROM\s+([a-z_]+)\s+WHERE\s+([a-z_]+)\s*=\s*'([^']*)'\s*;?\s*$";

static SELECT_REGEX: OnceLock<Result<Regex, regex::Error>> = OnceLock::new();

/// Compiled once per process.
fn select_regex() -> QueryResult<&'static Regex> {
    SELECT_REGEX
        .get_or_init(|| Regex::new(SELECT_PATTERN))
        .as_ref()
        .map_err(|e| QueryError::Pattern(e.clone()))
}

impl Query {
    /// Parses and validates a query against the known tables.
    pub fn parse(input: &str) -> QueryResult<Self> {
        let caps = select_regex()?.captures(input).ok_or(QueryError::Syntax)?;

        let table_name = caps[2].to_ascii_lowercase();
        let table = Table::from_name(&table_name).ok_or(QueryError::UnknownTable(table_name))?;

        let projection = match &caps[1] {
            "*" => Projection::All,
            field => Projection::Field(known_field(table, field)?),
        };

        let field = known_field(table, &caps[3])?;
        if !table.filterable().contains(&field.as_str()) {
            return Err(QueryError::UnsupportedFilter {
                table: table.name().to_string(),
                field,
            });
        }

        Ok(Query {
            projection,
            table,
            filter: Filter {
                field,
                value: caps[4].to_string(),
            },
        })
    }
}

fn known_field(table: Table, raw: &str) -> QueryResult<String> {
    let field = raw.to_ascii_lowercase();
    if table.fields().contains(&field.as_str()) {
        Ok(field)
    } else {
        Err(QueryError::UnknownField {
            table: table.name().to_string(),
            field,
        })
    }
}
