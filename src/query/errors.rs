//! Query translation errors

use thiserror::Error;

use crate::store::StoreError;

pub type QueryResult<T> = Result<T, QueryError>;

/// Errors from parsing or running a query string
#[derive(Debug, Error)]
pub enum QueryError {
    /// Not of the form `SELECT <field|*> FROM <table> WHERE <field> = '<value>'`
    #[error("Query syntax error: expected SELECT <field|*> FROM <table> WHERE <field> = '<value>'")]
    Syntax,

    #[error("Unknown table: {0}")]
    UnknownTable(String),

    /// Filter on a field that has no index behind it
    #[error("Cannot filter {table} by {field}")]
    UnsupportedFilter { table: String, field: String },

    #[error("Unknown field {field} in {table}")]
    UnknownField { table: String, field: String },

    #[error("Invalid query pattern: {0}")]
    Pattern(#[from] regex::Error),

    /// The translated store operation failed
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl QueryError {
    /// Stable string code, passed through the API
    pub fn code(&self) -> &'static str {
        match self {
            QueryError::Syntax | QueryError::Pattern(_) => "CLINIC_QUERY_SYNTAX",
            QueryError::UnknownTable(_) => "CLINIC_QUERY_UNKNOWN_TABLE",
            QueryError::UnsupportedFilter { .. } => "CLINIC_QUERY_UNSUPPORTED_FILTER",
            QueryError::UnknownField { .. } => "CLINIC_QUERY_UNKNOWN_FIELD",
            QueryError::Store(e) => e.code().code(),
        }
    }
}
