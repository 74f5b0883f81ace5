//! Query translation front end
//!
//! Accepts `SELECT <field|*> FROM <table> WHERE <field> = '<value>'` and
//! runs it as one indexed clinic lookup. Holds no state.

mod ast;
mod errors;
mod executor;
mod parser;

pub use ast::{Filter, Projection, Query, Table};
pub use errors::{QueryError, QueryResult};
pub use executor::execute;
