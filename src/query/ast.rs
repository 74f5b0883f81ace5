//! Parsed query representation

use std::fmt;

/// Tables a query can address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Table {
    Doctors,
    Appointments,
}

impl Table {
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "doctors" => Some(Table::Doctors),
            "appointments" => Some(Table::Appointments),
            _ => None,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Table::Doctors => "doctors",
            Table::Appointments => "appointments",
        }
    }

    /// Column names in on-disk order
    pub fn fields(&self) -> &'static [&'static str] {
        match self {
            Table::Doctors => &["id", "name", "address"],
            Table::Appointments => &["id", "date", "doctor_id"],
        }
    }

    /// Columns backed by the primary or secondary index
    pub fn filterable(&self) -> &'static [&'static str] {
        match self {
            Table::Doctors => &["id", "name"],
            Table::Appointments => &["id", "doctor_id"],
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// SELECT list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Projection {
    /// `*`
    All,
    Field(String),
}

/// Equality predicate `field = 'value'`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Filter {
    pub field: String,
    pub value: String,
}

/// `SELECT <projection> FROM <table> WHERE <filter>`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Query {
    pub projection: Projection,
    pub table: Table,
    pub filter: Filter,
}
