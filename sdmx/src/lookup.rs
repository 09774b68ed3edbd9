//! Cross-checking of values stored in the local macro-economic database against the
//! codelists published by the API.

use std::path::Path;

use rusqlite::{types::Value, Connection, OpenFlags};

use crate::{error::LookupError, records::CodelistRecord};

pub const DEFAULT_DATABASE: &str = "Macro.db";

/// A read-only source of column values.
pub trait LookupSource {
    fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<String>, LookupError>;
}

pub struct SqliteLookup {
    connection: Connection,
}

impl SqliteLookup {
    pub fn open(path: &Path) -> Result<Self, LookupError> {
        let connection = Connection::open_with_flags(
            path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )?;
        Ok(Self { connection })
    }

    pub fn from_connection(connection: Connection) -> Self {
        Self { connection }
    }
}

/// Table and column names cannot be bound as parameters, so they are restricted to plain
/// identifiers before being spliced into the statement.
fn identifier(name: &str) -> Result<&str, LookupError> {
    let mut chars = name.chars();
    let valid = chars
        .next()
        .is_some_and(|first| first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_');
    if valid {
        Ok(name)
    } else {
        Err(LookupError::InvalidIdentifier(name.to_string()))
    }
}

impl LookupSource for SqliteLookup {
    fn distinct_values(&self, table: &str, column: &str) -> Result<Vec<String>, LookupError> {
        let sql = format!(
            "SELECT DISTINCT {} FROM {};",
            identifier(column)?,
            identifier(table)?
        );
        let mut statement = self.connection.prepare(&sql)?;
        let rows = statement.query_map([], |row| row.get::<_, Value>(0))?;

        let mut values = Vec::new();
        for value in rows {
            if let Some(value) = as_text(value?) {
                values.push(normalize(table, value));
            }
        }
        log::debug!("{} distinct values in {table}.{column}", values.len());
        Ok(values)
    }
}

/// SQLite columns are loosely typed; every non-NULL value is compared as text.
fn as_text(value: Value) -> Option<String> {
    match value {
        Value::Null => None,
        Value::Integer(value) => Some(value.to_string()),
        Value::Real(value) => Some(value.to_string()),
        Value::Text(value) => Some(value),
        Value::Blob(value) => Some(String::from_utf8_lossy(&value).into_owned()),
    }
}

/// Maps database spellings onto the labels used by the API. Only `subjects` needs this; other
/// tables pass through untouched.
pub fn normalize(table: &str, value: String) -> String {
    if table != "subjects" {
        return value;
    }
    if value.starts_with("OECD") {
        "OECD".to_string()
    } else if value.starts_with("Euro area") {
        "Euro area".to_string()
    } else if value.starts_with("European Union") {
        "European Union".to_string()
    } else if value.contains("China") {
        "China".to_string()
    } else {
        value
    }
}

/// The database columns that are backed by an API codelist.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum CheckTarget {
    Subject,
    Indicator,
    Unit,
}

impl CheckTarget {
    pub fn agency_id(self) -> &'static str {
        match self {
            Self::Subject => "OECD",
            Self::Indicator => "OECD.SDD.NAD",
            Self::Unit => "OECD.SDD.SDPS",
        }
    }

    pub fn codelist_id(self) -> &'static str {
        match self {
            Self::Subject => "CL_AREA",
            Self::Indicator => "CL_TRANSACTION",
            Self::Unit => "CL_MEI_TEST_UNIT_MEASURE",
        }
    }

    pub fn table(self) -> &'static str {
        match self {
            Self::Subject => "subjects",
            Self::Indicator => "indicators",
            Self::Unit => "measures",
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Subject | Self::Indicator => "name",
            Self::Unit => "unit",
        }
    }
}

/// English code labels of the target's codelist.
pub fn api_values(records: &[CodelistRecord], target: CheckTarget) -> Vec<String> {
    records
        .iter()
        .filter(|record| {
            record.agency_id == target.agency_id() && record.codelist_id == target.codelist_id()
        })
        .map(|record| record.code_name.clone())
        .collect()
}

pub fn database_values(
    source: &impl LookupSource,
    target: CheckTarget,
) -> Result<Vec<String>, LookupError> {
    source.distinct_values(target.table(), target.column())
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CrossCheck {
    pub database: Vec<String>,
    pub api: Vec<String>,
    /// Database values with no counterpart in the codelist, in database order.
    pub missing: Vec<String>,
}

impl CrossCheck {
    pub fn is_complete(&self) -> bool {
        self.missing.is_empty()
    }
}

pub fn cross_check(database: Vec<String>, api: Vec<String>) -> CrossCheck {
    let mut missing: Vec<String> = Vec::new();
    for value in &database {
        if !api.contains(value) && !missing.contains(value) {
            missing.push(value.clone());
        }
    }
    CrossCheck {
        database,
        api,
        missing,
    }
}
