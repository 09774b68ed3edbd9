use thiserror::Error;

use crate::query::DATA_QUERY_FIELDS;

fn bulleted(fields: &[&str]) -> String {
    fields.iter().map(|field| format!("\n* {field}")).collect()
}

/// Problems with the arguments a query is built from.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum QueryError {
    #[error("Shell mode requires additional arguments, at least two more (for the query type and for the artefact/context)")]
    MissingArguments,
    #[error("Supported query types: \"structure\" and \"data\" (got {0:?})")]
    UnsupportedQueryType(String),
    #[error("For structure queries, only one more argument needed after the query type: \n* artefact")]
    StructureArity,
    #[error(
        "For data queries, {} more arguments needed after the query type: {}",
        DATA_QUERY_FIELDS.len(),
        bulleted(&DATA_QUERY_FIELDS)
    )]
    DataArity,
}

/// A query that did not produce a usable response.
#[derive(Debug, Error)]
pub enum RequestError {
    #[error("Something went wrong! Status code: <{0}>")]
    Status(u16),
    #[error("the request could not be completed: {0}")]
    Transport(#[source] Box<dyn std::error::Error + Send + Sync>),
    #[error("the response is not well-formed XML: {0}")]
    Xml(#[from] roxmltree::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ExtractError {
    #[error("a {element} element lacks the required {attribute:?} attribute")]
    MissingAttribute {
        element: &'static str,
        attribute: &'static str,
    },
}

#[derive(Debug, Error)]
pub enum LookupError {
    #[error("{0:?} is not a valid table or column name")]
    InvalidIdentifier(String),
    #[error("database error: {0}")]
    Sqlite(#[from] rusqlite::Error),
}
