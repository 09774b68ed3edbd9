//! Client-side building blocks for the OECD SDMX REST API: query construction, a one-shot
//! session over a pluggable transport, the parsed response with its namespace table, the
//! flattened hierarchy report and the dataflow/codelist record extractors.

pub mod error;
pub mod hierarchy;
pub mod lookup;
pub mod namespace;
pub mod query;
pub mod records;
pub mod report;
pub mod response;
pub mod session;
pub mod tree;

pub use error::{ExtractError, LookupError, QueryError, RequestError};
pub use lookup::{CheckTarget, CrossCheck, LookupSource, SqliteLookup};
pub use namespace::Namespaces;
pub use query::{DataQuery, Query, QueryType, DEFAULT_API_ROOT};
pub use records::{CodelistRecord, DataflowRecord};
pub use response::Response;
pub use session::{HttpTransport, RawResponse, Session, Transport};
pub use tree::Element;
