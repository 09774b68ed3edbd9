use std::{
    fmt,
    io::{self, BufRead, Write},
    str::FromStr,
};

use crate::error::QueryError;

/// Leading part of every resource URL on the OECD endpoint.
pub const DEFAULT_API_ROOT: &str = "https://sdmx.oecd.org/public/rest/v2";

/// The fields a data query is made of, in URL order.
pub const DATA_QUERY_FIELDS: [&str; 6] = [
    "context",
    "agency_id",
    "dataflow_id",
    "dataflow_version",
    "filter_expression",
    "optional_parameters",
];

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum QueryType {
    Structure,
    Data,
}

impl QueryType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Structure => "structure",
            Self::Data => "data",
        }
    }

    /// Content negotiation differs between structural metadata and data.
    pub fn accept_header(self) -> &'static str {
        match self {
            Self::Structure => "application/vnd.sdmx.structure+xml; charset=utf-8; version=2.1",
            Self::Data => {
                "application/vnd.sdmx.structurespecificdata+xml; charset=utf-8; version=2.1"
            }
        }
    }

    fn from_menu_option(option: &str) -> Option<Self> {
        match option {
            "1" => Some(Self::Structure),
            "2" => Some(Self::Data),
            _ => None,
        }
    }
}

impl FromStr for QueryType {
    type Err = QueryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structure" => Ok(Self::Structure),
            "data" => Ok(Self::Data),
            other => Err(QueryError::UnsupportedQueryType(other.to_string())),
        }
    }
}

impl fmt::Display for QueryType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DataQuery {
    pub context: String,
    pub agency_id: String,
    pub dataflow_id: String,
    pub dataflow_version: String,
    pub filter_expression: String,
    pub optional_parameters: String,
}

/// Everything needed to address one resource, independent of how it was collected.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Query {
    Structure { artefact_type: String },
    Data(DataQuery),
}

impl Query {
    pub fn query_type(&self) -> QueryType {
        match self {
            Self::Structure { .. } => QueryType::Structure,
            Self::Data(_) => QueryType::Data,
        }
    }

    pub fn artefact_type(&self) -> Option<&str> {
        match self {
            Self::Structure { artefact_type } => Some(artefact_type.as_str()),
            Self::Data(_) => None,
        }
    }

    /// The part of the URL following the API root.
    pub fn url_tail(&self) -> String {
        match self {
            Self::Structure { artefact_type } => format!("structure/{artefact_type}"),
            Self::Data(data) => format!(
                "data/{}/{}/{}/{}/{}?{}",
                data.context,
                data.agency_id,
                data.dataflow_id,
                data.dataflow_version,
                data.filter_expression,
                data.optional_parameters
            ),
        }
    }

    pub fn url(&self, api_root: &str) -> String {
        format!("{}/{}", api_root.trim_end_matches('/'), self.url_tail())
    }

    /// Builds a query from positional arguments: `structure <artefact>` or
    /// `data <context> <agency_id> <dataflow_id> <dataflow_version> <filter_expression>
    /// <optional_parameters>`.
    pub fn from_args<S: AsRef<str>>(args: &[S]) -> Result<Self, QueryError> {
        let Some((query_type, rest)) = args.split_first() else {
            return Err(QueryError::MissingArguments);
        };
        let rest: Vec<&str> = rest.iter().map(AsRef::as_ref).collect();
        match query_type.as_ref().parse::<QueryType>()? {
            QueryType::Structure => match rest.as_slice() {
                [artefact_type] => Ok(Self::Structure {
                    artefact_type: artefact_type.to_string(),
                }),
                _ => Err(QueryError::StructureArity),
            },
            QueryType::Data => match rest.as_slice() {
                [
                    context,
                    agency_id,
                    dataflow_id,
                    dataflow_version,
                    filter_expression,
                    optional_parameters,
                ] => Ok(Self::Data(DataQuery {
                    context: context.to_string(),
                    agency_id: agency_id.to_string(),
                    dataflow_id: dataflow_id.to_string(),
                    dataflow_version: dataflow_version.to_string(),
                    filter_expression: filter_expression.to_string(),
                    optional_parameters: optional_parameters.to_string(),
                })),
                _ => Err(QueryError::DataArity),
            },
        }
    }

    /// Collects a query by prompting on `output` and reading answers from `input`.
    ///
    /// Invalid query types are asked for again; the remaining answers are taken as given.
    /// Running out of input is reported as [`io::ErrorKind::UnexpectedEof`].
    pub fn prompt<R: BufRead, W: Write>(input: &mut R, output: &mut W) -> io::Result<Self> {
        let mut answer = ask(
            input,
            output,
            "\nWhat would you like to query?\n\
             1. Structural Metadata\n\
             2. Data & Reference Metadata\n\
             \nInput the number corresponding to an option: ",
        )?;
        let query_type = loop {
            if let Some(query_type) = QueryType::from_menu_option(&answer) {
                break query_type;
            }
            answer = ask(input, output, "Choose a valid option: 1, 2: ")?;
        };

        match query_type {
            QueryType::Structure => Ok(Self::Structure {
                artefact_type: ask(input, output, "Input the artefact type: ")?,
            }),
            QueryType::Data => Ok(Self::Data(DataQuery {
                context: ask(input, output, "\nInput the context: ")?,
                agency_id: ask(input, output, "Input the agency identifier: ")?,
                dataflow_id: ask(input, output, "Input the dataflow identifier: ")?,
                dataflow_version: ask(input, output, "Input the dataflow version: ")?,
                filter_expression: ask(
                    input,
                    output,
                    "Input the filter expression \n(combination of dimension values, except \"Time Period\"): ",
                )?,
                optional_parameters: ask(
                    input,
                    output,
                    "Input the optional parameters \n(dimension value \"Time Period\", attributes and measures): ",
                )?,
            })),
        }
    }
}

/// Writes `question` and reads one line, without its line terminator.
pub fn ask<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    question: &str,
) -> io::Result<String> {
    write!(output, "{question}")?;
    output.flush()?;
    let mut line = String::new();
    if input.read_line(&mut line)? == 0 {
        return Err(io::Error::new(io::ErrorKind::UnexpectedEof, "no more input"));
    }
    Ok(line.trim_end_matches(['\n', '\r']).to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data_args() -> Vec<&'static str> {
        vec![
            "data",
            "dataflow",
            "OECD.SDD.NAD",
            "DSD_NAAG@DF_NAAG_I",
            "+",
            "*",
            "c[TIME_PERIOD]=ge:2018+le:2024",
        ]
    }

    #[test]
    fn structure_url() {
        let query = Query::from_args(&["structure", "codelist"]).unwrap();
        assert_eq!(query.query_type(), QueryType::Structure);
        assert_eq!(query.artefact_type(), Some("codelist"));
        assert_eq!(
            query.url(DEFAULT_API_ROOT),
            "https://sdmx.oecd.org/public/rest/v2/structure/codelist"
        );
    }

    #[test]
    fn data_url() {
        let query = Query::from_args(&data_args()).unwrap();
        assert_eq!(query.query_type(), QueryType::Data);
        assert_eq!(query.artefact_type(), None);
        assert_eq!(
            query.url("https://example.org/rest/"),
            "https://example.org/rest/data/dataflow/OECD.SDD.NAD/DSD_NAAG@DF_NAAG_I/+/*?c[TIME_PERIOD]=ge:2018+le:2024"
        );
    }

    #[test]
    fn from_args_rejects_bad_shapes() {
        let empty: [&str; 0] = [];
        assert_eq!(Query::from_args(&empty), Err(QueryError::MissingArguments));
        assert_eq!(
            Query::from_args(&["metadata", "x"]),
            Err(QueryError::UnsupportedQueryType("metadata".into()))
        );
        assert_eq!(Query::from_args(&["structure"]), Err(QueryError::StructureArity));
        assert_eq!(
            Query::from_args(&["structure", "a", "b"]),
            Err(QueryError::StructureArity)
        );
        assert_eq!(Query::from_args(&["data", "a", "b"]), Err(QueryError::DataArity));
        let mut too_many = data_args();
        too_many.push("extra");
        assert_eq!(Query::from_args(&too_many), Err(QueryError::DataArity));
    }

    #[test]
    fn data_arity_message_lists_fields_in_order() {
        let message = QueryError::DataArity.to_string();
        let positions: Vec<usize> = DATA_QUERY_FIELDS
            .iter()
            .map(|field| message.find(&format!("* {field}")).unwrap())
            .collect();
        assert!(positions.windows(2).all(|pair| pair[0] < pair[1]));
        assert!(message.starts_with("For data queries, 6 more arguments needed"));
        assert!(message.ends_with(
            "type: \n* context\n* agency_id\n* dataflow_id\n* dataflow_version\n* filter_expression\n* optional_parameters"
        ));
    }

    #[test]
    fn accept_header_depends_on_type() {
        assert!(QueryType::Structure.accept_header().contains("sdmx.structure+xml"));
        assert!(QueryType::Data
            .accept_header()
            .contains("sdmx.structurespecificdata+xml"));
    }

    #[test]
    fn prompt_structure_after_invalid_choice() {
        let mut input = io::Cursor::new("3\nstructure\n1\ndataflow\n");
        let mut output = Vec::new();
        let query = Query::prompt(&mut input, &mut output).unwrap();
        assert_eq!(
            query,
            Query::Structure {
                artefact_type: "dataflow".into()
            }
        );
        let transcript = String::from_utf8(output).unwrap();
        assert_eq!(transcript.matches("Choose a valid option").count(), 2);
    }

    #[test]
    fn prompt_data_takes_six_answers() {
        let mut input = io::Cursor::new("2\r\ndataflow\nOECD.SDD.NAD\nDF\n+\n*\n\n");
        let query = Query::prompt(&mut input, &mut io::sink()).unwrap();
        assert_eq!(
            query,
            Query::Data(DataQuery {
                context: "dataflow".into(),
                agency_id: "OECD.SDD.NAD".into(),
                dataflow_id: "DF".into(),
                dataflow_version: "+".into(),
                filter_expression: "*".into(),
                optional_parameters: String::new(),
            })
        );
    }

    #[test]
    fn prompt_reports_end_of_input() {
        let mut input = io::Cursor::new("2\ndataflow\n");
        let error = Query::prompt(&mut input, &mut io::sink()).unwrap_err();
        assert_eq!(error.kind(), io::ErrorKind::UnexpectedEof);
    }
}
