use std::io::{self, BufRead, Write};

use anyhow::{anyhow, Context, Result};
use oecd_sdmx::{
    hierarchy::HIERARCHY_FILE,
    lookup::{self, CheckTarget, LookupSource},
    query::ask,
    report::{self, CODELISTS_FILE, DATAFLOWS_FILE},
    Query, QueryType, Response, Session, Transport,
};

use crate::cli::Settings;

const INPUT_ENDED: &str = "\nProgram execution ended: EXITED";

fn is_end_of_input(error: &io::Error) -> bool {
    error.kind() == io::ErrorKind::UnexpectedEof
}

/// Writes the report files for a successful response.
pub fn process<W: Write>(
    query: &Query,
    response: &Response,
    settings: &Settings,
    out: &mut W,
) -> Result<()> {
    write!(out, "{}", response.details())?;
    log::debug!("response body is {} bytes", response.body().len());
    if response.namespaces().is_empty() {
        log::warn!("response declares no namespaces");
    } else {
        log::info!("{}", response.namespaces());
    }

    let path = settings.output_dir.join(HIERARCHY_FILE);
    writeln!(
        out,
        "\nPrettyfying the response and writing it to the output file({HIERARCHY_FILE})..."
    )?;
    response
        .write_hierarchy(&path, settings.lines)
        .with_context(|| format!("failed to write {}", path.display()))?;
    writeln!(out, "Operation completed!")?;

    match (query.query_type(), query.artefact_type()) {
        (QueryType::Structure, Some("dataflow")) => {
            writeln!(
                out,
                "\nExtracting relevant information from the inquired dataflows and writing it to the output file({DATAFLOWS_FILE})..."
            )?;
            let path = settings.output_dir.join(DATAFLOWS_FILE);
            report::write_table(&path, &response.dataflows()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "Operation completed!")?;
        }
        (QueryType::Structure, Some("codelist")) => {
            writeln!(
                out,
                "\nExtracting relevant information from the inquired codelists and writing it to the output file({CODELISTS_FILE})..."
            )?;
            let path = settings.output_dir.join(CODELISTS_FILE);
            report::write_table(&path, &response.codelists()?)
                .with_context(|| format!("failed to write {}", path.display()))?;
            writeln!(out, "Operation completed!")?;
        }
        _ => {}
    }

    writeln!(out, "\nWorkflow completed!")?;
    Ok(())
}

/// Runs one already validated query; a failed request ends the run.
pub fn run_shell<T: Transport, W: Write>(
    query: Query,
    transport: T,
    settings: &Settings,
    out: &mut W,
) -> Result<()> {
    let session = Session::with_transport(query, &settings.api_root, transport);
    writeln!(out, "\nSession's resulting API: {}", session.url())?;
    writeln!(out, "Sending request to endpoint, waiting for response...")?;
    let response = session
        .get()
        .map_err(|e| anyhow!("Caught an exception: \"{e}\""))?;
    process(session.query(), &response, settings, out)
}

/// Prompts for queries until the user declines to continue or input runs out. A failed
/// request starts the current query over.
pub fn run_interactive<T: Transport, R: BufRead, W: Write>(
    transport: &T,
    settings: &Settings,
    input: &mut R,
    out: &mut W,
) -> Result<()> {
    loop {
        let (query, response) = loop {
            let query = match Query::prompt(input, out) {
                Ok(query) => query,
                Err(e) if is_end_of_input(&e) => {
                    writeln!(out, "{INPUT_ENDED}")?;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            let session = Session::with_transport(query, &settings.api_root, transport);
            writeln!(out, "\nSession's resulting API: {}", session.url())?;
            writeln!(out, "Sending request to endpoint, waiting for response...")?;
            match session.get() {
                Ok(response) => break (session.query().clone(), response),
                Err(e) => writeln!(out, "\nCaught an exception: \"{e}\"")?,
            }
        };

        process(&query, &response, settings, out)?;

        loop {
            let answer = match ask(input, out, "Would you like to query some more? ") {
                Ok(answer) => answer,
                Err(e) if is_end_of_input(&e) => {
                    writeln!(out, "{INPUT_ENDED}")?;
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };
            match answer.to_lowercase().as_str() {
                "yes" | "y" => break,
                "no" | "n" => {
                    writeln!(out, "End of session, EXITED")?;
                    return Ok(());
                }
                _ => writeln!(out, "Choose a valid option: \"yes\"/\"y\" or \"no\"/\"n\"")?,
            }
        }
    }
}

/// Checks that every value of the target's database column appears in its API codelist.
/// Returns whether the check passed.
pub fn run_check<T: Transport, L: LookupSource, W: Write>(
    target: CheckTarget,
    transport: T,
    source: &L,
    settings: &Settings,
    out: &mut W,
) -> Result<bool> {
    let query = Query::Structure {
        artefact_type: "codelist".to_string(),
    };
    let session = Session::with_transport(query, &settings.api_root, transport);
    writeln!(out, "\nSession's resulting API: {}", session.url())?;
    let response = session
        .get()
        .map_err(|e| anyhow!("Caught an exception: \"{e}\""))?;

    let api = lookup::api_values(&response.codelists()?, target);
    let database = lookup::database_values(source, target).with_context(|| {
        format!(
            "failed to read {}.{} from the database",
            target.table(),
            target.column()
        )
    })?;
    let check = lookup::cross_check(database, api);

    writeln!(
        out,
        "{} distinct values in {}.{}, {} codes in {}/{}",
        check.database.len(),
        target.table(),
        target.column(),
        check.api.len(),
        target.agency_id(),
        target.codelist_id()
    )?;
    if check.is_complete() {
        writeln!(out, "All database values are present in the codelist")?;
    } else {
        writeln!(out, "Missing from the codelist:")?;
        for value in &check.missing {
            writeln!(out, "-> {value}")?;
        }
    }
    Ok(check.is_complete())
}

#[cfg(test)]
mod tests {
    use std::{cell::Cell, io::Cursor, path::Path};

    use oecd_sdmx::{session::Headers, RawResponse, RequestError, SqliteLookup};
    use rusqlite::Connection;

    use super::*;

    const DATAFLOW_MESSAGE: &str = r#"<message:Structure xmlns:message="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/message" xmlns:structure="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/structure" xmlns:common="http://www.sdmx.org/resources/sdmxml/schemas/v2_1/common">
  <message:Structures>
    <structure:Dataflows>
      <structure:Dataflow id="DF_NAAG_I" agencyID="OECD.SDD.NAD">
        <common:Name xml:lang="en">Annual national accounts</common:Name>
        <structure:Structure><Ref id="DSD_NAAG" agencyID="OECD.SDD.NAD" class="DataStructure"/></structure:Structure>
      </structure:Dataflow>
    </structure:Dataflows>
    <structure:Codelists>
      <structure:Codelist id="CL_AREA" agencyID="OECD">
        <structure:Code id="FRA"><common:Name xml:lang="en">France</common:Name></structure:Code>
        <structure:Code id="OECD"><common:Name xml:lang="en">OECD</common:Name></structure:Code>
      </structure:Codelist>
    </structure:Codelists>
  </message:Structures>
</message:Structure>"#;

    /// Answers the first request with the given status and every later one with 200.
    struct Scripted {
        failures: Cell<u16>,
        calls: Cell<usize>,
    }

    impl Scripted {
        fn failing_first(status: u16) -> Self {
            Self {
                failures: Cell::new(status),
                calls: Cell::new(0),
            }
        }
    }

    impl Transport for Scripted {
        fn get(&self, _url: &str, _headers: &Headers) -> Result<RawResponse, RequestError> {
            self.calls.set(self.calls.get() + 1);
            let status = self.failures.replace(200);
            Ok(RawResponse {
                status,
                headers: vec![],
                body: DATAFLOW_MESSAGE.as_bytes().to_vec(),
            })
        }
    }

    fn settings(dir: &Path) -> Settings {
        Settings {
            api_root: "http://localhost/rest".into(),
            output_dir: dir.to_path_buf(),
            lines: None,
        }
    }

    #[test]
    fn shell_writes_dataflow_reports() {
        let dir = tempfile::tempdir().unwrap();
        let query = Query::from_args(&["structure", "dataflow"]).unwrap();
        let mut out = Vec::new();
        run_shell(query, Scripted::failing_first(200), &settings(dir.path()), &mut out).unwrap();

        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript
            .contains("Session's resulting API: http://localhost/rest/structure/dataflow"));
        assert!(transcript.ends_with("\nWorkflow completed!\n"));

        let dataflows = std::fs::read_to_string(dir.path().join(DATAFLOWS_FILE)).unwrap();
        assert!(dataflows.contains("DF_NAAG_I"));
        assert!(dataflows.contains("DataStructure"));
        assert!(dir.path().join(HIERARCHY_FILE).exists());
        assert!(!dir.path().join(CODELISTS_FILE).exists());
    }

    #[test]
    fn shell_request_failure_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let query = Query::from_args(&["structure", "dataflow"]).unwrap();
        let error = run_shell(
            query,
            Scripted::failing_first(404),
            &settings(dir.path()),
            &mut io::sink(),
        )
        .unwrap_err();
        assert_eq!(
            error.to_string(),
            "Caught an exception: \"Something went wrong! Status code: <404>\""
        );
        assert!(!dir.path().join(HIERARCHY_FILE).exists());
    }

    #[test]
    fn interactive_retries_then_stops() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Scripted::failing_first(500);
        // first attempt fails and is prompted again, then an invalid answer, then "n"
        let mut input = Cursor::new("1\ncodelist\n1\ncodelist\nmaybe\nN\n");
        let mut out = Vec::new();
        run_interactive(&transport, &settings(dir.path()), &mut input, &mut out).unwrap();

        assert_eq!(transport.calls.get(), 2);
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript
            .contains("Caught an exception: \"Something went wrong! Status code: <500>\""));
        assert!(transcript.contains("Choose a valid option: \"yes\"/\"y\" or \"no\"/\"n\""));
        assert!(transcript.ends_with("End of session, EXITED\n"));

        let codelists = std::fs::read_to_string(dir.path().join(CODELISTS_FILE)).unwrap();
        assert_eq!(codelists.lines().count(), 4);
    }

    #[test]
    fn interactive_loops_until_input_ends() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Scripted::failing_first(200);
        let mut input = Cursor::new("1\ndataflow\ny\n1\ncodelist\ny\n");
        let mut out = Vec::new();
        run_interactive(&transport, &settings(dir.path()), &mut input, &mut out).unwrap();

        assert_eq!(transport.calls.get(), 2);
        assert!(dir.path().join(DATAFLOWS_FILE).exists());
        assert!(dir.path().join(CODELISTS_FILE).exists());
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.ends_with("Program execution ended: EXITED\n"));
    }

    #[test]
    fn input_ending_at_continue_prompt_exits() {
        let dir = tempfile::tempdir().unwrap();
        let transport = Scripted::failing_first(200);
        let mut input = Cursor::new("1\ndataflow\n");
        let mut out = Vec::new();
        run_interactive(&transport, &settings(dir.path()), &mut input, &mut out).unwrap();

        assert_eq!(transport.calls.get(), 1);
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript
            .ends_with("Would you like to query some more? \nProgram execution ended: EXITED\n"));
        assert!(!transcript.contains("End of session"));
    }

    #[test]
    fn check_reports_missing_values() {
        let dir = tempfile::tempdir().unwrap();
        let connection = Connection::open_in_memory().unwrap();
        connection
            .execute_batch(
                "CREATE TABLE subjects (name TEXT);
                 INSERT INTO subjects VALUES ('France'), ('OECD - Total'), ('Atlantis');",
            )
            .unwrap();
        let source = SqliteLookup::from_connection(connection);

        let mut out = Vec::new();
        let passed = run_check(
            CheckTarget::Subject,
            Scripted::failing_first(200),
            &source,
            &settings(dir.path()),
            &mut out,
        )
        .unwrap();
        assert!(!passed);
        let transcript = String::from_utf8(out).unwrap();
        assert!(transcript.contains("3 distinct values in subjects.name, 2 codes in OECD/CL_AREA"));
        assert!(transcript.contains("-> Atlantis"));
        assert!(!transcript.contains("-> OECD"));
    }
}
