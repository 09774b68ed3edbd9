use std::path::PathBuf;

use clap::{ArgAction, ArgGroup, Parser, ValueEnum};
use oecd_sdmx::{lookup::DEFAULT_DATABASE, DEFAULT_API_ROOT};

#[derive(Copy, Clone, Debug, ValueEnum)]
pub enum CheckTarget {
    /// Reference areas (`subjects.name` against `CL_AREA`)
    Subject,
    /// Transactions (`indicators.name` against `CL_TRANSACTION`)
    Indicator,
    /// Units of measure (`measures.unit` against `CL_MEI_TEST_UNIT_MEASURE`)
    Unit,
}

#[derive(Parser)]
#[command(version, about)]
#[command(group(ArgGroup::new("mode").required(true).args(["interactive", "shell", "check"])))]
pub struct Cli {
    #[arg(short, long, help = "Prompt for queries until told to stop")]
    pub interactive: bool,

    #[arg(
        short,
        long,
        help = "Run the single query given by the positional arguments: \
                `structure <artefact>` or `data <context> <agency_id> <dataflow_id> \
                <dataflow_version> <filter_expression> <optional_parameters>`"
    )]
    pub shell: bool,

    #[arg(
        short,
        long,
        value_enum,
        help = "Compare a database column against its API codelist"
    )]
    pub check: Option<CheckTarget>,

    #[arg(value_name = "ARGS", help = "Query arguments for shell mode")]
    pub args: Vec<String>,

    #[arg(long, default_value = DEFAULT_API_ROOT, help = "Root URL of the SDMX REST endpoint")]
    pub api_root: String,

    #[arg(long, default_value = ".", help = "Directory the report files are written to")]
    pub output_dir: PathBuf,

    #[arg(long, help = "Only write the first N lines of the hierarchy report")]
    pub lines: Option<usize>,

    #[arg(long, default_value = DEFAULT_DATABASE, help = "SQLite database used by --check")]
    pub database: PathBuf,

    #[arg(short, long, action = ArgAction::Count, help = "Verbosity (-v for info, -vv for debug)")]
    pub verbose: u8,
}

/// Options shared by every run mode.
#[derive(Clone, Debug)]
pub struct Settings {
    pub api_root: String,
    pub output_dir: PathBuf,
    pub lines: Option<usize>,
}

impl From<&Cli> for Settings {
    fn from(cli: &Cli) -> Self {
        Self {
            api_root: cli.api_root.clone(),
            output_dir: cli.output_dir.clone(),
            lines: cli.lines,
        }
    }
}
