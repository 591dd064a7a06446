use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use strucmotif::engine::alignment::AtomPairingScheme;
use strucmotif::engine::query::ScoringStrategy;
use strucmotif::workflows::update::Operation;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    author = "Tony Kan, Ted Yu, William A. Goddard III, Victor Wai Tak Kam",
    version,
    about = "strucmotif - Structural motif search over large archives of macromolecular structures.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads for parallel computation.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,

    /// Path to the configuration file in TOML format.
    #[arg(short, long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Root directory for archive data, overriding the OS-specific default.
    #[arg(long, global = true, value_name = "PATH")]
    pub data_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Add structures to the archive index, remove them, or recover from an interrupted run.
    Update(UpdateArgs),
    /// Search the archive for occurrences of a structural motif.
    Search(SearchArgs),
}

/// Arguments for the `update` subcommand.
#[derive(Args, Debug)]
pub struct UpdateArgs {
    /// Update operation: add, remove or recover.
    #[arg(value_parser = parse_operation, value_name = "OPERATION")]
    pub operation: Operation,

    /// Structure identifiers to process, or 'full' for the complete remote entry list.
    #[arg(value_name = "IDS", num_args(0..))]
    pub ids: Vec<String>,

    /// Override the number of structures processed per partition.
    #[arg(long, value_name = "INT")]
    pub chunk_size: Option<usize>,
}

/// Arguments for the `search` subcommand.
#[derive(Args, Debug)]
pub struct SearchArgs {
    /// Query structure: a PDB file path or the identifier of an indexed structure.
    #[arg(short, long, required = true, value_name = "PATH_OR_ID")]
    pub structure: String,

    /// Motif residues as CHAIN:SEQ[INSERTION], comma-separated (e.g., A:57,A:102,A:195).
    #[arg(short, long, required = true, value_delimiter = ',', value_name = "RESIDUES")]
    pub residues: Vec<String>,

    /// Allowed residue types at one motif position (e.g., A:195=SER,CYS). Repeatable.
    #[arg(short = 'x', long = "exchange", value_name = "CHAIN:SEQ=TYPES")]
    pub exchanges: Vec<String>,

    /// Backbone distance tolerance in bins.
    #[arg(long, value_name = "INT")]
    pub backbone_tolerance: Option<u8>,

    /// Side-chain distance tolerance in bins.
    #[arg(long, value_name = "INT")]
    pub side_chain_tolerance: Option<u8>,

    /// Angle tolerance in bins.
    #[arg(long, value_name = "INT")]
    pub angle_tolerance: Option<u8>,

    /// Scoring strategy: descriptor or alignment.
    #[arg(long, value_parser = parse_scoring_strategy, value_name = "STRATEGY")]
    pub strategy: Option<ScoringStrategy>,

    /// Atoms used for superposition: backbone, side-chain or all.
    #[arg(long, value_parser = parse_pairing_scheme, value_name = "SCHEME")]
    pub pairing_scheme: Option<AtomPairingScheme>,

    /// Reject hits with a descriptor score at or above this value.
    #[arg(long, value_name = "FLOAT")]
    pub score_cutoff: Option<f64>,

    /// Reject hits with an RMSD at or above this value.
    #[arg(long, value_name = "FLOAT")]
    pub rmsd_cutoff: Option<f64>,

    /// Maximum number of hits to report.
    #[arg(short, long, value_name = "INT")]
    pub limit: Option<usize>,
}

fn parse_operation(s: &str) -> Result<Operation, String> {
    s.parse().map_err(|e: strucmotif::engine::error::InputError| e.to_string())
}

fn parse_scoring_strategy(s: &str) -> Result<ScoringStrategy, String> {
    s.parse().map_err(|e: strucmotif::engine::error::InputError| e.to_string())
}

fn parse_pairing_scheme(s: &str) -> Result<AtomPairingScheme, String> {
    s.parse().map_err(|e: strucmotif::engine::error::InputError| e.to_string())
}
