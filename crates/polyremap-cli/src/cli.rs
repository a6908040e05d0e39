use clap::{Args, Parser, Subcommand, ValueEnum};
use polyremap::engine::config::CleanupPolicy;
use std::path::PathBuf;

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
    about = "polyremap - Build polymer systems with one force field and re-express them in another, producing simulation-ready LAMMPS data files.",
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
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Derive (or reuse) the atom-type and charge mapping for a polymer chemistry.
    Map(MapArgs),
    /// Acquire the mapping, then build, remap and parameterize a full polymer system.
    Build(BuildArgs),
    /// Check that every external tool the pipeline needs can be found.
    Check(CheckArgs),
}

/// Options shared by every subcommand.
#[derive(Args, Debug, Clone)]
pub struct CommonArgs {
    /// Directory receiving the mapping, the data file and the scratch directory.
    #[arg(short, long, default_value = ".", value_name = "DIR")]
    pub work_dir: PathBuf,

    /// Path to a configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the builder force field (e.g., 'opls-aa').
    #[arg(long, value_name = "NAME")]
    pub source_ff: Option<String>,

    /// Override the target force field (e.g., 'gaff2').
    #[arg(long, value_name = "NAME")]
    pub target_ff: Option<String>,

    /// Override the random seed passed to the builder.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// When to remove the scratch directory.
    #[arg(long, value_enum, value_name = "WHEN")]
    pub cleanup: Option<CleanupArg>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S forcefield.charge-method=gas
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// The monomer chemistry, as SMILES with `*` (or `[*]`) marking connection points.
#[derive(Args, Debug, Clone)]
pub struct ChemistryArgs {
    /// Repeat unit SMILES (e.g., '[*]CC[*]').
    #[arg(short = 'r', long, required = true, value_name = "SMILES")]
    pub repeat_unit: String,

    /// End group SMILES (e.g., '*C').
    #[arg(short = 'e', long, required = true, value_name = "SMILES")]
    pub end_group: String,
}

/// Arguments for the `map` subcommand.
#[derive(Args, Debug)]
pub struct MapArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub chemistry: ChemistryArgs,
}

/// Arguments for the `build` subcommand.
#[derive(Args, Debug)]
pub struct BuildArgs {
    #[command(flatten)]
    pub common: CommonArgs,

    #[command(flatten)]
    pub chemistry: ChemistryArgs,

    /// Target density in g/cm^3.
    #[arg(short, long, value_name = "FLOAT")]
    pub density: Option<f64>,

    /// Number of repeat units per chain.
    #[arg(short = 'n', long, required = true, value_name = "INT")]
    pub chain_length: usize,

    #[command(flatten)]
    pub size: SizeArgs,

    /// Name of the LAMMPS data file written into the work directory.
    #[arg(short = 'o', long, value_name = "NAME")]
    pub data_file: Option<String>,

    /// Build in vacuum: load no water model and add no ions.
    #[arg(long)]
    pub no_solvation: bool,
}

/// Exactly one way of sizing the full system.
#[derive(Args, Debug, Clone, Copy)]
#[group(required = true, multiple = false)]
pub struct SizeArgs {
    /// Approximate total number of atoms.
    #[arg(long, value_name = "INT")]
    pub total_atoms: Option<usize>,
    /// Exact number of chains.
    #[arg(long, value_name = "INT")]
    pub chains: Option<usize>,
}

/// Arguments for the `check` subcommand.
#[derive(Args, Debug)]
pub struct CheckArgs {
    #[command(flatten)]
    pub common: CommonArgs,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum CleanupArg {
    Never,
    OnSuccess,
    Always,
}

impl From<CleanupArg> for CleanupPolicy {
    fn from(arg: CleanupArg) -> Self {
        match arg {
            CleanupArg::Never => CleanupPolicy::Never,
            CleanupArg::OnSuccess => CleanupPolicy::OnSuccess,
            CleanupArg::Always => CleanupPolicy::Always,
        }
    }
}
