use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "MolSim CLI - inspect molecular structures, fetch them from the RCSB PDB and run harmonic molecular dynamics on them.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used for replica ensembles.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Summarize a structure file: atom, bond, chain and residue counts.
    Info(InfoArgs),
    /// Run a molecular dynamics simulation on a structure.
    Run(RunArgs),
    /// Download a structure from the RCSB Protein Data Bank.
    Fetch(FetchArgs),
}

/// Arguments for the `info` subcommand.
#[derive(Args, Debug)]
pub struct InfoArgs {
    /// Path to a PDB structure file.
    #[arg(required = true, value_name = "PATH")]
    pub structure: PathBuf,
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the input PDB structure.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub input: PathBuf,

    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Path for the trajectory CSV (one row per frame and atom).
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Also write the final state as a PDB file.
    #[arg(long, value_name = "PATH")]
    pub final_structure: Option<PathBuf>,

    /// Also write every frame as a multi-model PDB file.
    #[arg(long, value_name = "PATH")]
    pub trajectory_pdb: Option<PathBuf>,

    // --- Simulation Overrides ---
    /// Override the number of integration steps.
    #[arg(short = 'n', long, value_name = "INT")]
    pub steps: Option<usize>,

    /// Override the integration timestep, in femtoseconds.
    #[arg(long, value_name = "FS")]
    pub timestep: Option<f64>,

    // --- Ensemble Overrides ---
    /// Run this many independent replicas in parallel.
    #[arg(long, value_name = "INT")]
    pub replicas: Option<usize>,

    /// Temperature in kelvin for initial velocities.
    #[arg(long, value_name = "K")]
    pub temperature: Option<f64>,

    /// Random seed for initial velocities.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S simulation.n-steps=500
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `fetch` subcommand.
#[derive(Args, Debug)]
pub struct FetchArgs {
    /// Four-character PDB identifier, e.g. 1CRN.
    #[arg(required = true, value_name = "PDB_ID")]
    pub id: String,

    /// Where to write the structure. Defaults to `<PDB_ID>.pdb` in the current directory.
    #[arg(short, long, value_name = "PATH")]
    pub output: Option<PathBuf>,

    /// Overwrite the output file if it exists.
    #[arg(long)]
    pub force: bool,
}
