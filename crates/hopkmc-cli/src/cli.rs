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
    author,
    version,
    about = "HopKMC CLI - Kinetic Monte Carlo simulation of polaron hopping transport with Marcus-theory rates, and mean squared displacement analysis of the resulting trajectories.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all console log output (the log file, if any, is still written)
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,

    /// Set the number of threads used to run trajectories in parallel.
    /// Defaults to the number of available logical cores.
    #[arg(short = 'j', long, global = true, value_name = "NUM")]
    pub threads: Option<usize>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run independent KMC trajectories and write one CSV file per trajectory.
    Run(RunArgs),
    /// Compute the mean squared displacement curve of a directory of trajectories.
    Msd(MsdArgs),
    /// Print the lattice, neighbor shells and rate classes of a material without running.
    Inspect(InspectArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    // --- Core Arguments ---
    /// Path to the material definition file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub material: PathBuf,

    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Directory receiving the trajectory files (traj_0000.csv, ...).
    #[arg(short, long, required = true, value_name = "DIR")]
    pub output: PathBuf,

    // --- System Overrides ---
    /// Override the supercell size, e.g. '4,4,4'.
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',', num_args = 3)]
    pub size: Option<Vec<usize>>,

    /// Override the temperature in K.
    #[arg(short = 'T', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    // --- KMC Overrides ---
    /// Override the number of independent trajectories.
    #[arg(short, long, value_name = "INT")]
    pub n_traj: Option<usize>,

    /// Override the number of KMC steps per trajectory.
    #[arg(long, value_name = "INT")]
    pub kmc_steps: Option<usize>,

    /// Override the number of steps between checkpoints.
    #[arg(long, value_name = "INT")]
    pub step_interval: Option<usize>,

    /// Override the base random seed; trajectory i uses seed + i.
    #[arg(long, value_name = "INT")]
    pub seed: Option<u64>,

    /// Subtract the electronic coupling from the Marcus barrier, overriding the config file.
    #[arg(long)]
    pub coupling_correction: bool,

    /// Disable electrostatic interactions, even if they are defined in the config file.
    #[arg(long)]
    pub no_electrostatics: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S kmc.n-traj=16
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `msd` subcommand.
#[derive(Args, Debug)]
pub struct MsdArgs {
    /// Directory containing trajectory files written by `run`.
    #[arg(short, long, required = true, value_name = "DIR")]
    pub input: PathBuf,

    /// Path of the MSD table to write.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub output: PathBuf,

    /// Path to the simulation configuration file holding an `[msd]` section.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the largest checkpoint lag.
    #[arg(long, value_name = "INT")]
    pub n_steps: Option<usize>,

    /// Override the number of starting checkpoints per trajectory.
    #[arg(long, value_name = "INT")]
    pub n_disp: Option<usize>,

    /// Override the width of a time bin, in scaled time units.
    #[arg(long, value_name = "FLOAT")]
    pub bin_size: Option<f64>,

    /// Override the factor applied to times before binning.
    #[arg(long, value_name = "FLOAT")]
    pub time_scale: Option<f64>,

    /// Override the factor applied to displacements before squaring.
    #[arg(long, value_name = "FLOAT")]
    pub distance_scale: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S msd.bin-size=1e-9
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}

/// Arguments for the `inspect` subcommand.
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Path to the material definition file in TOML format.
    #[arg(short, long, required = true, value_name = "PATH")]
    pub material: PathBuf,

    /// Path to the simulation configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Override the supercell size, e.g. '4,4,4'.
    #[arg(long, value_name = "X,Y,Z", value_delimiter = ',', num_args = 3)]
    pub size: Option<Vec<usize>>,

    /// Override the temperature used for the rate summary, in K.
    #[arg(short = 'T', long, value_name = "FLOAT")]
    pub temperature: Option<f64>,

    /// Set a specific configuration value, overriding the config file.
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
