//! CLI argument definitions (clap).

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "meshbench",
    about = "meshbench - peer-to-peer file distribution testbed",
    long_about = None,
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Sample a peer population and compute its overlay/allocation plan;
    /// print and persist it without building or running a fabric.
    Plan(PlanArgs),

    /// Run the full pipeline: plan, build the fabric, launch every
    /// endpoint, await the confirmation barrier, validate, and record a
    /// Result Record.
    Run(PlanArgs),

    /// Re-run edge and integrity validation (§4.5) against an already
    /// built run.
    Validate(ValidateArgs),

    /// Print the accumulated results log.
    Results(ResultsArgs),
}

#[derive(Args)]
pub struct PlanArgs {
    /// Non-origin peer count to sample. Defaults to the config file's
    /// `peer_count`.
    #[arg(long)]
    pub peers: Option<usize>,

    /// Sampler seed. Defaults to the config file's `seed`.
    #[arg(long)]
    pub seed: Option<u64>,

    /// Use the two-tier overlay instead of the star overlay.
    #[arg(long)]
    pub two_tier: bool,

    /// Super-peer count for the two-tier overlay.
    #[arg(long)]
    pub superpeers: Option<usize>,

    /// Synthetic transfer artifact size, in bytes.
    #[arg(long)]
    pub file_size: Option<u64>,

    /// Print the rendered fabric description YAML in addition to the
    /// plan summary.
    #[arg(long)]
    pub show_fabric: bool,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// `test_id` of a previously built run under `~/.meshbench/runs`.
    pub test_id: u64,
}

#[derive(Args)]
pub struct ResultsArgs {
    /// Only print the last N rows.
    #[arg(long)]
    pub last: Option<usize>,
}
