//! meshbench -- coordinator CLI for the peer-to-peer file distribution
//! testbed

mod cli;
mod config;
mod display;
mod pipeline;
mod results;

use anyhow::Result;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use cli::{Cli, Command};
use config::MeshBenchConfig;

/// Process exit codes (§6): 0 all checks pass, 1 any validator check
/// fails (integrity or edge-quality), 2 run-wide deadline/barrier
/// reached, 3 configuration/unsupported input.
const EXIT_OK: i32 = 0;
const EXIT_VALIDATOR_FAILURE: i32 = 1;
const EXIT_RUN_DEADLINE: i32 = 2;
const EXIT_CONFIG_ERROR: i32 = 3;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let cli = Cli::parse();
    let code = match run(cli).await {
        Ok(()) => EXIT_OK,
        Err(error) => {
            display::print_error(&format!("{error:#}"));
            classify_exit(&error)
        }
    };
    std::process::exit(code);
}

fn classify_exit(error: &anyhow::Error) -> i32 {
    let text = error.to_string();
    if text.contains("deadline") || text.contains("barrier") {
        EXIT_RUN_DEADLINE
    } else if text.contains("hash mismatch") || text.contains("integrity") || text.contains("validation") {
        EXIT_VALIDATOR_FAILURE
    } else {
        EXIT_CONFIG_ERROR
    }
}

async fn run(cli: Cli) -> Result<()> {
    let cfg = MeshBenchConfig::load_or_create()?;

    match cli.command {
        Command::Plan(args) => pipeline::cmd_plan(&cfg, &args),
        Command::Run(args) => pipeline::cmd_run(&cfg, &args).await,
        Command::Validate(args) => pipeline::cmd_validate(args.test_id).await,
        Command::Results(args) => pipeline::cmd_results(args.last),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn run_deadline_and_barrier_incomplete_classify_as_exit_2() {
        let deadline = anyhow::anyhow!("run deadline of 30s elapsed before every endpoint confirmed completion");
        assert_eq!(classify_exit(&deadline), EXIT_RUN_DEADLINE);

        let barrier = anyhow::anyhow!("barrier incomplete: observed 3 of 5");
        assert_eq!(classify_exit(&barrier), EXIT_RUN_DEADLINE);
    }

    #[test]
    fn validator_failures_classify_as_exit_1() {
        let hash = anyhow::anyhow!("integrity check failed: hash mismatch for one or more endpoints in test_id 1");
        assert_eq!(classify_exit(&hash), EXIT_VALIDATOR_FAILURE);

        let edges = anyhow::anyhow!("2 edge(s) failed validation");
        assert_eq!(classify_exit(&edges), EXIT_VALIDATOR_FAILURE);
    }

    #[test]
    fn configuration_errors_classify_as_exit_3() {
        let cfg_error = anyhow::anyhow!("meshbench-endpoint binary not found at /bin/meshbench-endpoint");
        assert_eq!(classify_exit(&cfg_error), EXIT_CONFIG_ERROR);
    }
}
