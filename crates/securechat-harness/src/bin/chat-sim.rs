//! SecureChat simulation binary.
//!
//! Runs a seeded alice/bob/carol workload against an in-memory log with
//! optional fault injection and reports invariant violations.
//!
//! # Usage
//!
//! ```bash
//! # Reproducible fault-free run
//! chat-sim --seed 42 --messages 200
//!
//! # Inject log failures into one in ten operations
//! chat-sim --seed 7 --failure-rate 0.1 --log-level debug
//! ```

use clap::Parser;
use securechat_harness::{SimulationConfig, run_simulation};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

/// SecureChat session simulator
#[derive(Parser, Debug)]
#[command(name = "chat-sim")]
#[command(about = "Deterministic SecureChat session simulation")]
#[command(version)]
struct Args {
    /// Seed for workload, environments and fault injection
    #[arg(short, long, default_value = "0")]
    seed: u64,

    /// Number of workload steps
    #[arg(short, long, default_value = "100")]
    messages: usize,

    /// Probability that a log operation fails (0.0 to 1.0)
    #[arg(long, default_value = "0.0", value_parser = parse_rate)]
    failure_rate: f64,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    log_level: String,
}

fn parse_rate(raw: &str) -> Result<f64, String> {
    let rate: f64 = raw.parse().map_err(|e| format!("{e}"))?;
    if (0.0..=1.0).contains(&rate) {
        Ok(rate)
    } else {
        Err(format!("failure rate must be between 0.0 and 1.0, got {rate}"))
    }
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&args.log_level));

    tracing_subscriber::registry().with(fmt::layer()).with(filter).init();

    tracing::info!(seed = args.seed, steps = args.messages, "simulation starting");

    let report = run_simulation(SimulationConfig {
        seed: args.seed,
        messages: args.messages,
        failure_rate: args.failure_rate,
    })
    .await;

    tracing::info!(report = %serde_json::to_string(&report)?, "simulation finished");

    if report.violations.is_empty() {
        Ok(())
    } else {
        for violation in &report.violations {
            tracing::error!(%violation, "invariant violated");
        }
        Err(format!("{} invariant violations (seed {})", report.violations.len(), args.seed).into())
    }
}
