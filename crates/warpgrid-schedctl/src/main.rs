//! warpgrid-schedctl — operator CLI for the scheduler's failure path.
//!
//! # Usage
//!
//! ```text
//! warpgrid-schedctl --state /var/lib/warpgrid/sched.redb seed inst-1 inst-2
//! warpgrid-schedctl --state /var/lib/warpgrid/sched.redb fail \
//!     --service compute --method run_instance --reason "no valid host" inst-1 inst-2
//! warpgrid-schedctl --state /var/lib/warpgrid/sched.redb faults inst-1
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

mod commands;

#[derive(Parser)]
#[command(
    name = "warpgrid-schedctl",
    about = "WarpGrid scheduler failure-path tooling",
    version,
    propagate_version = true,
)]
struct Cli {
    /// Scheduler config file (scheduler.toml).
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// State store file; overrides [state].path from the config.
    #[arg(short, long, global = true)]
    state: Option<PathBuf>,

    /// Log output format.
    #[arg(long, global = true, value_enum, default_value_t = LogFormat::Text)]
    log_format: LogFormat,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
enum Commands {
    /// Insert pending instance records awaiting placement.
    Seed {
        /// Instance UUIDs.
        #[arg(required = true)]
        uuids: Vec<String>,
    },
    /// Mark instances as failed, record a fault and notify observers.
    Fail {
        /// Service reporting the failure (first half of the event type).
        #[arg(long, default_value = "scheduler")]
        service: String,
        /// Method that failed (second half of the event type).
        #[arg(long, default_value = "run_instance")]
        method: String,
        /// Error type recorded with the fault.
        #[arg(long, default_value = "NoValidHost")]
        kind: String,
        /// Human-readable failure reason.
        #[arg(long)]
        reason: String,
        /// Fault code; internal error (500) when omitted.
        #[arg(long)]
        code: Option<u16>,
        /// Instance UUIDs, processed in order.
        #[arg(required = true)]
        uuids: Vec<String>,
    },
    /// List the faults recorded for an instance.
    Faults {
        uuid: String,
        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: String,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info,warpgrid=debug"));
    match cli.log_format {
        LogFormat::Text => tracing_subscriber::fmt().with_env_filter(filter).init(),
        LogFormat::Json => tracing_subscriber::fmt().json().with_env_filter(filter).init(),
    }

    let config = commands::load_config(cli.config.as_deref(), cli.state)?;

    match cli.command {
        Commands::Seed { uuids } => commands::seed::seed(&config, &uuids),
        Commands::Fail {
            service,
            method,
            kind,
            reason,
            code,
            uuids,
        } => {
            let args = commands::fail::FailArgs {
                service,
                method,
                kind,
                reason,
                code,
                uuids,
            };
            commands::fail::fail(&config, &args)
        }
        Commands::Faults { uuid, format } => commands::faults::faults(&config, &uuid, &format),
    }
}
