// SPDX-License-Identifier: MIT

#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! gc — the Gas City CLI: start/stop a city's controller and inspect or
//! steer it directly against the filesystem and session backend.

mod citydir;
mod commands;
mod poll;

use std::time::Duration;

use clap::{Args, Parser, Subcommand};
use commands::{agent, events, logs, start, status, stop};

#[derive(Parser)]
#[command(name = "gc", version, about = "Gas City control plane")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Acquire the city lock and run the controller until canceled.
    Start,
    /// Ask a running controller to stop.
    Stop,
    /// Print whether the controller is running.
    Status,
    /// Tail the controller's log file.
    Logs {
        /// Number of recent lines to show.
        #[arg(short = 'n', long, default_value = "50")]
        lines: usize,
        /// Keep following new lines as they're written.
        #[arg(short, long)]
        follow: bool,
    },
    /// Act on one agent's session directly.
    Agent(AgentArgs),
    /// Inspect or watch the event log.
    Events(EventsArgs),
}

#[derive(Args)]
struct AgentArgs {
    #[command(subcommand)]
    command: AgentCommand,
}

#[derive(Subcommand)]
enum AgentCommand {
    /// Mark an agent as draining.
    Drain { name: String },
    /// Clear an agent's draining state.
    Undrain { name: String },
    /// Exit 0 iff the named (or current) agent is draining.
    DrainCheck { name: Option<String> },
    /// Acknowledge a drain request from inside the agent's own session.
    DrainAck { name: Option<String> },
    /// Request a restart on the agent's next reconcile tick.
    RequestRestart { name: Option<String> },
}

#[derive(Args)]
struct EventsArgs {
    #[command(subcommand)]
    command: EventsCommand,
}

#[derive(Subcommand)]
enum EventsCommand {
    /// List events, most filters optional.
    List {
        #[arg(long = "type")]
        event_type: Option<String>,
        #[arg(long)]
        since: Option<i64>,
    },
    /// Block until a matching event appears, or the deadline elapses.
    Watch {
        #[arg(long = "after-seq")]
        after_seq: u64,
        #[arg(long = "type")]
        event_type: Option<String>,
        /// Payload filter as `key=value`; may be repeated.
        #[arg(long = "match")]
        matches: Vec<String>,
        /// Overall wait budget in seconds.
        #[arg(long)]
        deadline: u64,
    },
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    match run(Cli::parse().command).await {
        Ok(true) => std::process::ExitCode::SUCCESS,
        Ok(false) => std::process::ExitCode::FAILURE,
        Err(e) => {
            eprintln!("gc: {e:#}");
            std::process::ExitCode::FAILURE
        }
    }
}

async fn run(command: Commands) -> anyhow::Result<bool> {
    match command {
        Commands::Start => start::run().await,
        Commands::Stop => stop::run().await,
        Commands::Status => status::run().await,
        Commands::Logs { lines, follow } => logs::run(lines, follow).await,
        Commands::Agent(args) => match args.command {
            AgentCommand::Drain { name } => agent::drain(Some(name)).await,
            AgentCommand::Undrain { name } => agent::undrain(Some(name)).await,
            AgentCommand::DrainCheck { name } => agent::drain_check(name).await,
            AgentCommand::DrainAck { name } => agent::drain_ack(name).await,
            AgentCommand::RequestRestart { name } => agent::request_restart(name).await,
        },
        Commands::Events(args) => match args.command {
            EventsCommand::List { event_type, since } => events::list(event_type, since),
            EventsCommand::Watch {
                after_seq,
                event_type,
                matches,
                deadline,
            } => events::watch(after_seq, event_type, matches, Duration::from_secs(deadline)).await,
        },
    }
}
