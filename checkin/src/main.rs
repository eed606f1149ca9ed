//! Check-in kiosk command line entry point
//!
//! Wires the Breeze gateway, label layout and CUPS sink into the check-in
//! service and prints every result as JSON.

use anyhow::{Context, Result};
use chrono::{Local, NaiveDate};
use clap::{Parser, Subcommand};
use serde::Serialize;
use serde_json::json;
use std::path::{Path, PathBuf};

use checkin::{KioskConfig, PrintSink, RosterDirectory, build_service, codes};
use shared::logging::{self, Component};
use shared::{BatchCheckinRequest, InstanceId, PersonId, PrintRequest, checkin_info, checkin_warn};

/// Check-in kiosk backend for Breeze ChMS
#[derive(Parser)]
#[command(name = "checkin")]
#[command(about = "Check people in to Breeze events and print name labels")]
struct Args {
    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info", global = true)]
    log_level: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Generate, decode and validate check-in codes
    Code {
        #[command(subcommand)]
        action: CodeAction,
    },
    /// Check one person in to an event instance
    Checkin { instance_id: InstanceId, person_id: PersonId },
    /// Check one person out of an event instance
    Checkout { instance_id: InstanceId, person_id: PersonId },
    /// Run a batch check-in from a JSON request file
    Batch {
        #[arg(long)]
        file: PathBuf,
    },
    /// List who is checked in to an event instance
    Attendance { instance_id: InstanceId },
    /// List people eligible for check-in at an event instance
    Eligible { instance_id: InstanceId },
    /// List events, or the instances of one event
    Events {
        /// First day to list (YYYY-MM-DD), today when omitted
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
        /// Show the instances of this event instead
        #[arg(long)]
        event_id: Option<String>,
    },
    /// Show a person, optionally with their family
    Person {
        person_id: PersonId,
        /// Attach the raw family list
        #[arg(long)]
        with_family: bool,
        /// Print only the flattened family members
        #[arg(long, conflicts_with = "with_family")]
        family: bool,
    },
    /// Search people by name
    Search { query: String },
    /// Print labels from a JSON file of `{"labels": [...]}`
    Print {
        #[arg(long)]
        file: PathBuf,
    },
    /// Inspect the label printer
    Printer {
        #[command(subcommand)]
        action: PrinterAction,
    },
}

#[derive(Subcommand)]
enum CodeAction {
    Encode { person_id: PersonId, instance_id: InstanceId },
    Decode { code: String },
    Validate {
        code: String,
        #[arg(long)]
        instance_id: Option<InstanceId>,
        #[arg(long)]
        person_id: Option<PersonId>,
    },
}

#[derive(Subcommand)]
enum PrinterAction {
    /// Whether the configured printer is reachable
    Status,
    /// Raw listing of every printer known to CUPS
    List,
}

fn emit<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn read_json<T: serde::de::DeserializeOwned>(path: &Path) -> Result<T> {
    let raw = std::fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    serde_json::from_str(&raw).with_context(|| format!("parsing {}", path.display()))
}

/// Event listings start today unless a start date is given
fn event_start(start: Option<String>, today: NaiveDate) -> String {
    start.unwrap_or_else(|| today.format("%Y-%m-%d").to_string())
}

fn run_code(action: CodeAction) -> Result<()> {
    match action {
        CodeAction::Encode { person_id, instance_id } => {
            let code = codes::encode(person_id, instance_id);
            emit(&json!({
                "code": code,
                "person_id": person_id,
                "instance_id": instance_id,
                "fits_code_space": codes::fits_code_space(person_id, instance_id),
            }))
        }
        CodeAction::Decode { code } => {
            let decoded = codes::decode(&code).with_context(|| format!("invalid code '{code}'"))?;
            emit(&decoded)
        }
        CodeAction::Validate {
            code,
            instance_id,
            person_id,
        } => match codes::validate(&code, instance_id, person_id) {
            Ok(decoded) => emit(&json!({ "valid": true, "decoded": decoded })),
            Err(e) => {
                checkin_warn!(Component::Codec, code = %code, "Code rejected: {}", e);
                emit(&json!({ "valid": false, "reason": e.to_string() }))
            }
        },
    }
}

async fn run(command: Command) -> Result<()> {
    if let Command::Code { action } = command {
        return run_code(action);
    }

    let config = KioskConfig::from_env().context("loading configuration")?;
    checkin_info!(
        Component::Cli,
        "Using Breeze account {} and printer {}",
        config.breeze_subdomain,
        config.printer_name
    );

    let service = build_service(&config)?;
    let directory = service.gateway();
    let printer = service.printer();

    match command {
        Command::Code { .. } => Ok(()),
        Command::Checkin { instance_id, person_id } => {
            let success = service.check_in(instance_id, person_id).await?;
            emit(&json!({ "success": success, "person_id": person_id }))
        }
        Command::Checkout { instance_id, person_id } => {
            let success = service.check_out(instance_id, person_id).await?;
            emit(&json!({ "success": success, "person_id": person_id }))
        }
        Command::Batch { file } => {
            let request: BatchCheckinRequest = read_json(&file)?;
            let response = service.batch_check_in(&request).await?;
            logging::log_success(
                Component::Batch,
                &format!(
                    "Checked in {}/{} people, {} labels printed",
                    response.succeeded_count(),
                    response.results.len(),
                    response.labels_printed
                ),
            );
            emit(&response)
        }
        Command::Attendance { instance_id } => emit(&service.attendance(instance_id).await?),
        Command::Eligible { instance_id } => emit(&service.eligible_people(instance_id).await?),
        Command::Events { start, end, event_id } => match event_id {
            Some(event_id) => emit(&directory.event_instances(&event_id).await?),
            None => {
                let start = event_start(start, Local::now().date_naive());
                emit(&directory.events(Some(start), end).await?)
            }
        },
        Command::Person {
            person_id,
            with_family,
            family,
        } => {
            if family {
                let family = directory.family(person_id).await?;
                emit(&json!({ "family": family }))
            } else if with_family {
                let person = directory.person_with_family(person_id).await?;
                emit(&json!({ "person": person }))
            } else {
                emit(&directory.person(person_id).await?)
            }
        }
        Command::Search { query } => emit(&directory.search_people(&query).await?),
        Command::Print { file } => {
            let request: PrintRequest = read_json(&file)?;
            let printed = service.print_labels(request.labels).await?;
            emit(&json!({ "success": true, "labels_printed": printed }))
        }
        Command::Printer { action } => match action {
            PrinterAction::Status => emit(&json!({
                "printer": printer.printer_name(),
                "connected": printer.is_connected().await,
            })),
            PrinterAction::List => {
                let listing = printer.list_printers().await?;
                emit(&json!({ "printers": listing }))
            }
        },
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    logging::init_tracing(Some(&args.log_level));
    logging::log_startup(Component::Cli, "checkin");

    if let Err(e) = run(args.command).await {
        logging::log_error(Component::Cli, "Command", &e);
        return Err(e);
    }

    logging::log_shutdown(Component::Cli, "command complete");
    Ok(())
}
