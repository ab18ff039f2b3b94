pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "freightdesk",
    about = "Freightdesk operator CLI",
    long_about = "Operate the freight brokerage backend: migrations, demo data, config inspection, \
                  readiness checks, and offline load search, offer evaluation and transcript analysis.",
    after_help = "Examples:\n  freightdesk doctor --json\n  freightdesk search --origin \"Chicago, IL\" --destination \"Atlanta, GA\" --equipment Reefer\n  freightdesk evaluate --original-rate 2500 --counter-rate 2300 --load-id LD001 --round 2"
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Replace stored call logs with the deterministic demo call set")]
    Seed,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Validate config, database connectivity, catalog and carrier readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Rank catalog loads against a requested lane")]
    Search {
        #[arg(long)]
        origin: String,
        #[arg(long)]
        destination: String,
        #[arg(long)]
        equipment: String,
        #[arg(long, help = "Requested pickup date, e.g. 2025-11-01")]
        pickup_date: Option<String>,
        #[arg(long, help = "Maximum number of loads to return")]
        limit: Option<usize>,
    },
    #[command(about = "Decide how to answer a carrier's counter-offer")]
    Evaluate {
        #[arg(long)]
        original_rate: f64,
        #[arg(long)]
        counter_rate: f64,
        #[arg(long)]
        load_id: String,
        #[arg(long, help = "Negotiation round, adds strategy and escalation guidance")]
        round: Option<i64>,
    },
    #[command(about = "Extract call data and classify a call transcript read from a file")]
    Analyze {
        #[arg(long)]
        file: PathBuf,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Seed => commands::seed::run(),
        Command::Config => {
            commands::CommandResult { exit_code: 0, output: commands::config::run() }
        }
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Search { origin, destination, equipment, pickup_date, limit } => {
            commands::search::run(commands::search::SearchArgs {
                origin,
                destination,
                equipment,
                pickup_date,
                limit,
            })
        }
        Command::Evaluate { original_rate, counter_rate, load_id, round } => {
            commands::evaluate::run(original_rate, counter_rate, &load_id, round)
        }
        Command::Analyze { file } => commands::analyze::run(&file),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
