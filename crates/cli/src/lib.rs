pub mod commands;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

#[derive(Debug, Parser)]
#[command(
    name = "happytaps",
    about = "HappyTaps operator CLI",
    long_about = "Inspect configuration, check readiness, apply migrations, and run one-off finds.",
    after_help = "Examples:\n  happytaps doctor --json\n  happytaps config\n  happytaps find \"Austin, TX\""
)]
pub struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(
        about = "Inspect effective configuration values with source attribution and redaction"
    )]
    Config,
    #[command(about = "Check config, directory client, database and cache inventory readiness")]
    Doctor {
        #[arg(long, help = "Emit machine-readable JSON output")]
        json: bool,
    },
    #[command(about = "Resolve one suggestion through the cache and directory, print the payload")]
    Find {
        #[arg(help = "Location to search; the configured default is used when omitted")]
        location: Option<String>,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(),
        Command::Config => commands::config::run(),
        Command::Doctor { json } => commands::doctor::run(json),
        Command::Find { location } => commands::find::run(location.as_deref()),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
