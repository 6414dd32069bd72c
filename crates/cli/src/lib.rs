pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use orderbot_core::config::LoadOptions;

#[derive(Debug, Parser)]
#[command(
    name = "orderbot",
    about = "Orderbot operator CLI",
    long_about = "Apply migrations, load the menu, inspect configuration, and move orders through delivery.",
    after_help = "Examples:\n  orderbot migrate\n  orderbot seed\n  orderbot set-status --order-id 41 --status delivered"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Path to an orderbot.toml file")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Apply pending database migrations and return structured status output")]
    Migrate,
    #[command(about = "Load the restaurant menu into food_items (idempotent)")]
    Seed,
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Update the delivery status of a placed order")]
    SetStatus {
        #[arg(long, help = "Order id from the confirmation message")]
        order_id: i64,
        #[arg(long, help = "in_progress | out_for_delivery | delivered | cancelled")]
        status: String,
    },
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    let result = match cli.command {
        Command::Migrate => commands::migrate::run(options),
        Command::Seed => commands::seed::run(options),
        Command::Config => commands::config::run(options),
        Command::SetStatus { order_id, status } => {
            commands::set_status::run(options, order_id, &status)
        }
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}
