pub mod commands;

use std::path::PathBuf;
use std::process::ExitCode;

use changeorder_core::config::{AppConfig, LoadOptions, LogFormat};
use clap::{Parser, Subcommand};

#[derive(Debug, Parser)]
#[command(
    name = "changeorder",
    about = "Change order wizard operator CLI",
    long_about = "Inspect configuration, migrate the draft store, and replay scripted change order wizard sessions.",
    after_help = "Examples:\n  changeorder config\n  changeorder migrate\n  changeorder run --fixture fixtures/sample_fixture.json --script fixtures/sample_script.json"
)]
pub struct Cli {
    #[arg(long, global = true, help = "Explicit config file path (otherwise changeorder.toml or config/changeorder.toml)")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    #[command(about = "Inspect effective configuration values with source attribution")]
    Config,
    #[command(about = "Apply pending draft-store migrations and return structured status output")]
    Migrate,
    #[command(about = "Replay a scripted wizard session against a JSON service fixture")]
    Run(commands::run::RunArgs),
}

pub fn run() -> ExitCode {
    let cli = Cli::parse();
    let options = LoadOptions {
        require_file: cli.config.is_some(),
        config_path: cli.config,
        ..LoadOptions::default()
    };

    if let Ok(config) = AppConfig::load(options.clone()) {
        init_logging(&config);
    }

    let result = match cli.command {
        Command::Config => commands::config::run(&options),
        Command::Migrate => commands::migrate::run(&options),
        Command::Run(args) => commands::run::run(&options, &args),
    };

    println!("{}", result.output);
    ExitCode::from(result.exit_code)
}

/// Logs go to stderr so stdout carries only the command payload.
pub fn init_logging(config: &AppConfig) {
    use tracing::Level;

    let log_level = config.logging.level.parse::<Level>().unwrap_or(Level::INFO);
    let builder = tracing_subscriber::fmt()
        .with_target(false)
        .with_max_level(log_level)
        .with_writer(std::io::stderr);

    let _ = match config.logging.format {
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Json => builder.json().try_init(),
    };
}
