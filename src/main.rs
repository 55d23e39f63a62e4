mod api;
mod cli;
mod config;
mod contract;
mod error;
mod models;

use clap::Parser;
use cli::{App, Cli, Commands, LogFormat};
use colored::*;
use dialoguer::{theme::ColorfulTheme, Select};
use error::Result;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Directory for the optional rolling log file.
const ENV_LOG_DIR: &str = "BOOKS_PROBE_LOG_DIR";

/// Sets up stderr logging, plus a daily log file when `BOOKS_PROBE_LOG_DIR` is set.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(format: LogFormat) -> Option<WorkerGuard> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("books_probe=info"));

    let stderr_layer = match format {
        LogFormat::Json => fmt::layer().json().with_writer(std::io::stderr).boxed(),
        LogFormat::Text => fmt::layer().with_writer(std::io::stderr).boxed(),
    };

    let (file_layer, guard) = match std::env::var(ENV_LOG_DIR) {
        Ok(dir) if !dir.trim().is_empty() => {
            let appender = tracing_appender::rolling::daily(dir, "books-probe.log");
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer().with_ansi(false).with_writer(writer);
            (Some(layer), Some(guard))
        },
        _ => (None, None),
    };

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(file_layer)
        .with(filter)
        .init();

    guard
}

#[tokio::main]
async fn main() -> Result<()> {
    // .env may carry RUST_LOG and BOOKS_PROBE_LOG_DIR, so load it before logging starts
    dotenv::dotenv().ok();
    let cli = Cli::parse();
    let _log_guard = init_logging(cli.global.log_format);

    info!("Initializing Books API probe...");

    let app = match App::new(&cli.global) {
        Ok(app) => app,
        Err(e) => {
            error!("Failed to initialize application: {:?}", e);
            eprintln!("{} {}", "Error:".red(), e);
            return Err(e);
        },
    };

    match cli.command {
        Some(command) => {
            let result = app.run_command(command).await;
            if let Err(e) = &result {
                error!("Command failed: {}", e);
            }
            result
        },
        None => interactive(&app).await,
    }
}

/// Menu loop shown when no subcommand is given.
async fn interactive(app: &App) -> Result<()> {
    println!(
        "{} {}",
        "Books API probe for".cyan().bold(),
        app.base_url().bold()
    );

    loop {
        let options = &[
            "Run smoke checks",
            "Run authenticated lifecycle",
            "List books",
            "Register a user",
            "Log in",
            "Generate a book",
            "Exit",
        ];

        let selection = Select::with_theme(&ColorfulTheme::default())
            .with_prompt("What would you like to do?")
            .items(options)
            .default(0)
            .interact_opt()?
            .unwrap_or(options.len() - 1); // cancelled means exit

        println!("\n---\n");

        let command = match selection {
            0 => Commands::Smoke,
            1 => Commands::Lifecycle,
            2 => Commands::Books,
            3 => match cli::prompt_register() {
                Ok(args) => Commands::Register(args),
                Err(e) => {
                    println!("{} {}", "Failed to get input:".red(), e);
                    continue;
                },
            },
            4 => match cli::prompt_login() {
                Ok(args) => Commands::Login(args),
                Err(e) => {
                    println!("{} {}", "Failed to get input:".red(), e);
                    continue;
                },
            },
            5 => Commands::Generate,
            _ => {
                println!("{}", "Goodbye!".green());
                break;
            },
        };

        if let Err(e) = app.run_command(command).await {
            error!("Command execution failed: {:?}", e);
            println!("{} {}", "Error executing command:".red(), e.to_string().red());
        }

        println!("\n---\n");
    }

    Ok(())
}
