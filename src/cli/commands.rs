use super::report;
use crate::api::BooksClient;
use crate::config::{Config, Overrides};
use crate::contract::{ensure_success, run_lifecycle, run_suite, smoke_suite, SuiteReport};
use crate::error::{AppError, Result};
use crate::models::{LoginPayload, RegisterPayload};
use clap::{Args, Parser, Subcommand, ValueEnum};
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;
use tracing::{error, info};

/// CLI tool for probing the HTTP contract of a Books API backend
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    /// Command to run; omit for the interactive menu
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Backend base URL (overrides BACKEND_URL, default http://localhost:3000)
    #[arg(long, global = true)]
    pub base_url: Option<String>,

    /// Bearer token for guarded routes (overrides BOOKS_API_TOKEN)
    #[arg(long, global = true)]
    pub token: Option<String>,

    /// Request timeout in seconds (overrides BOOKS_PROBE_TIMEOUT_SECS)
    #[arg(long, global = true)]
    pub timeout: Option<u64>,

    /// Wait up to this many seconds for the backend to answer before running
    #[arg(long, global = true)]
    pub wait: Option<u64>,

    /// How to print results
    #[arg(long, value_enum, default_value_t = OutputFormat::Table, global = true)]
    pub format: OutputFormat,

    /// How to format log lines on stderr
    #[arg(long, value_enum, default_value_t = LogFormat::Text, global = true)]
    pub log_format: LogFormat,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputFormat {
    Table,
    Json,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Check GET /, GET /books and GET /test against the expected contract
    Smoke,

    /// Create, read, update and delete a throwaway book with authentication
    Lifecycle,

    /// List all books
    Books,

    /// Register a new user and print the issued token
    Register(RegisterArgs),

    /// Log in and print the issued token
    Login(LoginArgs),

    /// Ask the backend to invent a book
    Generate,
}

#[derive(Args, Debug, Clone)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: String,

    #[arg(short, long)]
    pub email: String,

    #[arg(short, long)]
    pub password: String,
}

#[derive(Args, Debug, Clone)]
pub struct LoginArgs {
    #[arg(short, long)]
    pub email: String,

    #[arg(short, long)]
    pub password: String,
}

/// CLI application
pub struct App {
    config: Config,
    client: BooksClient,
    format: OutputFormat,
    wait: Option<Duration>,
}

impl App {
    /// Create a new CLI application from the parsed global flags
    pub fn new(global: &GlobalArgs) -> Result<Self> {
        let overrides = Overrides {
            base_url: global.base_url.clone(),
            token: global.token.clone(),
            timeout_secs: global.timeout,
        };
        let config = Config::load(&overrides)?;
        Self::from_config(config, global.format, global.wait.map(Duration::from_secs))
    }

    pub fn from_config(config: Config, format: OutputFormat, wait: Option<Duration>) -> Result<Self> {
        let client = BooksClient::new(&config)?;
        info!("Probing backend at {}", config.base_url);
        Ok(Self {
            config,
            client,
            format,
            wait,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Run a single command
    pub async fn run_command(&self, command: Commands) -> Result<()> {
        if let Some(deadline) = self.wait {
            self.wait_for_backend(deadline).await?;
        }

        match command {
            Commands::Smoke => self.smoke().await,
            Commands::Lifecycle => self.lifecycle().await,
            Commands::Books => self.list_books().await,
            Commands::Register(args) => self.register(args).await,
            Commands::Login(args) => self.login(args).await,
            Commands::Generate => self.generate().await,
        }
    }

    async fn wait_for_backend(&self, deadline: Duration) -> Result<()> {
        let spinner = self.spinner(format!("Waiting for {}", self.config.base_url))?;
        let result = self.client.wait_until_ready(deadline).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }
        result
    }

    fn spinner(&self, message: String) -> Result<Option<ProgressBar>> {
        if self.format == OutputFormat::Json {
            return Ok(None);
        }
        let spinner = ProgressBar::new_spinner();
        spinner.set_style(ProgressStyle::with_template("{spinner:.cyan} {msg}")?);
        spinner.set_message(message);
        spinner.enable_steady_tick(Duration::from_millis(100));
        Ok(Some(spinner))
    }

    /// Run the smoke suite and fail when any check does not hold
    async fn smoke(&self) -> Result<()> {
        let checks = smoke_suite();
        let spinner = self.spinner(format!("Running {} checks", checks.len()))?;

        let report = run_suite(&self.client, &checks, |outcome| {
            if let Some(spinner) = &spinner {
                spinner.set_message(format!("Checked {}", outcome.check.name));
            }
        })
        .await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        self.print_suite(&report)?;
        suite_result(&report)
    }

    fn print_suite(&self, report: &SuiteReport) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", report::to_json(report)?),
            OutputFormat::Table => {
                println!("{}", report::suite_table(report));
                println!("{}", report::suite_summary(report));
            },
        }
        Ok(())
    }

    async fn lifecycle(&self) -> Result<()> {
        let spinner = self.spinner("Walking the book lifecycle".to_string())?;
        let report = run_lifecycle(&self.client, &self.config).await;
        if let Some(spinner) = spinner {
            spinner.finish_and_clear();
        }

        match self.format {
            OutputFormat::Json => println!("{}", report::to_json(&report)?),
            OutputFormat::Table => {
                println!("{}", report::lifecycle_table(&report));
                if report.is_success() {
                    println!("{}", "Lifecycle completed".green().bold());
                } else {
                    println!("{}", "Lifecycle failed".red().bold());
                }
            },
        }
        ensure_success(&report)
    }

    async fn list_books(&self) -> Result<()> {
        let books = self.client.list_books().await?;
        info!("Fetched {} books", books.len());
        match self.format {
            OutputFormat::Json => println!("{}", report::to_json(&books)?),
            OutputFormat::Table => {
                if books.is_empty() {
                    println!("{}", "No books stored yet.".yellow());
                } else {
                    println!("{}", report::books_table(&books));
                }
            },
        }
        Ok(())
    }

    async fn register(&self, args: RegisterArgs) -> Result<()> {
        validate_credentials(&args.email, &args.password)?;
        if args.username.trim().is_empty() {
            return Err(AppError::Cli("username must not be empty".to_string()));
        }
        let auth = self
            .client
            .register(&RegisterPayload {
                username: args.username,
                email: args.email,
                password: args.password,
            })
            .await?;
        self.print_auth(&auth)
    }

    async fn login(&self, args: LoginArgs) -> Result<()> {
        validate_credentials(&args.email, &args.password)?;
        let auth = self
            .client
            .login(&LoginPayload {
                email: args.email,
                password: args.password,
            })
            .await
            .map_err(|e| {
                error!("Login failed: {}", e);
                e
            })?;
        self.print_auth(&auth)
    }

    fn print_auth(&self, auth: &crate::models::AuthResponse) -> Result<()> {
        match self.format {
            OutputFormat::Json => println!("{}", report::to_json(auth)?),
            OutputFormat::Table => {
                println!(
                    "{} {} <{}>",
                    "Authenticated as".green(),
                    auth.user.username.bold(),
                    auth.user.email
                );
                println!("Token: {}", auth.token);
                println!(
                    "{}",
                    "Export it as BOOKS_API_TOKEN to reach guarded routes.".dimmed()
                );
            },
        }
        Ok(())
    }

    async fn generate(&self) -> Result<()> {
        let generated = self.client.generate_book().await?;
        match self.format {
            OutputFormat::Json => println!("{}", report::to_json(&generated)?),
            OutputFormat::Table => {
                println!("{} by {}", generated.book.bold(), generated.author)
            },
        }
        Ok(())
    }
}

/// Converts a finished suite into the process result.
pub fn suite_result(report: &SuiteReport) -> Result<()> {
    if report.is_success() {
        Ok(())
    } else {
        Err(AppError::Contract {
            failed: report.failed(),
            total: report.outcomes.len(),
        })
    }
}

/// Rejects blank fields; the email format is left to the backend.
fn validate_credentials(email: &str, password: &str) -> Result<()> {
    if email.trim().is_empty() {
        return Err(AppError::Cli("email must not be empty".to_string()));
    }
    if password.is_empty() {
        return Err(AppError::Cli("password must not be empty".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::Server;

    fn app_for(url: &str) -> App {
        App::from_config(Config::new(url).unwrap(), OutputFormat::Json, None).unwrap()
    }

    #[test]
    fn parses_subcommand_with_global_flags() {
        let cli = Cli::try_parse_from([
            "books-probe",
            "smoke",
            "--base-url",
            "http://127.0.0.1:4000",
            "--format",
            "json",
        ])
        .unwrap();
        assert!(matches!(cli.command, Some(Commands::Smoke)));
        assert_eq!(cli.global.base_url.as_deref(), Some("http://127.0.0.1:4000"));
        assert_eq!(cli.global.format, OutputFormat::Json);
        assert_eq!(cli.global.log_format, LogFormat::Text);
    }

    #[test]
    fn no_subcommand_means_interactive() {
        let cli = Cli::try_parse_from(["books-probe"]).unwrap();
        assert!(cli.command.is_none());
        assert_eq!(cli.global.format, OutputFormat::Table);
    }

    #[test]
    fn login_requires_email_and_password() {
        assert!(Cli::try_parse_from(["books-probe", "login", "--email", "a@b.c"]).is_err());
        let cli = Cli::try_parse_from(["books-probe", "login", "-e", "a@b.c", "-p", "pw"]).unwrap();
        match cli.command {
            Some(Commands::Login(args)) => assert_eq!(args.email, "a@b.c"),
            other => panic!("expected login, got {:?}", other),
        }
    }

    #[test]
    fn credentials_are_validated_before_any_request() {
        assert!(matches!(validate_credentials("  ", "pw"), Err(AppError::Cli(_))));
        assert!(matches!(validate_credentials("a@b.c", ""), Err(AppError::Cli(_))));
        assert!(validate_credentials("a@b.c", "pw").is_ok());
        // the backend accepts any string as an email
        assert!(validate_credentials("nope", "pw").is_ok());
    }

    #[tokio::test]
    async fn smoke_command_fails_on_contract_violation() {
        let mut server = Server::new_async().await;
        let _root = server
            .mock("GET", "/")
            .with_status(200)
            .with_body("Works")
            .create_async()
            .await;
        let _books = server
            .mock("GET", "/books")
            .with_status(401)
            .create_async()
            .await;
        let _test = server
            .mock("GET", "/test")
            .with_status(200)
            .with_body("works")
            .create_async()
            .await;

        let result = app_for(&server.url()).run_command(Commands::Smoke).await;

        match result {
            Err(AppError::Contract { failed, total }) => {
                assert_eq!(failed, 1);
                assert_eq!(total, 3);
            },
            other => panic!("expected a contract error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn register_command_rejects_blank_username() {
        let app = app_for("http://127.0.0.1:9");
        let result = app
            .run_command(Commands::Register(RegisterArgs {
                username: "  ".to_string(),
                email: "a@b.c".to_string(),
                password: "pw".to_string(),
            }))
            .await;
        assert!(matches!(result, Err(AppError::Cli(_))));
    }

    #[tokio::test]
    async fn books_command_lists_json() {
        let mut server = Server::new_async().await;
        let m = server
            .mock("GET", "/books")
            .with_status(200)
            .with_body("[]")
            .create_async()
            .await;

        app_for(&server.url()).run_command(Commands::Books).await.unwrap();
        m.assert_async().await;
    }

    #[tokio::test]
    async fn wait_flag_fails_fast_on_dead_backend() {
        let app = App::from_config(
            Config::new("http://127.0.0.1:9").unwrap(),
            OutputFormat::Json,
            Some(Duration::from_millis(300)),
        )
        .unwrap();

        let result = app.run_command(Commands::Smoke).await;

        assert!(matches!(result, Err(AppError::NotReady(_))));
    }
}
