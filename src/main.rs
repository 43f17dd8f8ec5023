// Module-specific lints configuration
#![allow(clippy::uninlined_format_args)]

use anyhow::{Context, Result, anyhow};
use clap::{CommandFactory, Parser, Subcommand, ValueEnum};
use clap_complete::{Shell, generate};
use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError, info, warn};
use serde_json::Value;
use std::io::Write;

use recordgate::app_config::{self, Config};
use recordgate::database::{Bindings, Database};

/// CLI Wrapper for LogLevel to implement ValueEnum
#[derive(Debug, Clone, ValueEnum)]
enum CliLogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<CliLogLevel> for app_config::LogLevel {
    fn from(cli_level: CliLogLevel) -> Self {
        match cli_level {
            CliLogLevel::Error => app_config::LogLevel::Error,
            CliLogLevel::Warn => app_config::LogLevel::Warn,
            CliLogLevel::Info => app_config::LogLevel::Info,
            CliLogLevel::Debug => app_config::LogLevel::Debug,
            CliLogLevel::Trace => app_config::LogLevel::Trace,
        }
    }
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Connect, print the engine version and apply the schema
    Check,

    /// Run a query and print the per-statement payloads as JSON
    Query {
        /// Query text, one or more statements
        #[arg(value_name = "TEXT")]
        text: String,

        /// Bind a parameter, value parsed as JSON (falls back to a plain string)
        #[arg(long = "var", value_name = "NAME=JSON", value_parser = parse_var)]
        vars: Vec<(String, Value)>,
    },

    /// Generate shell completions for recordgate
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// recordgate - resilient access to a remote record database
#[derive(Parser, Debug)]
#[command(name = "recordgate")]
#[command(version)]
#[command(about = "Resilient query client for a remote record database")]
#[command(long_about = "recordgate connects to a record/graph database engine over HTTP,
retries transient failures with a fresh connection and reports statement errors.

EXAMPLES:
    recordgate check                                      # Connect and apply the schema
    recordgate query 'SELECT * FROM group'                # Run a query
    recordgate query 'SELECT * FROM user WHERE number = $n' --var n=1
    recordgate --log-level debug check                    # Verbose connection logs
    recordgate completions bash > recordgate.bash         # Generate bash completions

CONFIGURATION:
    Configuration is stored in conf.json by default. You can specify a different
    config file with --config-path. If the config file doesn't exist, a default one
    will be created automatically. Set RECORDGATE_BUILDING=1 to disable connections.")]
struct CommandLineOptions {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path
    #[arg(short, long, global = true, default_value = "conf.json")]
    config_path: String,

    /// Override the database endpoint
    #[arg(short, long, global = true, env = "RECORDGATE_ENDPOINT")]
    endpoint: Option<String>,

    /// Set logging level
    #[arg(short, long, global = true, value_enum)]
    log_level: Option<CliLogLevel>,
}

/// Parse a `name=json` binding
fn parse_var(raw: &str) -> Result<(String, Value), String> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected NAME=VALUE, got '{}'", raw))?;

    let value = serde_json::from_str(value).unwrap_or_else(|_| Value::String(value.to_string()));
    Ok((name.to_string(), value))
}

// @struct: Custom logger implementation
struct CustomLogger {
    level: LevelFilter,
}

impl CustomLogger {
    // @creates: New logger with specified level
    fn new(level: LevelFilter) -> Self {
        CustomLogger { level }
    }

    // @initializes: Global logger
    fn init(level: LevelFilter) -> Result<(), SetLoggerError> {
        let logger = Box::new(CustomLogger::new(level));
        log::set_boxed_logger(logger)?;
        log::set_max_level(level);
        Ok(())
    }

    // @returns: Emoji and ANSI color for log level
    fn style_for_level(level: Level) -> (&'static str, &'static str) {
        match level {
            Level::Error => ("❌ ", "1;31"),
            Level::Warn => ("🚧 ", "1;33"),
            Level::Info => (" ", "1;32"),
            Level::Debug => ("🔍 ", "1;36"),
            Level::Trace => ("📋 ", "1;35"),
        }
    }
}

impl Log for CustomLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            let now = chrono::Local::now().format("%H:%M:%S.%3f");
            let (emoji, color) = Self::style_for_level(record.level());

            let mut stderr = std::io::stderr();
            let _ = writeln!(
                stderr,
                "\x1B[{}m{} {} {}\x1B[0m",
                color, now, emoji, record.args()
            );
        }
    }

    fn flush(&self) {
        let _ = std::io::stderr().flush();
    }
}

fn level_filter(level: &app_config::LogLevel) -> LevelFilter {
    match level {
        app_config::LogLevel::Error => LevelFilter::Error,
        app_config::LogLevel::Warn => LevelFilter::Warn,
        app_config::LogLevel::Info => LevelFilter::Info,
        app_config::LogLevel::Debug => LevelFilter::Debug,
        app_config::LogLevel::Trace => LevelFilter::Trace,
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize the logger with trace so the level can be lowered after loading the config
    CustomLogger::init(LevelFilter::Trace)?;
    log::set_max_level(LevelFilter::Info);

    let cli = CommandLineOptions::parse();

    if let Commands::Completions { shell } = cli.command {
        let mut cmd = CommandLineOptions::command();
        generate(shell, &mut cmd, "recordgate", &mut std::io::stdout());
        return Ok(());
    }

    let config = load_config(&cli)?;

    match cli.command {
        Commands::Check => run_check(&config).await,
        Commands::Query { text, vars } => run_query(&config, &text, vars).await,
        Commands::Completions { .. } => Ok(()),
    }
}

fn load_config(cli: &CommandLineOptions) -> Result<Config> {
    let mut config = Config::load_or_create(&cli.config_path)?;

    // Override config with CLI options if provided
    if let Some(endpoint) = &cli.endpoint {
        config.database.endpoint = endpoint.clone();
    }
    if let Some(log_level) = &cli.log_level {
        config.log_level = log_level.clone().into();
    }

    config.validate().context("Configuration validation failed")?;
    log::set_max_level(level_filter(&config.log_level));

    Ok(config)
}

async fn run_check(config: &Config) -> Result<()> {
    let database = Database::connect(config)
        .await
        .map_err(|e| anyhow!("Database check failed: {}", e))?;

    if database.is_dormant() {
        warn!("Build phase is active, no connection was attempted");
        return Ok(());
    }

    let handle = database.connections().current_handle()?;
    info!(
        "Connected to {} (generation {}), schema applied",
        config.database.endpoint,
        handle.generation()
    );

    database.shutdown().await;
    Ok(())
}

async fn run_query(config: &Config, text: &str, vars: Vec<(String, Value)>) -> Result<()> {
    let database = Database::connect(config)
        .await
        .map_err(|e| anyhow!("Failed to start database: {}", e))?;

    let bindings: Bindings = vars.into_iter().collect();
    let results = database.executor().execute(text, &bindings).await?;

    let output = serde_json::to_string_pretty(&results.into_inner())
        .context("Failed to serialize query results")?;
    println!("{}", output);

    database.shutdown().await;
    Ok(())
}
