//! sqlsession - build, validate and scaffold session factory configurations

use anyhow::{anyhow, Context, Result};
use clap::{Args, Parser, Subcommand};
use config::{
    ConfigLoader, ConfigValidator, ValidationReport, YamlConfigParser, OVERRIDE_ENV_PREFIX,
};
use serde::Serialize;
use session::{ConfigurationSource, FactorySummary, SessionFactoryBuilder};
use std::env;
use std::path::PathBuf;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use types::utils::{mask_secret, parse_property_pair};
use types::{ErrorContext, Properties};

#[derive(Parser, Debug)]
#[command(name = "sqlsession", version, about = "Session factory configuration tool")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Build a session factory and print a summary
    Build(SourceArgs),
    /// Parse a configuration and print the validation report
    Validate(SourceArgs),
    /// Write an example configuration file
    Init {
        /// Destination path
        path: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

#[derive(Args, Debug)]
struct SourceArgs {
    /// Configuration file
    #[arg(short, long, default_value = "sqlsession.yaml")]
    config: PathBuf,
    /// Environment to select instead of default_environment
    #[arg(short, long)]
    environment: Option<String>,
    /// Property override as key=value; may be repeated
    #[arg(short = 'D', long = "property", value_parser = parse_property_pair)]
    properties: Vec<(String, String)>,
    /// YAML file with property overrides
    #[arg(long)]
    properties_file: Option<PathBuf>,
}

/// Printed by `build`
#[derive(Serialize)]
struct BuildReport {
    factory: FactorySummary,
    driver: Option<String>,
    url: Option<String>,
    username: Option<String>,
    password: Option<String>,
}

fn main() -> Result<()> {
    // Load .env file if it exists
    if let Err(e) = dotenv::dotenv() {
        if !e.to_string().contains("No such file or directory") {
            eprintln!("Could not load .env file: {}", e);
        }
    }

    init_logging()?;

    let cli = Cli::parse();
    match cli.command {
        Command::Build(args) => build(&args),
        Command::Validate(args) => validate(&args),
        Command::Init { path, force } => init(path, force),
    }
}

fn build(args: &SourceArgs) -> Result<()> {
    let overrides = load_overrides(args)?;
    let source = ConfigurationSource::from_path(&args.config)
        .with_context(|| format!("Failed to open {}", args.config.display()))?;

    let factory = SessionFactoryBuilder::new()
        .build(source, args.environment.as_deref(), Some(&overrides))
        .context("Failed to build session factory")?;

    info!(factory_id = %factory.id(), "Session factory ready");

    let data_source = factory
        .configuration()
        .environment()
        .map(|env| &env.data_source);
    let report = BuildReport {
        factory: factory.summary(),
        driver: data_source.map(|ds| ds.driver.clone()),
        url: data_source.map(|ds| ds.url.clone()),
        username: data_source.and_then(|ds| ds.username.clone()),
        password: data_source.and_then(|ds| ds.password.as_deref().map(mask_secret)),
    };

    println!("{}", serde_json::to_string_pretty(&report)?);
    Ok(())
}

fn validate(args: &SourceArgs) -> Result<()> {
    let overrides = load_overrides(args)?;
    let mut source = ConfigurationSource::from_path(&args.config)
        .with_context(|| format!("Failed to open {}", args.config.display()))?;
    let text = source.read_to_text()?;

    let report = validation_report(
        &text,
        source.description(),
        args.environment.as_deref(),
        &overrides,
    )?;
    for error in &report.errors {
        println!("error: {}", error);
    }
    for warning in &report.warnings {
        println!("warning: {}", warning);
    }
    println!("{}", report.summary());

    if report.has_errors() {
        return Err(anyhow!("{} is not a valid configuration", args.config.display()));
    }
    Ok(())
}

/// Resolve without rejecting invalid configurations, then run the validator
fn validation_report(
    text: &str,
    resource: &str,
    environment: Option<&str>,
    overrides: &Properties,
) -> Result<ValidationReport> {
    let mut ctx = ErrorContext::new();
    let config = YamlConfigParser::new()
        .resolve_str(text, resource, environment, Some(overrides), &mut ctx)
        .map_err(|e| match ctx.snapshot() {
            Some(diagnostics) => anyhow!("{}\n{}", e, diagnostics),
            None => anyhow!(e),
        })?;

    Ok(ConfigValidator::validate(&config))
}

fn init(path: PathBuf, force: bool) -> Result<()> {
    if path.exists() && !force {
        return Err(anyhow!(
            "{} already exists; pass --force to overwrite",
            path.display()
        ));
    }

    ConfigLoader::create_example(&path)?;
    info!(path = %path.display(), "Example configuration written");
    Ok(())
}

fn load_overrides(args: &SourceArgs) -> Result<Properties> {
    let overrides = ConfigLoader::load_overrides(
        args.properties_file.as_deref(),
        OVERRIDE_ENV_PREFIX,
        &args.properties,
    )?;

    if !overrides.is_empty() {
        info!(count = overrides.len(), "Property overrides loaded");
    }
    Ok(overrides)
}

/// Initialize logging based on environment variables
fn init_logging() -> Result<()> {
    let log_level = env::var("RUST_LOG").unwrap_or_else(|_| "warn".to_string());
    let log_format = env::var("LOG_FORMAT").unwrap_or_else(|_| "pretty".to_string());

    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(&log_level));

    let registry = tracing_subscriber::registry().with(env_filter);

    match log_format.as_str() {
        "json" => {
            registry
                .with(tracing_subscriber::fmt::layer().json().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize JSON logging")?;
        }
        "pretty" | _ => {
            registry
                .with(tracing_subscriber::fmt::layer().pretty().with_writer(std::io::stderr))
                .try_init()
                .context("Failed to initialize pretty logging")?;
        }
    }

    if log_level == "trace" || log_level == "debug" {
        warn!("Debug/trace logging enabled");
    }

    Ok(())
}
