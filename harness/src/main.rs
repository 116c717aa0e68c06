use clap::{Parser, Subcommand};
use harness::{run_with_config, HarnessConfig, ReportFormat};
use std::path::PathBuf;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "harness")]
#[command(about = "Smoke-test an HTTP server's GET, HEAD, POST, PUT and DELETE handling")]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
    /// TOML file with harness settings; flags below override it
    #[arg(short, long)]
    config: Option<PathBuf>,
    /// Base URL of the server under test
    #[arg(short, long)]
    base_url: Option<String>,
    /// Directory for local fixture files (removed after the run)
    #[arg(long)]
    fixture_dir: Option<PathBuf>,
    /// Directory the server serves files from
    #[arg(long)]
    served_dir: Option<PathBuf>,
    /// Per-request timeout in seconds (default: none)
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Body expected from GET /test.txt when the server serves its own copy
    #[arg(long)]
    expect_test_body: Option<String>,
    /// Also run the error-path checks
    #[arg(long)]
    extended: bool,
    /// Exit with status 1 when any check fails
    #[arg(long)]
    strict: bool,
    /// Summary format
    #[arg(long, value_enum)]
    format: Option<ReportFormat>,
    /// Enable debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Subcommand, Clone, Copy)]
enum Commands {
    /// Run the checks (the default)
    Run,
    /// List the checks in execution order
    List,
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let config = load_config(&cli)?;

    match cli.command.unwrap_or(Commands::Run) {
        Commands::Run => run(&config)?,
        Commands::List => list_checks(&config),
    }

    Ok(())
}

fn load_config(cli: &Cli) -> Result<HarnessConfig, Box<dyn std::error::Error>> {
    let mut config = match &cli.config {
        Some(path) => {
            info!("Loading config from {}", path.display());
            HarnessConfig::from_file(path)?
        }
        None => HarnessConfig::default(),
    };

    if let Some(base_url) = &cli.base_url {
        config.base_url = base_url.clone();
    }
    if let Some(dir) = &cli.fixture_dir {
        config.fixture_dir = dir.clone();
    }
    if let Some(dir) = &cli.served_dir {
        config.served_dir = dir.clone();
    }
    if cli.timeout_secs.is_some() {
        config.timeout_secs = cli.timeout_secs;
    }
    if let Some(body) = &cli.expect_test_body {
        config.expect_test_body = Some(body.clone());
    }
    if let Some(format) = cli.format {
        config.format = format;
    }
    config.extended |= cli.extended;
    config.strict |= cli.strict;

    config.validate()?;
    Ok(config)
}

fn run(config: &HarnessConfig) -> Result<(), Box<dyn std::error::Error>> {
    let echo = config.format == ReportFormat::Text;
    let summary = run_with_config(config, echo).map_err(|e| {
        error!("Run aborted: {}", e);
        e
    })?;

    println!("{}", summary.render(config.format)?);

    if config.strict && !summary.all_passed() {
        error!("{} of {} checks failed", summary.failed(), summary.total());
        std::process::exit(1);
    }

    Ok(())
}

fn list_checks(config: &HarnessConfig) {
    println!("Checks against {}:", config.base_url);
    let registry = config.registry();
    for (index, check) in registry.iter().enumerate() {
        println!("  {}. {} ({})", index + 1, check.name(), check.title());
    }
}
