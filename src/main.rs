use anyhow::{Context, Result};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::io;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use syncli::config::Config;
use syncli::printer::{self, OutputFormat};
use syncli::spaces::{self, EnrichError, Enricher};
use syncli::synapse::{format_synapse_error, SynapseHttpClient};
use tracing_subscriber::EnvFilter;

/// CLI for interacting with Synapse Matrix homeserver
#[derive(Parser, Debug)]
#[command(name = "syncli", version = syncli::VERSION, about, long_about = None)]
struct Args {
    /// Config file (default is $HOME/.syncli.yaml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Timeout for requests in seconds (default: 30)
    #[arg(long, global = true)]
    timeout: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Retrieve resources from the homeserver
    Get {
        #[command(subcommand)]
        resource: Resource,
    },
}

#[derive(Subcommand, Debug)]
enum Resource {
    /// Retrieve a list of public spaces with their child rooms
    Spaces(SpacesArgs),
}

#[derive(ClapArgs, Debug)]
struct SpacesArgs {
    /// Maximum number of spaces to list
    #[arg(long, default_value_t = spaces::DEFAULT_LISTING_LIMIT)]
    limit: u32,

    /// Maximum number of concurrent state requests
    #[arg(long, default_value_t = spaces::DEFAULT_CONCURRENCY_LIMIT)]
    concurrency: usize,

    /// Print CSV instead of a table
    #[arg(long)]
    csv: bool,
}

fn setup_logging(debug: bool) -> tracing_appender::non_blocking::WorkerGuard {
    let default_level = if debug { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let (non_blocking, guard) = tracing_appender::non_blocking(io::stderr());

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(non_blocking)
        .with_target(true)
        .with_thread_ids(false)
        .init();

    guard
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    let _log_guard = setup_logging(args.debug);

    let config = match Config::load(args.config.as_deref(), args.timeout) {
        Ok(config) => config,
        Err(err) => {
            tracing::error!(event = "config_validation_failed", error = %format!("{err:#}"), "Invalid configuration");
            eprintln!("Error: {err:#}");
            return ExitCode::FAILURE;
        }
    };
    tracing::debug!(?config, "Configuration resolved");

    let result = match args.command {
        Command::Get {
            resource: Resource::Spaces(spaces_args),
        } => get_spaces(&config, &spaces_args).await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("Error: {}", user_message(&err));
            ExitCode::FAILURE
        }
    }
}

async fn get_spaces(config: &Config, args: &SpacesArgs) -> Result<()> {
    let client = SynapseHttpClient::new(&config.base_url, &config.access_token, config.timeout)?;

    let enricher = Enricher::new(Arc::new(client))
        .with_concurrency_limit(args.concurrency)
        .with_span(tracing::info_span!("get_spaces", limit = args.limit));

    let spaces = match enricher.enrich(&spaces::listing_request(args.limit)).await {
        Ok(spaces) => spaces,
        Err(err) => {
            let kind = err.kind();
            let space = err.space_id().unwrap_or_default().to_string();
            let err = anyhow::Error::new(err);
            tracing::error!(
                event = "get_spaces_error",
                %kind,
                %space,
                error = %format!("{err:#}"),
                "Error occurred while getting spaces"
            );
            return Err(err);
        }
    };

    let format = if args.csv {
        OutputFormat::Csv
    } else {
        OutputFormat::Table
    };
    let stdout = io::stdout();
    printer::print(&mut stdout.lock(), &spaces, format).context("Failed to print spaces")?;

    Ok(())
}

/// Short message for the terminal; details go to the log
fn user_message(err: &anyhow::Error) -> String {
    match err.downcast_ref::<EnrichError>() {
        Some(enrich_err) => match enrich_err.transport_error() {
            Some(transport_err) => format!("{}: {}", enrich_err, format_synapse_error(transport_err)),
            None => format!("{err:#}"),
        },
        None => format!("{err:#}"),
    }
}
