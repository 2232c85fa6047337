//! Regscout binary entry point.

use clap::{Parser, Subcommand};
use regscout::cli::scrape_cmd::{self, Mode, ScrapeOpts, SessionStrategy};
use regscout::cli::{doctor, session_cmd};
use regscout::config;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "regscout",
    version,
    about = "Scrape the demo business registry through its session-gated search API"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Suppress non-essential terminal output.
    #[arg(long, global = true)]
    quiet: bool,

    /// Enable debug logging.
    #[arg(long, global = true)]
    verbose: bool,

    /// Emit machine-readable JSON on stdout.
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Scrape all results for a query into a JSON file.
    Scrape {
        query: String,

        /// Output file path.
        #[arg(long, default_value = "output.json")]
        output: PathBuf,

        /// Scrape via the JSON API or the rendered HTML table.
        #[arg(long, value_enum, default_value_t = Mode::Api)]
        mode: Mode,

        #[arg(long, default_value = config::DEFAULT_BASE_URL)]
        base_url: String,

        /// Stop after this many API pages.
        #[arg(long)]
        max_pages: Option<u32>,

        /// How to obtain the x-search-session value.
        #[arg(long, value_enum, default_value_t = SessionStrategy::Browser)]
        session_strategy: SessionStrategy,

        /// Ignore any cached session and capture a new one.
        #[arg(long)]
        fresh_session: bool,

        /// Run the capture browser headless (only works without a captcha).
        #[arg(long)]
        headless: bool,

        /// Seconds to wait for the interactive capture.
        #[arg(long, default_value_t = config::DEFAULT_CAPTURE_TIMEOUT_SECS)]
        capture_timeout: u64,
    },

    /// Manage the cached x-search-session.
    Session {
        #[command(subcommand)]
        command: SessionCommands,
    },

    /// Check that the environment is ready to scrape.
    Doctor {
        #[arg(long, default_value = config::DEFAULT_BASE_URL)]
        base_url: String,
    },
}

#[derive(Subcommand)]
enum SessionCommands {
    /// Open a browser and capture a fresh session.
    Capture {
        #[arg(long, default_value = config::DEFAULT_BASE_URL)]
        base_url: String,

        /// Run the capture browser headless (only works without a captcha).
        #[arg(long)]
        headless: bool,

        /// Seconds to wait for the interactive capture.
        #[arg(long, default_value_t = config::DEFAULT_CAPTURE_TIMEOUT_SECS)]
        timeout: u64,
    },
    /// Show the cached session.
    Show,
    /// Remove the cached session.
    Clear,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Mirror global flags into env vars the output module reads.
    if cli.quiet {
        std::env::set_var("REGSCOUT_QUIET", "1");
    }
    if cli.verbose {
        std::env::set_var("REGSCOUT_VERBOSE", "1");
    }
    if cli.json {
        std::env::set_var("REGSCOUT_JSON", "1");
    }

    let default_filter = if cli.verbose {
        "regscout=debug"
    } else {
        "regscout=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_filter)),
        )
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    match cli.command {
        Commands::Scrape {
            query,
            output,
            mode,
            base_url,
            max_pages,
            session_strategy,
            fresh_session,
            headless,
            capture_timeout,
        } => {
            scrape_cmd::run(ScrapeOpts {
                query,
                output,
                mode,
                base_url,
                max_pages,
                strategy: session_strategy,
                fresh_session,
                headless,
                capture_timeout,
            })
            .await
        }
        Commands::Session { command } => match command {
            SessionCommands::Capture {
                base_url,
                headless,
                timeout,
            } => session_cmd::capture(base_url, headless, timeout).await,
            SessionCommands::Show => session_cmd::show(),
            SessionCommands::Clear => session_cmd::clear(),
        },
        Commands::Doctor { base_url } => doctor::run(&base_url).await,
    }
}
