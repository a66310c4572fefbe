use std::path::PathBuf;

use anyhow::{anyhow, bail, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use networth::browser::chrome::ChromeSession;
use networth::clock::{Clock, SystemClock};
use networth::config::Config;
use networth::ledger::CsvLedger;
use networth::notify::{CommandNotifier, Notifier};
use networth::scrape::{sites, ScrapeOrchestrator, SiteSpec};

#[derive(Parser)]
#[command(name = "networth")]
#[command(about = "Scrape account balances into a CSV net-worth ledger")]
struct Cli {
    /// Path to config file
    #[arg(short, long, default_value = "networth.toml")]
    config: PathBuf,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Log into each configured site and append one balance row
    Scrape {
        /// Ledger CSV path (overrides the config file)
        #[arg(long)]
        output: Option<PathBuf>,

        /// Operator email for failure notifications
        #[arg(long)]
        email: Option<String>,

        /// Propagate the first per-site failure instead of recording N/A
        #[arg(long)]
        debug: bool,

        /// Do nothing if the ledger already has a row from today
        #[arg(long)]
        skip_if_run_today: bool,
    },

    /// Show the resolved configuration
    Config,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = Config::load_or_default(&cli.config)?;

    match cli.command {
        Command::Scrape {
            output,
            email,
            debug,
            skip_if_run_today,
        } => scrape(config, output, email, debug, skip_if_run_today).await,
        Command::Config => {
            println!("Config file: {}", cli.config.display());
            println!("Ledger: {}", config.ledger_path.display());
            println!("Wait timeout: {}s", config.wait_timeout_secs);
            let site_ids: Vec<String> = resolve_sites(&config)?
                .into_iter()
                .map(|site| site.site_id)
                .collect();
            println!("Sites: {}", site_ids.join(", "));
            Ok(())
        }
    }
}

async fn scrape(
    config: Config,
    output: Option<PathBuf>,
    email: Option<String>,
    debug: bool,
    skip_if_run_today: bool,
) -> Result<()> {
    let ledger = CsvLedger::new(output.unwrap_or_else(|| config.ledger_path.clone()));

    if skip_if_run_today {
        let today = SystemClock.today();
        if ledger.last_run_date()? == Some(today) {
            println!("Ledger already has a row for {today}; nothing to do.");
            return Ok(());
        }
    }

    let site_list = resolve_sites(&config)?;
    let provider = config.credentials.build();

    let notifier = match (config.notify_command.as_deref(), email) {
        (Some(command), Some(address)) => Some(CommandNotifier::new(command, address)),
        (None, Some(_)) => bail!("--email requires notify_command in the config"),
        _ => None,
    };

    // The shared session is the one precondition every site needs; if it
    // cannot be established the run fails outright.
    let session = ChromeSession::launch(&config.profile_dir()?).await?;
    let page = session.open_page().await?;

    let orchestrator = ScrapeOrchestrator::new(site_list)
        .with_timeout(config.wait_timeout())
        .with_debug(debug);

    let row = orchestrator
        .run(
            &page,
            provider.as_ref(),
            &ledger,
            notifier.as_ref().map(|n| n as &dyn Notifier),
        )
        .await?;

    println!(
        "Recorded {} balances to {}",
        row.entries.len(),
        ledger.path().display()
    );
    Ok(())
}

fn resolve_sites(config: &Config) -> Result<Vec<SiteSpec>> {
    if config.sites.is_empty() {
        return Ok(sites::default_sites());
    }
    config
        .sites
        .iter()
        .map(|site_id| sites::by_id(site_id).ok_or_else(|| anyhow!("Unknown site: {site_id}")))
        .collect()
}
