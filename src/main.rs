//! ccroll - Roll up Claude Code usage logs from local JSONL files

use ccroll::{
    cli::{Cli, Command},
    load::UsageLoader,
    output::get_formatter,
};
use ccroll_core::aggregation_types::Totals;
use ccroll_core::error::Result;
use clap::Parser;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // RUST_LOG wins; otherwise --verbose opens up info logs for our crates
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        if cli.verbose {
            tracing_subscriber::EnvFilter::new("ccroll=info,ccroll_pricing=info,ccroll_provider_claude=info")
        } else {
            tracing_subscriber::EnvFilter::new("warn")
        }
    });

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let options = cli.load_options()?;
    info!("Using timezone: {}", options.timezone.display_name());

    let loader = UsageLoader::new(options);
    let formatter = get_formatter(cli.json);

    match cli.command {
        Command::Daily => {
            info!("Running daily usage report");
            let daily = loader.load_daily().await?;
            let totals = Totals::from_daily(&daily);
            println!("{}", formatter.format_daily(&daily, &totals));
        }
        Command::Session => {
            info!("Running session usage report");
            let sessions = loader.load_session().await?;
            let totals = Totals::from_sessions(&sessions);
            println!("{}", formatter.format_sessions(&sessions, &totals));
        }
        Command::Monthly => {
            info!("Running monthly usage report");
            let monthly = loader.load_monthly().await?;
            let totals = Totals::from_monthly(&monthly);
            println!("{}", formatter.format_monthly(&monthly, &totals));
        }
        Command::Windows { session_limit } => {
            info!("Running usage window report");
            let summaries = loader.load_windows(session_limit).await?;
            let totals = Totals::from_windows(&summaries);
            println!("{}", formatter.format_windows(&summaries, &totals));
        }
    }

    Ok(())
}
