use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use blogger_tracker::app::AppContext;
use blogger_tracker::cli::commands::{self, RefreshOptions};
use blogger_tracker::cli::{Cli, Commands};
use blogger_tracker::config::Config;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let config = match cli.config {
        Some(ref path) => Config::load_from(path)?,
        None => Config::load()?,
    };
    let ctx = AppContext::new(config)?;

    match cli.command {
        Commands::Add { nickname, link } => {
            commands::add_blogger(&ctx, &nickname, link.as_deref())?;
        }
        Commands::Remove { id } => {
            commands::remove_blogger(&ctx, id)?;
        }
        Commands::List => {
            commands::list_bloggers(&ctx)?;
        }
        Commands::Refresh {
            ids,
            headful,
            headless,
            keep_open,
            json,
        } => {
            let options = RefreshOptions {
                ids,
                headful,
                headless,
                keep_open,
                json,
            };
            commands::refresh(&ctx, &options).await?;
        }
        Commands::History { id, days } => {
            commands::show_history(&ctx, id, days)?;
        }
    }

    Ok(())
}
