use clap::Parser;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use frauditor::app::AppContext;
use frauditor::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let ctx = AppContext::new(cli.config.clone())?;

    match cli.command {
        Commands::Watch { url, headful } => {
            commands::watch(&ctx, &url, headful).await?;
        }
        Commands::Scan {
            url,
            pages,
            out,
            no_submit,
            headful,
        } => {
            commands::scan(&ctx, &url, pages, out.as_deref(), no_submit, headful).await?;
        }
        Commands::Check => {
            commands::check(&ctx).await?;
        }
        Commands::ConfigPath => {
            commands::config_path()?;
        }
    }

    Ok(())
}
