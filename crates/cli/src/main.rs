//! `shelf` command-line entrypoint.

use anyhow::Context;
use clap::{Parser, Subcommand};
use shelf_kernel::settings::Settings;

#[derive(Debug, Parser)]
#[command(name = "shelf", version, about = "Book catalog service")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Run the HTTP server
    Serve,
    /// Apply pending database migrations and exit
    Migrate,
    /// Print the resolved configuration as JSON
    Config,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let settings = Settings::load().with_context(|| "failed to load Shelf settings")?;

    match cli.command {
        Command::Serve => {
            shelf_telemetry::init(&settings.telemetry)?;
            shelf_app::bootstrap::serve(&settings).await
        }
        Command::Migrate => {
            shelf_telemetry::init(&settings.telemetry)?;
            let applied = shelf_app::bootstrap::migrate(&settings).await?;
            tracing::info!(applied, "migrations complete");
            println!("applied {applied} migration(s)");
            Ok(())
        }
        Command::Config => {
            let rendered = serde_json::to_string_pretty(&settings)
                .context("failed to render settings")?;
            println!("{rendered}");
            Ok(())
        }
    }
}
