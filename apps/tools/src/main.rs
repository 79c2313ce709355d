use anyhow::Result;
use clap::{Parser, Subcommand};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Maintenance commands for the work order database")]
struct Cli {
    #[arg(long, default_value = "sqlite://./data/workorders.db")]
    database_url: String,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Insert the demo work orders if the table is empty.
    Seed,
    /// Dump every work order as JSON.
    List,
    /// Delete every work order.
    Purge {
        #[arg(long)]
        yes: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let cli = Cli::parse();
    let storage = Storage::new(&cli.database_url).await?;

    match cli.command {
        Command::Seed => {
            let inserted = storage.seed_demo_work_orders().await?;
            info!(inserted, "seeded demo work orders");
        }
        Command::List => {
            let orders = storage.list_work_orders().await?;
            println!("{}", serde_json::to_string_pretty(&orders)?);
        }
        Command::Purge { yes } => {
            if yes {
                let removed = storage.purge_work_orders().await?;
                info!(removed, "purged work orders");
            } else {
                let count = storage.count_work_orders().await?;
                println!("would delete {count} work orders; pass --yes to confirm");
            }
        }
    }

    storage.close().await;
    Ok(())
}
