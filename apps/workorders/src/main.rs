use std::{path::PathBuf, sync::Arc, time::Duration};

use anyhow::{bail, Result};
use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use client_core::{
    apply_preferences, page_count, HttpWorkOrderStore, InMemoryWorkOrderStore, PreferenceStore,
    WorkOrderController, WorkOrderStore,
};
use futures::StreamExt;
use shared::domain::{
    NewWorkOrder, WorkOrder, WorkOrderId, WorkOrderPatch, WorkOrderPriority, WorkOrderStatus,
};
use storage::Storage;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(about = "Track facility maintenance work orders")]
struct Cli {
    #[arg(long, default_value = "http://127.0.0.1:8080")]
    server_url: String,
    /// Work against an in-memory demo collection instead of a server.
    #[arg(long)]
    offline: bool,
    /// Work directly against a local SQLite database instead of a server.
    #[arg(long, conflicts_with = "offline")]
    database_url: Option<String>,
    /// Simulated latency of the first fetch in offline mode.
    #[arg(long, default_value_t = 0)]
    latency_ms: u64,
    #[arg(long)]
    preferences: Option<PathBuf>,
    /// Print JSON instead of a table.
    #[arg(long)]
    json: bool,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List work orders using the saved view preferences.
    List {
        #[arg(long, default_value_t = 1)]
        page: usize,
    },
    Show {
        id: String,
    },
    Create(CreateArgs),
    Update(UpdateArgs),
    Delete {
        id: String,
    },
    /// Dashboard counts; overdue is relative to `--today` (default: local date).
    Stats {
        #[arg(long)]
        today: Option<NaiveDate>,
    },
    /// Print mutation events pushed by the server.
    Watch,
    #[command(subcommand)]
    Prefs(PrefsCommand),
}

#[derive(Args, Debug)]
struct CreateArgs {
    title: String,
    #[arg(long, default_value = "")]
    description: String,
    #[arg(long, default_value_t = WorkOrderStatus::Pending)]
    status: WorkOrderStatus,
    #[arg(long, default_value_t = WorkOrderPriority::Medium)]
    priority: WorkOrderPriority,
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long)]
    due_date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
struct UpdateArgs {
    id: String,
    #[arg(long)]
    title: Option<String>,
    #[arg(long)]
    description: Option<String>,
    #[arg(long)]
    status: Option<WorkOrderStatus>,
    #[arg(long)]
    priority: Option<WorkOrderPriority>,
    #[arg(long)]
    assignee: Option<String>,
    #[arg(long)]
    due_date: Option<NaiveDate>,
}

#[derive(Subcommand, Debug)]
enum PrefsCommand {
    Get { key: Option<String> },
    Set { key: String, value: String },
    Reset,
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

    let preferences_path = match cli.preferences.clone() {
        Some(path) => path,
        None => PreferenceStore::default_path()?,
    };
    let mut preferences = PreferenceStore::load(preferences_path);

    let backend = Backend {
        server_url: cli.server_url,
        offline: cli.offline,
        database_url: cli.database_url,
        latency: Duration::from_millis(cli.latency_ms),
    };

    match cli.command {
        Command::Prefs(command) => run_prefs(&mut preferences, &command)?,
        Command::Watch => {
            if backend.offline || backend.database_url.is_some() {
                bail!("watch needs a server");
            }
            watch(HttpWorkOrderStore::new(backend.server_url)).await?;
        }
        Command::List { page } => {
            let controller = backend.controller().await?;
            let orders = controller.refresh().await?;
            let prefs = preferences.preferences();
            let visible = apply_preferences(&orders, prefs, page);
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&visible)?);
            } else {
                print_table(&visible);
                println!("page {} of {}", page.max(1), page_count(&orders, prefs));
            }
        }
        Command::Show { id } => {
            let id = WorkOrderId(id);
            let controller = backend.controller().await?;
            let orders = controller.refresh().await?;
            let Some(order) = orders.iter().find(|order| order.id == id) else {
                bail!("work order {id} not found");
            };
            print_order(order, cli.json)?;
        }
        Command::Create(args) => {
            let created = backend
                .controller()
                .await?
                .create(NewWorkOrder {
                    title: args.title,
                    description: args.description,
                    status: args.status,
                    priority: args.priority,
                    assignee: args.assignee,
                    due_date: args.due_date,
                })
                .await?;
            print_order(&created, cli.json)?;
        }
        Command::Update(args) => {
            let id = WorkOrderId(args.id);
            let patch = WorkOrderPatch {
                title: args.title,
                description: args.description,
                status: args.status,
                priority: args.priority,
                assignee: args.assignee,
                due_date: args.due_date,
            };
            match backend.controller().await?.update(&id, patch).await? {
                Some(updated) => print_order(&updated, cli.json)?,
                None => bail!("work order {id} not found"),
            }
        }
        Command::Delete { id } => {
            let id = WorkOrderId(id);
            if !backend.controller().await?.delete(&id).await? {
                bail!("work order {id} not found");
            }
            println!("deleted work order {id}");
        }
        Command::Stats { today } => {
            let controller = backend.controller().await?;
            controller.refresh().await?;
            let today = today.unwrap_or_else(|| Local::now().date_naive());
            let stats = controller.stats(today).await;
            if cli.json {
                println!("{}", serde_json::to_string_pretty(&stats)?);
            } else {
                println!("total:         {}", stats.total);
                println!("pending:       {}", stats.pending);
                println!("in progress:   {}", stats.in_progress);
                println!("completed:     {}", stats.completed);
                println!("high priority: {}", stats.high_priority);
                println!("overdue:       {}", stats.overdue);
            }
        }
    }

    Ok(())
}

struct Backend {
    server_url: String,
    offline: bool,
    database_url: Option<String>,
    latency: Duration,
}

impl Backend {
    async fn controller(&self) -> Result<WorkOrderController> {
        let store: Arc<dyn WorkOrderStore> = if let Some(database_url) = &self.database_url {
            info!(%database_url, "using local database");
            Arc::new(Storage::new(database_url).await?)
        } else if self.offline {
            info!(latency_ms = self.latency.as_millis() as u64, "using in-memory demo work orders");
            Arc::new(InMemoryWorkOrderStore::new().with_latency(self.latency))
        } else {
            Arc::new(HttpWorkOrderStore::new(&self.server_url))
        };
        Ok(WorkOrderController::new(store))
    }
}

fn run_prefs(store: &mut PreferenceStore, command: &PrefsCommand) -> Result<()> {
    match command {
        PrefsCommand::Get { key: None } => {
            println!("{}", serde_json::to_string_pretty(store.preferences())?);
        }
        PrefsCommand::Get { key: Some(key) } => match store.preferences().get(key) {
            Some(value) => println!("{value}"),
            None => bail!("unknown preference '{key}'"),
        },
        PrefsCommand::Set { key, value } => {
            store.set(key, value)?;
            info!(path = %store.path().display(), %key, "preference saved");
        }
        PrefsCommand::Reset => {
            store.reset()?;
            info!(path = %store.path().display(), "preferences reset");
        }
    }
    Ok(())
}

async fn watch(store: HttpWorkOrderStore) -> Result<()> {
    let mut events = store.watch_events().await?;
    while let Some(event) = events.next().await {
        println!("{}", serde_json::to_string(&event)?);
    }
    info!("event stream closed");
    Ok(())
}

fn print_order(order: &WorkOrder, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(order)?);
    } else {
        print_table(std::slice::from_ref(order));
    }
    Ok(())
}

fn print_table(orders: &[WorkOrder]) {
    println!(
        "{:<6} {:<32} {:<12} {:<8} {:<16} {:<10}",
        "ID", "TITLE", "STATUS", "PRIORITY", "ASSIGNEE", "DUE"
    );
    for order in orders {
        println!(
            "{:<6} {:<32} {:<12} {:<8} {:<16} {:<10}",
            order.id.as_str(),
            truncate(&order.title, 32),
            order.status.as_str(),
            order.priority.as_str(),
            order.assignee.as_deref().unwrap_or("-"),
            order
                .due_date
                .map(|due| due.to_string())
                .unwrap_or_else(|| "-".into()),
        );
    }
}

fn truncate(text: &str, width: usize) -> String {
    if text.chars().count() <= width {
        return text.to_string();
    }
    let mut cut: String = text.chars().take(width.saturating_sub(1)).collect();
    cut.push('~');
    cut
}
