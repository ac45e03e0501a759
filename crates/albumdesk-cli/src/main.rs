use anyhow::{Context, Result};
use chrono::{NaiveDate, TimeZone, Utc};
use clap::{Parser, Subcommand};
use std::sync::Arc;

use albumdesk_api_client::ApiClient;
use albumdesk_core::reducer::{FolderAssignment, StepToggle};
use albumdesk_core::view::{self, FilterField, SortKey};
use albumdesk_core::{Config, Order};
use albumdesk_sync::{Orchestrator, Poller, Snapshot};

#[derive(Parser, Debug)]
#[command(name = "albumdesk")]
#[command(about = "Staff terminal for the Albumdesk order dashboard")]
struct Cli {
    /// Output format: table or json
    #[arg(long, default_value = "table", global = true)]
    format: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List orders, with optional filtering and sorting
    Orders {
        /// Filter field: name, phone, tracking-id, description
        #[arg(long, requires = "filter")]
        filter_field: Option<String>,
        /// Filter text
        #[arg(long)]
        filter: Option<String>,
        /// Sort key: upload-date (default) or estimated-finish
        #[arg(long, default_value = "upload-date")]
        sort: String,
        /// Show archived orders instead of active ones
        #[arg(long)]
        history: bool,
    },
    /// Poll the backend and reprint the order list whenever it changes
    Watch,
    /// List workers
    Workers,
    /// List the folders assigned to one worker
    Assignments {
        user_id: String,
        /// Backfill missing checklists, as the worker dashboard does
        #[arg(long)]
        repair: bool,
    },
    /// Accept a new order: tracking id, checklists, first step, notification
    Accept {
        order_id: String,
        /// Worker per folder as INDEX=USER_ID; folders without one still get
        /// their checklist
        #[arg(long = "assign", value_name = "INDEX=USER_ID")]
        assignments: Vec<String>,
        /// Working description per folder as INDEX=TEXT
        #[arg(long = "note", value_name = "INDEX=TEXT")]
        notes: Vec<String>,
    },
    /// Flip an order to complete and prepare the pickup notification
    Complete {
        order_id: String,
        /// Complete even if checklists are unfinished
        #[arg(long)]
        force: bool,
    },
    /// Archive a completed order
    Finish { order_id: String },
    /// Delete an order entirely (destructive)
    Reject {
        order_id: String,
        /// Required confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Assign one folder to a worker
    Assign {
        order_id: String,
        folder_id: String,
        #[arg(long)]
        worker: String,
        #[arg(long, default_value = "")]
        note: String,
    },
    /// Toggle a checklist step and record the folder's current stage
    Step {
        order_id: String,
        folder_id: String,
        index: usize,
        /// Clear the step instead of marking it done
        #[arg(long)]
        undone: bool,
    },
    /// Set an order's estimated delivery date (YYYY-MM-DD)
    Estimate { order_id: String, date: String },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let config = Config::from_env()?;
    let client = ApiClient::from_config(&config)?;

    match cli.command {
        Command::Orders {
            filter_field,
            filter,
            sort,
            history,
        } => {
            let orders = client.fetch_orders().await?;
            let mut orders = if history {
                view::history_orders(&orders)
            } else {
                view::active_orders(&orders)
            };
            if let (Some(field), Some(value)) = (filter_field, filter) {
                let field: FilterField = field.parse()?;
                orders = view::filter_by(&orders, field, &value);
            }
            let key: SortKey = sort.parse()?;
            let orders = view::sort_by(&orders, key);
            print_orders(&orders, &cli.format);
        }
        Command::Watch => {
            let poller = Poller::start(Arc::new(client), config.poll_interval());
            let mut rx = poller.subscribe();
            println!("Polling every {}ms, Ctrl-C to stop", config.poll_interval_ms);
            loop {
                tokio::select! {
                    _ = tokio::signal::ctrl_c() => break,
                    changed = rx.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        let snapshot: Snapshot = rx.borrow().clone();
                        let marker = if snapshot.stale { " (stale)" } else { "" };
                        println!(
                            "-- {} orders, {} workers{} --",
                            snapshot.orders.len(),
                            snapshot.workers.len(),
                            marker
                        );
                        print_orders(&view::active_orders(&snapshot.orders), &cli.format);
                    }
                }
            }
            poller.shutdown().await;
        }
        Command::Workers => {
            let workers = client.fetch_workers().await?;
            if cli.format == "json" {
                println!(
                    "{}",
                    serde_json::to_string_pretty(&serde_json::json!(workers
                        .iter()
                        .map(|w| serde_json::json!({
                            "userId": w.user_id,
                            "name": w.full_name(),
                        }))
                        .collect::<Vec<_>>()))?
                );
            } else {
                for worker in workers {
                    println!("{}  {}", worker.user_id, worker.full_name());
                }
            }
        }
        Command::Assignments { user_id, repair } => {
            let assignments = client.fetch_assignments(&user_id).await?;
            if repair {
                let orchestrator = Orchestrator::new(client.clone());
                let backfilled = orchestrator.ensure_checklists(&assignments).await?;
                if backfilled > 0 {
                    println!("Backfilled {} checklist(s)", backfilled);
                }
            }
            for assignment in &assignments {
                println!(
                    "{}  {}  {}  {}  {}",
                    assignment.order.id,
                    assignment.folder.id,
                    assignment.order.sender.name,
                    assignment.folder.tipe,
                    assignment.folder.current_step().unwrap_or("Pending"),
                );
            }
        }
        Command::Accept {
            order_id,
            assignments,
            notes,
        } => {
            let order = find_order(&client, &order_id).await?;
            let plan = build_assignments(&order, &assignments, &notes)?;
            let orchestrator = Orchestrator::new(client);
            let outcome = orchestrator.accept(&order, plan).await?;
            println!(
                "Accepted {} with tracking id {}",
                order.id,
                outcome.tracking_id.as_deref().unwrap_or("-")
            );
            for failure in &outcome.folder_failures {
                eprintln!("folder {} failed: {}", failure.folder_id, failure.error);
            }
            if let Some(link) = outcome.notification_link {
                println!("Notify the customer: {}", link);
            }
        }
        Command::Complete { order_id, force } => {
            let order = find_order(&client, &order_id).await?;
            if !force && !order.all_folders_complete() {
                anyhow::bail!(
                    "Order {} has unfinished checklists; pass --force to complete anyway",
                    order.id
                );
            }
            let outcome = Orchestrator::new(client).complete(&order, force).await?;
            println!("Order {} complete", order.id);
            if let Some(link) = outcome.notification_link {
                println!("Notify the customer: {}", link);
            }
        }
        Command::Finish { order_id } => {
            let order = find_order(&client, &order_id).await?;
            Orchestrator::new(client).finish(&order).await?;
            println!("Order {} archived", order.id);
        }
        Command::Reject { order_id, yes } => {
            if !yes {
                anyhow::bail!("Rejecting deletes the order permanently; pass --yes to confirm");
            }
            let order = find_order(&client, &order_id).await?;
            Orchestrator::new(client).reject(&order).await?;
            println!("Order {} rejected and deleted", order.id);
        }
        Command::Assign {
            order_id,
            folder_id,
            worker,
            note,
        } => {
            let order = find_order(&client, &order_id).await?;
            Orchestrator::new(client)
                .assign_folder(&order, &folder_id, &worker, &note)
                .await?;
            println!("Folder {} assigned to {}", folder_id, worker);
        }
        Command::Step {
            order_id,
            folder_id,
            index,
            undone,
        } => {
            let order = find_order(&client, &order_id).await?;
            let toggles = vec![StepToggle {
                index,
                done: !undone,
            }];
            Orchestrator::new(client)
                .confirm_steps(&order, &folder_id, toggles, None)
                .await?;
            println!(
                "Step {} of folder {} marked {}",
                index,
                folder_id,
                if undone { "undone" } else { "done" }
            );
        }
        Command::Estimate { order_id, date } => {
            let date = date
                .parse::<NaiveDate>()
                .context("Date must be YYYY-MM-DD")?;
            let midnight = date
                .and_hms_opt(0, 0, 0)
                .context("Could not build a timestamp from the date")?;
            let estimated = Utc.from_utc_datetime(&midnight);
            client.set_estimated_finish(&order_id, estimated).await?;
            println!("Order {} estimated finish set to {}", order_id, date);
        }
    }

    Ok(())
}

async fn find_order(client: &ApiClient, order_id: &str) -> Result<Order> {
    let orders = client.fetch_orders().await?;
    orders
        .into_iter()
        .find(|o| o.id == order_id || o.tracking_id.as_deref() == Some(order_id))
        .with_context(|| format!("No order with id or tracking id '{}'", order_id))
}

/// Parse repeated `INDEX=VALUE` flags into per-folder accept assignments.
fn build_assignments(
    order: &Order,
    workers: &[String],
    notes: &[String],
) -> Result<Vec<FolderAssignment>> {
    let mut plan = vec![FolderAssignment::default(); order.folders.len()];

    for raw in workers {
        let (index, user_id) = split_indexed(raw)?;
        let slot = plan
            .get_mut(index)
            .with_context(|| format!("Order has no folder index {}", index))?;
        slot.assignee_id = Some(user_id.to_string());
    }
    for raw in notes {
        let (index, text) = split_indexed(raw)?;
        let slot = plan
            .get_mut(index)
            .with_context(|| format!("Order has no folder index {}", index))?;
        slot.working_description = text.to_string();
    }

    Ok(plan)
}

fn split_indexed(raw: &str) -> Result<(usize, &str)> {
    let (index, value) = raw
        .split_once('=')
        .with_context(|| format!("Expected INDEX=VALUE, got '{}'", raw))?;
    let index = index
        .parse::<usize>()
        .with_context(|| format!("Invalid folder index '{}'", index))?;
    Ok((index, value))
}

fn print_orders(orders: &[Order], format: &str) {
    if format == "json" {
        let rows: Vec<_> = orders
            .iter()
            .map(|order| {
                serde_json::json!({
                    "id": order.id,
                    "trackingId": order.tracking_id.as_deref().unwrap_or("pending"),
                    "sender": order.sender.name,
                    "whatsapp": order.sender.whatsapp,
                    "status": order.status.to_string(),
                    "folders": order.folders.len(),
                    "uploadDate": order.upload_date.to_rfc3339(),
                    "estimatedFinish": order.estimated_finish.map(|d| d.to_rfc3339()),
                })
            })
            .collect();
        match serde_json::to_string_pretty(&rows) {
            Ok(json) => println!("{}", json),
            Err(e) => eprintln!("Failed to render JSON: {}", e),
        }
        return;
    }

    for order in orders {
        let tracking = order.tracking_id.as_deref().unwrap_or("pending");
        let estimate = order
            .estimated_finish
            .map(|d| d.format("%d-%b-%Y").to_string())
            .unwrap_or_else(|| "-".to_string());
        println!(
            "{}  {}  {}  {}  {} folder(s)  est {}",
            order.id,
            tracking,
            order.status,
            order.sender.name,
            order.folders.len(),
            estimate
        );
        for folder in &order.folders {
            println!(
                "    {}  {}-{}  {}  {}",
                folder.id,
                folder.tipe,
                folder.ukuran,
                folder.current_step().unwrap_or("Pending"),
                folder.assignee_name.as_deref().unwrap_or("Belum"),
            );
        }
    }
}
