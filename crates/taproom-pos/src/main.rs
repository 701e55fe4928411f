//! # Taproom POS Command Line
//!
//! Back-office commands against the local database.
//!
//! ## Usage
//! ```bash
//! taproom menu
//! taproom tabs --staff staff-grace
//! taproom tabs --all
//! taproom low-stock
//! taproom --config ./taproom.toml low-stock
//! ```

use std::env;
use std::path::PathBuf;

use tracing::info;

use taproom_core::money::Money;
use taproom_db::{Database, DbConfig, TabScope};
use taproom_pos::{init_tracing, PosConfig, PosService};

fn print_help() {
    println!("Taproom POS");
    println!();
    println!("Usage: taproom [OPTIONS] <COMMAND>");
    println!();
    println!("Commands:");
    println!("  menu                 List stocked items, shots and specials");
    println!("  tabs [--staff <ID>]  List open tabs (all tabs unless a staff ID is given)");
    println!("  low-stock            Print the low-stock report");
    println!();
    println!("Options:");
    println!("  -c, --config <PATH>  Config file (default: platform config dir)");
    println!("  -h, --help           Show this help message");
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let args: Vec<String> = env::args().collect();

    let mut config_path: Option<PathBuf> = None;
    let mut command: Option<String> = None;
    let mut staff_id: Option<String> = None;

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--config" | "-c" => {
                if i + 1 < args.len() {
                    config_path = Some(PathBuf::from(&args[i + 1]));
                    i += 1;
                }
            }
            "--staff" | "-s" => {
                if i + 1 < args.len() {
                    staff_id = Some(args[i + 1].clone());
                    i += 1;
                }
            }
            "--all" => staff_id = None,
            "--help" | "-h" => {
                print_help();
                return Ok(());
            }
            other if command.is_none() => command = Some(other.to_string()),
            _ => {}
        }
        i += 1;
    }

    let Some(command) = command else {
        print_help();
        return Ok(());
    };

    let config = PosConfig::load(config_path)?;
    let db_path = config.database_path()?;
    info!(?db_path, "Database path determined");

    let db = Database::new(
        DbConfig::new(db_path).max_connections(config.database.max_connections),
    )
    .await?;
    let service = PosService::new(db, config).await?;
    let prefix = service.config().receipt.currency_prefix.clone();
    let price = |cents: i64| Money::from_cents(cents).format_with_prefix(&prefix);

    match command.as_str() {
        "menu" => {
            let catalog = service.catalog().snapshot().await;

            println!("Stocked items:");
            for item in catalog.items() {
                println!(
                    "  {:<28} {:>10}  qty {:>4}  {}",
                    item.name,
                    price(item.price_cents),
                    item.quantity,
                    item.barcode.as_deref().unwrap_or("-")
                );
            }
            println!();
            println!("Shots:");
            for shot in catalog.shots() {
                println!("  {:<28} {:>10}", shot.name, price(shot.price_cents));
            }
            println!();
            println!("Specials:");
            for special in catalog.specials() {
                println!("  {:<28} {:>10}", special.name, price(special.price_cents));
            }
        }
        "tabs" => {
            let scope = match &staff_id {
                Some(id) => TabScope::Staff(id),
                None => TabScope::All,
            };
            let tabs = service.database().orders().list_open_tabs(scope).await?;

            if tabs.is_empty() {
                println!("No open tabs.");
            }
            for tab in &tabs {
                println!(
                    "  {:<20} {:>10}  {} lines  {}  ({})",
                    tab.order.name,
                    price(tab.order.total_cents),
                    tab.lines.len(),
                    tab.order.staff_id,
                    tab.order.updated_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        "low-stock" => {
            print!("{}", service.low_stock_report().await?);
        }
        other => {
            eprintln!("Unknown command: {other}");
            print_help();
            std::process::exit(2);
        }
    }

    service.database().close().await;
    Ok(())
}
