//! # Seed Data Generator
//!
//! Populates a database with a small bar menu for development.
//!
//! ## Usage
//! ```bash
//! cargo run -p taproom-db --bin seed
//! cargo run -p taproom-db --bin seed -- --db ./data/taproom.db
//! ```
//!
//! ## Generated Catalog
//! - Stocked items: beers, ciders, soft drinks, wine (with EAN-style barcodes)
//! - Shots: house spirits, some with a barcode on the bottle
//! - Specials: kitchen plates

use std::env;
use taproom_db::{Database, DbConfig, NewShot, NewSpecial, NewStockedItem};

/// (name, category, price in cents, opening stock, low-stock threshold)
const ITEMS: &[(&str, &str, i64, i64, i64)] = &[
    ("Castle Lager 340ml", "Beer", 450, 48, 12),
    ("Black Label 340ml", "Beer", 450, 48, 12),
    ("Zambezi Lager 375ml", "Beer", 500, 24, 6),
    ("Hunter's Dry 330ml", "Cider", 550, 24, 6),
    ("Savanna Dry 330ml", "Cider", 600, 18, 6),
    ("Coca-Cola 300ml", "Soft Drinks", 250, 36, 10),
    ("Sprite 300ml", "Soft Drinks", 250, 36, 10),
    ("Still Water 500ml", "Soft Drinks", 200, 30, 10),
    ("House Red 750ml", "Wine", 3500, 6, 2),
    ("House White 750ml", "Wine", 3500, 6, 2),
];

/// (name, price in cents, has barcode)
const SHOTS: &[(&str, i64, bool)] = &[
    ("Tequila", 300, true),
    ("Jägermeister", 400, true),
    ("Vodka", 250, false),
    ("Whisky", 350, false),
    ("Sambuca", 300, false),
];

/// (name, price in cents)
const SPECIALS: &[(&str, i64)] = &[
    ("Chicken Wings (6)", 1250),
    ("Beef Burger & Chips", 1800),
    ("Sadza & Stew", 1500),
    ("Chips Basket", 600),
];

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args: Vec<String> = env::args().collect();

    let mut db_path = String::from("./taproom_dev.db");

    let mut i = 1;
    while i < args.len() {
        match args[i].as_str() {
            "--db" | "-d" => {
                if i + 1 < args.len() {
                    db_path = args[i + 1].clone();
                    i += 1;
                }
            }
            "--help" | "-h" => {
                println!("Taproom POS Seed Data Generator");
                println!();
                println!("Usage: seed [OPTIONS]");
                println!();
                println!("Options:");
                println!("  -d, --db <PATH>    Database file path (default: ./taproom_dev.db)");
                println!("  -h, --help         Show this help message");
                return Ok(());
            }
            _ => {}
        }
        i += 1;
    }

    println!("Taproom POS Seed Data Generator");
    println!("===============================");
    println!("Database: {}", db_path);
    println!();

    let db = Database::new(DbConfig::new(&db_path)).await?;
    let catalog = db.catalog();

    println!("✓ Connected to database");
    println!("✓ Migrations applied");

    let existing = catalog.count_items().await?;
    if existing > 0 {
        println!("⚠ Database already has {} stocked items", existing);
        println!("  Skipping seed to avoid duplicates.");
        println!("  Delete the database file to regenerate.");
        return Ok(());
    }

    for (idx, (name, category, price_cents, quantity, threshold)) in ITEMS.iter().enumerate() {
        let new = NewStockedItem {
            name: name.to_string(),
            price_cents: *price_cents,
            category: category.to_string(),
            quantity: *quantity,
            barcode: Some(format!("600{:010}", idx + 1)),
            low_stock_threshold: *threshold,
        };
        if let Err(e) = catalog.create_item(new).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }
    println!("✓ {} stocked items", ITEMS.len());

    for (idx, (name, price_cents, scannable)) in SHOTS.iter().enumerate() {
        let new = NewShot {
            name: name.to_string(),
            price_cents: *price_cents,
            barcode: scannable.then(|| format!("700{:010}", idx + 1)),
        };
        if let Err(e) = catalog.create_shot(new).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }
    println!("✓ {} shots", SHOTS.len());

    for (name, price_cents) in SPECIALS {
        let new = NewSpecial {
            name: name.to_string(),
            price_cents: *price_cents,
        };
        if let Err(e) = catalog.create_special(new).await {
            eprintln!("Failed to insert {}: {}", name, e);
        }
    }
    println!("✓ {} specials", SPECIALS.len());

    println!();
    println!("✓ Seed complete!");

    Ok(())
}
