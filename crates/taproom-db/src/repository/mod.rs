//! # Repository Module
//!
//! Database repository implementations for Taproom POS.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  db.catalog()                          db.orders()                      │
//! │  ├── list_items / list_shots / ...     ├── save_tab(commit)             │
//! │  ├── get_item (live stock)             ├── complete_payment(commit)     │
//! │  ├── create_* / update_* / delete_*    ├── delete_tab(id)               │
//! │  ├── restock(id, delta)                ├── list_open_tabs(scope)        │
//! │  └── low_stock_items()                 └── get_order / get_lines        │
//! │                │                                    │                   │
//! │                └──────────► ChangeFeed ◄────────────┘                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Available Repositories
//!
//! - [`CatalogRepository`](catalog::CatalogRepository) - Three product catalogs
//! - [`OrderRepository`](order::OrderRepository) - Tabs and settlement

pub mod catalog;
pub mod order;
