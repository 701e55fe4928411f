//! # taproom-pos: Service Layer for Taproom POS
//!
//! Wires configuration, the SQLite store, and the pure business rules into
//! one [`PosService`] that a front end (or the `taproom` binary) drives.
//!
//! ## Module Organization
//! ```text
//! taproom_pos/
//! ├── lib.rs          ◄─── You are here (exports, tracing setup)
//! ├── config.rs       ◄─── PosConfig: defaults < taproom.toml < TAPROOM_*
//! ├── error.rs        ◄─── ApiError / ErrorCode returned by every operation
//! ├── state/
//! │   ├── cart.rs     ◄─── CartSessions: open carts keyed by cart ID
//! │   └── catalog.rs  ◄─── CatalogState: read model refreshed from the feed
//! └── service/
//!     ├── mod.rs      ◄─── PosService, product lookup, low stock
//!     ├── cart.rs     ◄─── CartOp, mutate_cart, price_cart
//!     ├── order.rs    ◄─── save_tab, complete_payment, tabs
//!     ├── scan.rs     ◄─── scanner input
//!     ├── receipt.rs  ◄─── receipt sinks
//!     └── report.rs   ◄─── low-stock report
//! ```
//!
//! ## Multiple State Types
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  ┌──────────────────┐ ┌──────────────────┐ ┌──────────────────────┐    │
//! │  │    Database      │ │   CartSessions   │ │    CatalogState      │    │
//! │  │                  │ │                  │ │                      │    │
//! │  │  • Pool          │ │  • Draft carts   │ │  • Items/shots/      │    │
//! │  │  • Change feed   │ │  • Owner checks  │ │    specials snapshot │    │
//! │  └──────────────────┘ └──────────────────┘ └──────────────────────┘    │
//! │                                                                         │
//! │  Live stock for cart ceilings is always read from the Database,        │
//! │  never from the snapshot.                                               │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod service;
pub mod state;

pub use config::{ConfigError, PosConfig};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use service::{
    render_low_stock_report, CartOp, LogReceiptSink, MemoryReceiptSink, PosService,
    ReceiptError, ReceiptSink, ScanStation,
};
pub use state::{CartSessions, CatalogState};

use tracing::Level;
use tracing_subscriber::EnvFilter;

/// Initializes the tracing subscriber for structured logging.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=taproom=trace` - Trace the taproom crates only
/// - Default: INFO, DEBUG for taproom, WARN for sqlx
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,taproom=debug,sqlx=warn"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_max_level(Level::TRACE)
        .init();
}
