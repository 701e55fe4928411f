//! # taproom-db: Database Layer for Taproom POS
//!
//! SQLite storage for the catalogs and orders, the transactional settlement
//! writes, and the change feed the read model listens to.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taproom POS Data Flow                            │
//! │                                                                         │
//! │  PosService::complete_payment                                          │
//! │       │  PaymentCommit (taproom-core)                                  │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                    taproom-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌────────────────┐    ┌──────────────┐  │   │
//! │  │   │   Database    │    │  Repositories  │    │  Migrations  │  │   │
//! │  │   │   (pool.rs)   │◄───│  catalog.rs    │    │  (embedded)  │  │   │
//! │  │   │  SqlitePool   │    │  order.rs      │    │ 001_init.sql │  │   │
//! │  │   └───────────────┘    └───────┬────────┘    └──────────────┘  │   │
//! │  │                                │ after COMMIT                   │   │
//! │  │                        ┌───────▼────────┐                       │   │
//! │  │                        │   ChangeFeed   │──► subscribers        │   │
//! │  │                        └────────────────┘                       │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Usage
//!
//! ```rust,ignore
//! use taproom_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("taproom.db")).await?;
//! let low = db.catalog().low_stock_items().await?;
//! let order = db.orders().complete_payment(&commit).await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod error;
pub mod feed;
pub mod migrations;
pub mod pool;
pub mod repository;

// =============================================================================
// Re-exports
// =============================================================================

pub use error::{DbError, DbResult};
pub use feed::{ChangeFeed, Collection};
pub use pool::{Database, DbConfig, Storage};

pub use repository::catalog::{CatalogRepository, NewShot, NewSpecial, NewStockedItem};
pub use repository::order::{OrderRepository, TabScope};
