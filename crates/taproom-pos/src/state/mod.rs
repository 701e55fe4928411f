//! # State Module
//!
//! Shared state owned by `PosService`.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    State Architecture                                   │
//! │                                                                         │
//! │  ┌──────────────┐  ┌──────────────────┐  ┌──────────────────────────┐  │
//! │  │   Database   │  │   CartSessions   │  │      CatalogState        │  │
//! │  │              │  │                  │  │                          │  │
//! │  │  SQLite pool │  │  Arc<Mutex<      │  │  Arc<RwLock<Catalog>>    │  │
//! │  │  ChangeFeed  │  │   HashMap<id,    │  │  reloaded from the       │  │
//! │  │              │  │     Cart>>>      │  │  change feed             │  │
//! │  └──────────────┘  └──────────────────┘  └──────────────────────────┘  │
//! │                                                                         │
//! │  THREAD SAFETY:                                                        │
//! │  • Database: internal connection pool (thread-safe)                    │
//! │  • CartSessions: one Mutex, never held across a database call          │
//! │  • CatalogState: many readers, one refresh writer                      │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod catalog;

pub use cart::CartSessions;
pub use catalog::CatalogState;
