//! # Store Handle
//!
//! Opens the SQLite store and hands out repositories that share one pool
//! and one change feed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  DbConfig::new(path) / DbConfig::in_memory()                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  Database::new(config).await ── pool + migrations                       │
//! │       │                                                                 │
//! │       ├──► catalog()  → CatalogRepository ─┐                            │
//! │       ├──► orders()   → OrderRepository  ──┼──► ChangeFeed              │
//! │       └──► subscribe() ◄───────────────────┘    (after each commit)     │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Storage
//! A file store runs in WAL mode so catalog reloads never wait on a
//! settlement in progress. Writers queue behind each other for up to
//! `busy_timeout` instead of failing with `SQLITE_BUSY`.
//!
//! The in-memory store lives inside its single connection, so that
//! connection is never recycled.

use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::SqlitePool;
use std::path::PathBuf;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info};

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection, DEFAULT_FEED_CAPACITY};
use crate::migrations;
use crate::repository::catalog::CatalogRepository;
use crate::repository::order::OrderRepository;

// =============================================================================
// Configuration
// =============================================================================

/// Where the store keeps its data.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Storage {
    /// A database file, created on first open.
    File(PathBuf),
    /// A private database that disappears with the pool.
    Memory,
}

/// Store configuration.
///
/// ```rust,ignore
/// let config = DbConfig::new("/var/lib/taproom/taproom.db").max_connections(4);
/// ```
#[derive(Debug, Clone)]
pub struct DbConfig {
    pub storage: Storage,

    /// Pool size for a file store. Default: 5. The in-memory store always
    /// uses one connection.
    pub max_connections: u32,

    /// How long a writer waits for the lock held by another writer.
    pub busy_timeout: Duration,

    /// How long a caller waits for a free pooled connection.
    pub acquire_timeout: Duration,

    /// Apply pending migrations on open. Default: true.
    pub migrate: bool,

    /// Notifications buffered per subscriber before it lags.
    pub feed_capacity: usize,
}

impl DbConfig {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        DbConfig {
            storage: Storage::File(path.into()),
            max_connections: 5,
            busy_timeout: Duration::from_secs(5),
            acquire_timeout: Duration::from_secs(30),
            migrate: true,
            feed_capacity: DEFAULT_FEED_CAPACITY,
        }
    }

    /// An empty, migrated store private to the caller. Used by tests.
    pub fn in_memory() -> Self {
        DbConfig {
            storage: Storage::Memory,
            max_connections: 1,
            acquire_timeout: Duration::from_secs(5),
            ..DbConfig::new(PathBuf::new())
        }
    }

    pub fn max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    pub fn busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout = timeout;
        self
    }

    /// Opens the store as-is, without touching its schema.
    pub fn without_migrations(mut self) -> Self {
        self.migrate = false;
        self
    }

    pub fn feed_capacity(mut self, capacity: usize) -> Self {
        self.feed_capacity = capacity;
        self
    }

    fn connect_options(&self) -> SqliteConnectOptions {
        let options = match &self.storage {
            Storage::File(path) => SqliteConnectOptions::new()
                .filename(path)
                .create_if_missing(true)
                .journal_mode(SqliteJournalMode::Wal),
            Storage::Memory => SqliteConnectOptions::new().in_memory(true),
        };

        options
            .synchronous(SqliteSynchronous::Normal)
            .foreign_keys(true)
            .busy_timeout(self.busy_timeout)
    }

    fn pool_options(&self) -> SqlitePoolOptions {
        let options = SqlitePoolOptions::new().acquire_timeout(self.acquire_timeout);
        match self.storage {
            Storage::File(_) => options
                .max_connections(self.max_connections)
                .min_connections(1)
                .idle_timeout(Some(Duration::from_secs(600))),
            Storage::Memory => options
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None)
                .max_lifetime(None),
        }
    }
}

// =============================================================================
// Database
// =============================================================================

/// Shared handle on the store. Clones share the pool and the change feed.
#[derive(Debug, Clone)]
pub struct Database {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl Database {
    pub async fn new(config: DbConfig) -> DbResult<Self> {
        info!(storage = ?config.storage, "Opening store");

        let pool = config
            .pool_options()
            .connect_with(config.connect_options())
            .await
            .map_err(|e| DbError::ConnectionFailed(e.to_string()))?;
        debug!(max_connections = config.max_connections, "Pool ready");

        let db = Database {
            pool,
            feed: ChangeFeed::new(config.feed_capacity),
        };

        if config.migrate {
            db.run_migrations().await?;
        }

        Ok(db)
    }

    pub async fn run_migrations(&self) -> DbResult<()> {
        migrations::run_migrations(&self.pool).await
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    /// Stocked items, shots and specials.
    pub fn catalog(&self) -> CatalogRepository {
        CatalogRepository::new(self.pool.clone(), self.feed.clone())
    }

    /// Tabs, paid orders, settlement.
    pub fn orders(&self) -> OrderRepository {
        OrderRepository::new(self.pool.clone(), self.feed.clone())
    }

    /// Collections changed by commits made after this call.
    pub fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.feed.subscribe()
    }

    /// Closes the pool. Repository calls fail afterwards.
    pub async fn close(&self) {
        info!("Closing store");
        self.pool.close().await;
    }

    pub async fn health_check(&self) -> bool {
        sqlx::query("SELECT 1").execute(&self.pool).await.is_ok()
    }
}
