//! # Change Feed
//!
//! Tells subscribers which collection changed after every committed write.
//!
//! ```text
//! CatalogRepository::restock ──┐
//! OrderRepository::pay ────────┼──► ChangeFeed ──► broadcast ──► read model
//! OrderRepository::save_tab ───┘    (Collection)                 reloads the
//!                                                                 whole collection
//! ```
//!
//! Notifications carry no payload. A subscriber that falls behind
//! (`RecvError::Lagged`) should reload every collection.

use serde::{Deserialize, Serialize};
use std::fmt;
use tokio::sync::broadcast;
use tracing::trace;

/// Default number of buffered notifications per subscriber.
pub const DEFAULT_FEED_CAPACITY: usize = 64;

/// A watched record collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Collection {
    StockedItems,
    Shots,
    Specials,
    /// Orders and their three line tables.
    Orders,
}

impl Collection {
    pub const ALL: [Collection; 4] = [
        Collection::StockedItems,
        Collection::Shots,
        Collection::Specials,
        Collection::Orders,
    ];
}

impl fmt::Display for Collection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Collection::StockedItems => "stocked_items",
            Collection::Shots => "shots",
            Collection::Specials => "specials",
            Collection::Orders => "orders",
        };
        f.write_str(name)
    }
}

/// Sender half of the change feed. Cheap to clone.
#[derive(Debug, Clone)]
pub struct ChangeFeed {
    tx: broadcast::Sender<Collection>,
}

impl Default for ChangeFeed {
    fn default() -> Self {
        ChangeFeed::new(DEFAULT_FEED_CAPACITY)
    }
}

impl ChangeFeed {
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        ChangeFeed { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Collection> {
        self.tx.subscribe()
    }

    /// Announces a committed change. Having no subscribers is fine.
    pub fn publish(&self, collection: Collection) {
        let receivers = self.tx.send(collection).unwrap_or(0);
        trace!(%collection, receivers, "Change published");
    }
}
