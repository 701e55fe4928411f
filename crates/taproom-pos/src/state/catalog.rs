//! # Catalog Read Model
//!
//! An in-memory `Catalog` snapshot kept current by the change feed.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Catalog Refresh                                      │
//! │                                                                         │
//! │  CatalogRepository write ──► ChangeFeed ──► spawn_refresh task          │
//! │                               (Collection)        │                     │
//! │                                                   ▼                     │
//! │                                      reload(collection)                 │
//! │                                      full re-read of that collection    │
//! │                                                   │                     │
//! │                                                   ▼                     │
//! │  lookup_code / resolve ◄──────────── RwLock<Catalog>                    │
//! │                                                                         │
//! │  Lagged receiver ──► reload_all                                         │
//! │  Orders changes  ──► ignored (no catalog data in them)                  │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Every notification triggers an idempotent full reload of the named
//! collection. Nothing is patched incrementally, and nothing is assumed
//! about ordering between a notification and the caller's own write.

use std::sync::Arc;

use tokio::sync::broadcast::error::RecvError;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use taproom_core::{Catalog, Product, ProductRef, StockedItem};
use taproom_db::{Collection, Database, DbResult};

/// Shared, refreshable catalog snapshot.
#[derive(Debug, Clone, Default)]
pub struct CatalogState {
    catalog: Arc<RwLock<Catalog>>,
}

impl CatalogState {
    /// Re-reads every collection.
    pub async fn reload_all(&self, db: &Database) -> DbResult<()> {
        for collection in Collection::ALL {
            self.reload(db, collection).await?;
        }
        Ok(())
    }

    /// Re-reads one collection and swaps it in.
    pub async fn reload(&self, db: &Database, collection: Collection) -> DbResult<()> {
        let repo = db.catalog();
        match collection {
            Collection::StockedItems => {
                let items = repo.list_items().await?;
                debug!(count = items.len(), "Stocked items reloaded");
                self.catalog.write().await.replace_items(items);
            }
            Collection::Shots => {
                let shots = repo.list_shots().await?;
                debug!(count = shots.len(), "Shots reloaded");
                self.catalog.write().await.replace_shots(shots);
            }
            Collection::Specials => {
                let specials = repo.list_specials().await?;
                debug!(count = specials.len(), "Specials reloaded");
                self.catalog.write().await.replace_specials(specials);
            }
            Collection::Orders => {}
        }
        Ok(())
    }

    /// Keeps the snapshot current. Runs until the returned handle is
    /// aborted; the task's own `Database` keeps the feed open.
    ///
    /// Subscribes before returning, so no change committed after this call
    /// is missed.
    pub fn spawn_refresh(&self, db: Database) -> JoinHandle<()> {
        let state = self.clone();
        let mut rx = db.subscribe();

        tokio::spawn(async move {
            info!("Catalog refresh task started");
            loop {
                let result = match rx.recv().await {
                    Ok(collection) => state.reload(&db, collection).await,
                    Err(RecvError::Lagged(missed)) => {
                        warn!(missed, "Change feed lagged, reloading everything");
                        state.reload_all(&db).await
                    }
                    Err(RecvError::Closed) => break,
                };

                if let Err(e) = result {
                    warn!(error = %e, "Catalog reload failed");
                }
            }
            info!("Catalog refresh task stopped");
        })
    }

    pub async fn lookup_code(&self, code: &str) -> taproom_core::CoreResult<Product> {
        self.catalog.read().await.lookup_code(code)
    }

    pub async fn resolve(&self, key: &ProductRef) -> taproom_core::CoreResult<Product> {
        self.catalog.read().await.resolve(key)
    }

    /// Items at or below their threshold, as of the last reload.
    pub async fn low_stock_items(&self) -> Vec<StockedItem> {
        self.catalog
            .read()
            .await
            .low_stock_items()
            .into_iter()
            .cloned()
            .collect()
    }

    /// A copy of the current snapshot.
    pub async fn snapshot(&self) -> Catalog {
        self.catalog.read().await.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use taproom_db::{DbConfig, NewShot, NewStockedItem};

    async fn loaded(db: &Database) -> CatalogState {
        let state = CatalogState::default();
        state.reload_all(db).await.unwrap();
        state
    }

    fn beer() -> NewStockedItem {
        NewStockedItem {
            name: "Beer".to_string(),
            price_cents: 450,
            category: "Beer".to_string(),
            quantity: 5,
            barcode: Some("6001234567890".to_string()),
            low_stock_threshold: 2,
        }
    }

    #[tokio::test]
    async fn test_load_and_lookup() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        db.catalog().create_item(beer()).await.unwrap();

        let state = loaded(&db).await;
        let product = state.lookup_code("6001234567890").await.unwrap();
        assert_eq!(product.name(), "Beer");
    }

    #[tokio::test]
    async fn test_reload_picks_up_new_rows() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = loaded(&db).await;
        assert!(state.lookup_code("6001234567890").await.is_err());

        db.catalog().create_item(beer()).await.unwrap();
        state.reload(&db, Collection::StockedItems).await.unwrap();

        assert!(state.lookup_code("6001234567890").await.is_ok());
    }

    #[tokio::test]
    async fn test_refresh_task_follows_the_feed() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let state = loaded(&db).await;
        let handle = state.spawn_refresh(db.clone());

        db.catalog()
            .create_shot(NewShot {
                name: "Tequila".to_string(),
                price_cents: 300,
                barcode: Some("7000000000001".to_string()),
            })
            .await
            .unwrap();

        let mut found = false;
        for _ in 0..50 {
            if state.lookup_code("7000000000001").await.is_ok() {
                found = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
        assert!(found, "refresh task never reloaded shots");

        handle.abort();
    }
}
