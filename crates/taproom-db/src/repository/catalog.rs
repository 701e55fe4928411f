//! # Catalog Repository
//!
//! CRUD over the three product catalogs, plus restocking and the
//! low-stock query.
//!
//! ## Tables
//! ```text
//! ┌──────────────────────┐  ┌──────────────────────┐  ┌──────────────────────┐
//! │ stocked_items        │  │ shots                │  │ specials             │
//! │ ──────────────────── │  │ ──────────────────── │  │ ──────────────────── │
//! │ quantity  (>= 0)     │  │ barcode (optional)   │  │ never scanned        │
//! │ barcode   (UNIQUE)   │  │ no stock             │  │ no stock             │
//! │ low_stock_threshold  │  │                      │  │                      │
//! └──────────────────────┘  └──────────────────────┘  └──────────────────────┘
//! ```
//!
//! Stock only goes down through settlement (`OrderRepository::complete_payment`).
//! This repository can set it (stock take) or raise it (restock).

use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::SqlitePool;
use tracing::{debug, info};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};
use taproom_core::validation::{
    normalize_barcode, validate_price_cents, validate_product_name, validate_restock,
    validate_stock_count,
};
use taproom_core::{Shot, Special, StockedItem};

/// Fields for a new stocked item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewStockedItem {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub category: String,
    #[serde(default)]
    pub quantity: i64,
    #[serde(default)]
    pub barcode: Option<String>,
    #[serde(default)]
    pub low_stock_threshold: i64,
}

/// Fields for a new shot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewShot {
    pub name: String,
    pub price_cents: i64,
    #[serde(default)]
    pub barcode: Option<String>,
}

/// Fields for a new special.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewSpecial {
    pub name: String,
    pub price_cents: i64,
}

/// Repository for the product catalogs.
#[derive(Debug, Clone)]
pub struct CatalogRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl CatalogRepository {
    /// Creates a new CatalogRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        CatalogRepository { pool, feed }
    }

    // =========================================================================
    // Stocked Items
    // =========================================================================

    /// Lists all stocked items by name.
    pub async fn list_items(&self) -> DbResult<Vec<StockedItem>> {
        let items = sqlx::query_as::<_, StockedItem>(
            r#"
            SELECT id, name, price_cents, category, quantity, barcode,
                   low_stock_threshold, created_at, updated_at
            FROM stocked_items
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Gets a stocked item with its live quantity.
    pub async fn get_item(&self, id: &str) -> DbResult<Option<StockedItem>> {
        let item = sqlx::query_as::<_, StockedItem>(
            r#"
            SELECT id, name, price_cents, category, quantity, barcode,
                   low_stock_threshold, created_at, updated_at
            FROM stocked_items
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(item)
    }

    /// Creates a stocked item.
    ///
    /// ## Errors
    /// - `Validation` for a blank name, negative price/quantity/threshold
    /// - `UniqueViolation` if another item already carries the barcode
    pub async fn create_item(&self, new: NewStockedItem) -> DbResult<StockedItem> {
        validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        validate_stock_count("quantity", new.quantity)?;
        validate_stock_count("low stock threshold", new.low_stock_threshold)?;
        let barcode = normalize_barcode(new.barcode.as_deref())?;

        let now = Utc::now();
        let item = StockedItem {
            id: generate_id(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            category: new.category.trim().to_string(),
            quantity: new.quantity,
            barcode,
            low_stock_threshold: new.low_stock_threshold,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %item.id, name = %item.name, "Creating stocked item");

        sqlx::query(
            r#"
            INSERT INTO stocked_items (
                id, name, price_cents, category, quantity, barcode,
                low_stock_threshold, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
            "#,
        )
        .bind(&item.id)
        .bind(&item.name)
        .bind(item.price_cents)
        .bind(&item.category)
        .bind(item.quantity)
        .bind(&item.barcode)
        .bind(item.low_stock_threshold)
        .bind(item.created_at)
        .bind(item.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, item.barcode.as_deref()))?;

        self.feed.publish(Collection::StockedItems);
        Ok(item)
    }

    /// Updates every editable field of a stocked item, including the
    /// stock count (stock take).
    pub async fn update_item(&self, item: &StockedItem) -> DbResult<()> {
        validate_product_name(&item.name)?;
        validate_price_cents(item.price_cents)?;
        validate_stock_count("quantity", item.quantity)?;
        validate_stock_count("low stock threshold", item.low_stock_threshold)?;
        let barcode = normalize_barcode(item.barcode.as_deref())?;

        debug!(id = %item.id, "Updating stocked item");

        let result = sqlx::query(
            r#"
            UPDATE stocked_items SET
                name = ?2,
                price_cents = ?3,
                category = ?4,
                quantity = ?5,
                barcode = ?6,
                low_stock_threshold = ?7,
                updated_at = ?8
            WHERE id = ?1
            "#,
        )
        .bind(&item.id)
        .bind(item.name.trim())
        .bind(item.price_cents)
        .bind(item.category.trim())
        .bind(item.quantity)
        .bind(&barcode)
        .bind(item.low_stock_threshold)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, barcode.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockedItem", &item.id));
        }

        self.feed.publish(Collection::StockedItems);
        Ok(())
    }

    /// Adds `delta` (> 0) units to an item's stock and returns the item.
    pub async fn restock(&self, id: &str, delta: i64) -> DbResult<StockedItem> {
        validate_restock(delta)?;

        info!(id = %id, delta, "Restocking item");

        let result = sqlx::query(
            r#"
            UPDATE stocked_items
            SET quantity = quantity + ?2, updated_at = ?3
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .bind(delta)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("StockedItem", id));
        }

        self.feed.publish(Collection::StockedItems);
        self.get_item(id)
            .await?
            .ok_or_else(|| DbError::not_found("StockedItem", id))
    }

    /// Deletes a stocked item. Order history keeps its lines.
    pub async fn delete_item(&self, id: &str) -> DbResult<()> {
        self.delete_from("stocked_items", "StockedItem", id).await?;
        self.feed.publish(Collection::StockedItems);
        Ok(())
    }

    /// All items with `quantity <= low_stock_threshold`, emptiest first.
    pub async fn low_stock_items(&self) -> DbResult<Vec<StockedItem>> {
        let items = sqlx::query_as::<_, StockedItem>(
            r#"
            SELECT id, name, price_cents, category, quantity, barcode,
                   low_stock_threshold, created_at, updated_at
            FROM stocked_items
            WHERE quantity <= low_stock_threshold
            ORDER BY quantity, name
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(items)
    }

    /// Counts stocked items (for diagnostics and seeding).
    pub async fn count_items(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM stocked_items")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Shots
    // =========================================================================

    pub async fn list_shots(&self) -> DbResult<Vec<Shot>> {
        let shots = sqlx::query_as::<_, Shot>(
            r#"
            SELECT id, name, price_cents, barcode, created_at, updated_at
            FROM shots
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(shots)
    }

    pub async fn get_shot(&self, id: &str) -> DbResult<Option<Shot>> {
        let shot = sqlx::query_as::<_, Shot>(
            r#"
            SELECT id, name, price_cents, barcode, created_at, updated_at
            FROM shots
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(shot)
    }

    pub async fn create_shot(&self, new: NewShot) -> DbResult<Shot> {
        validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;
        let barcode = normalize_barcode(new.barcode.as_deref())?;

        let now = Utc::now();
        let shot = Shot {
            id: generate_id(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            barcode,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %shot.id, name = %shot.name, "Creating shot");

        sqlx::query(
            r#"
            INSERT INTO shots (id, name, price_cents, barcode, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)
            "#,
        )
        .bind(&shot.id)
        .bind(&shot.name)
        .bind(shot.price_cents)
        .bind(&shot.barcode)
        .bind(shot.created_at)
        .bind(shot.updated_at)
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, shot.barcode.as_deref()))?;

        self.feed.publish(Collection::Shots);
        Ok(shot)
    }

    pub async fn update_shot(&self, shot: &Shot) -> DbResult<()> {
        validate_product_name(&shot.name)?;
        validate_price_cents(shot.price_cents)?;
        let barcode = normalize_barcode(shot.barcode.as_deref())?;

        let result = sqlx::query(
            r#"
            UPDATE shots SET name = ?2, price_cents = ?3, barcode = ?4, updated_at = ?5
            WHERE id = ?1
            "#,
        )
        .bind(&shot.id)
        .bind(shot.name.trim())
        .bind(shot.price_cents)
        .bind(&barcode)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(|e| with_barcode(e, barcode.as_deref()))?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Shot", &shot.id));
        }

        self.feed.publish(Collection::Shots);
        Ok(())
    }

    pub async fn delete_shot(&self, id: &str) -> DbResult<()> {
        self.delete_from("shots", "Shot", id).await?;
        self.feed.publish(Collection::Shots);
        Ok(())
    }

    // =========================================================================
    // Specials
    // =========================================================================

    pub async fn list_specials(&self) -> DbResult<Vec<Special>> {
        let specials = sqlx::query_as::<_, Special>(
            r#"
            SELECT id, name, price_cents, created_at, updated_at
            FROM specials
            ORDER BY name, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(specials)
    }

    pub async fn get_special(&self, id: &str) -> DbResult<Option<Special>> {
        let special = sqlx::query_as::<_, Special>(
            r#"
            SELECT id, name, price_cents, created_at, updated_at
            FROM specials
            WHERE id = ?1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(special)
    }

    pub async fn create_special(&self, new: NewSpecial) -> DbResult<Special> {
        validate_product_name(&new.name)?;
        validate_price_cents(new.price_cents)?;

        let now = Utc::now();
        let special = Special {
            id: generate_id(),
            name: new.name.trim().to_string(),
            price_cents: new.price_cents,
            created_at: now,
            updated_at: now,
        };

        debug!(id = %special.id, name = %special.name, "Creating special");

        sqlx::query(
            r#"
            INSERT INTO specials (id, name, price_cents, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5)
            "#,
        )
        .bind(&special.id)
        .bind(&special.name)
        .bind(special.price_cents)
        .bind(special.created_at)
        .bind(special.updated_at)
        .execute(&self.pool)
        .await?;

        self.feed.publish(Collection::Specials);
        Ok(special)
    }

    pub async fn update_special(&self, special: &Special) -> DbResult<()> {
        validate_product_name(&special.name)?;
        validate_price_cents(special.price_cents)?;

        let result = sqlx::query(
            r#"
            UPDATE specials SET name = ?2, price_cents = ?3, updated_at = ?4
            WHERE id = ?1
            "#,
        )
        .bind(&special.id)
        .bind(special.name.trim())
        .bind(special.price_cents)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found("Special", &special.id));
        }

        self.feed.publish(Collection::Specials);
        Ok(())
    }

    pub async fn delete_special(&self, id: &str) -> DbResult<()> {
        self.delete_from("specials", "Special", id).await?;
        self.feed.publish(Collection::Specials);
        Ok(())
    }

    async fn delete_from(&self, table: &'static str, entity: &str, id: &str) -> DbResult<()> {
        debug!(table, id = %id, "Deleting catalog record");

        let sql = format!("DELETE FROM {} WHERE id = ?1", table);
        let result = sqlx::query(&sql).bind(id).execute(&self.pool).await?;

        if result.rows_affected() == 0 {
            return Err(DbError::not_found(entity, id));
        }

        Ok(())
    }
}

/// Fills in the offending barcode on a unique violation.
fn with_barcode(err: sqlx::Error, barcode: Option<&str>) -> DbError {
    match DbError::from(err) {
        DbError::UniqueViolation { field, .. } => {
            DbError::duplicate(field, barcode.unwrap_or("unknown"))
        }
        other => other,
    }
}

/// Generates a new catalog record ID.
pub fn generate_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};

    async fn db() -> Database {
        Database::new(DbConfig::in_memory()).await.unwrap()
    }

    fn beer(barcode: Option<&str>) -> NewStockedItem {
        NewStockedItem {
            name: "Beer".to_string(),
            price_cents: 450,
            category: "Beer".to_string(),
            quantity: 5,
            barcode: barcode.map(str::to_string),
            low_stock_threshold: 2,
        }
    }

    #[tokio::test]
    async fn test_item_crud() {
        let db = db().await;
        let repo = db.catalog();

        let mut item = repo.create_item(beer(Some("6001"))).await.unwrap();
        let loaded = repo.get_item(&item.id).await.unwrap().unwrap();
        assert_eq!(loaded.name, "Beer");
        assert_eq!(loaded.barcode.as_deref(), Some("6001"));

        item.price_cents = 500;
        repo.update_item(&item).await.unwrap();
        assert_eq!(repo.get_item(&item.id).await.unwrap().unwrap().price_cents, 500);

        repo.delete_item(&item.id).await.unwrap();
        assert!(repo.get_item(&item.id).await.unwrap().is_none());
        assert!(matches!(
            repo.delete_item(&item.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_duplicate_barcode_rejected() {
        let db = db().await;
        let repo = db.catalog();

        repo.create_item(beer(Some("6001"))).await.unwrap();
        let err = repo.create_item(beer(Some("6001"))).await.unwrap_err();
        match err {
            DbError::UniqueViolation { value, .. } => assert_eq!(value, "6001"),
            other => panic!("expected UniqueViolation, got {other:?}"),
        }

        // blank barcodes are stored as NULL and never collide
        repo.create_item(beer(Some("  "))).await.unwrap();
        repo.create_item(beer(None)).await.unwrap();
        assert_eq!(repo.count_items().await.unwrap(), 3);
    }

    #[tokio::test]
    async fn test_validation_before_write() {
        let db = db().await;
        let repo = db.catalog();

        let mut new = beer(None);
        new.price_cents = -1;
        assert!(matches!(
            repo.create_item(new).await,
            Err(DbError::Validation(_))
        ));
        assert_eq!(repo.count_items().await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_restock_and_low_stock() {
        let db = db().await;
        let repo = db.catalog();

        let mut low = beer(None);
        low.quantity = 2;
        let low = repo.create_item(low).await.unwrap();
        repo.create_item(beer(None)).await.unwrap();

        let report = repo.low_stock_items().await.unwrap();
        assert_eq!(report.len(), 1);
        assert_eq!(report[0].id, low.id);

        let restocked = repo.restock(&low.id, 10).await.unwrap();
        assert_eq!(restocked.quantity, 12);
        assert!(repo.low_stock_items().await.unwrap().is_empty());
        assert!(repo.restock(&low.id, 0).await.is_err());
    }

    #[tokio::test]
    async fn test_shots_and_specials() {
        let db = db().await;
        let repo = db.catalog();

        let mut shot = repo
            .create_shot(NewShot {
                name: "Tequila".to_string(),
                price_cents: 300,
                barcode: None,
            })
            .await
            .unwrap();
        shot.name = "Tequila Gold".to_string();
        repo.update_shot(&shot).await.unwrap();
        assert_eq!(repo.list_shots().await.unwrap()[0].name, "Tequila Gold");

        let special = repo
            .create_special(NewSpecial {
                name: "Wings".to_string(),
                price_cents: 1250,
            })
            .await
            .unwrap();
        assert!(repo.get_special(&special.id).await.unwrap().is_some());
        repo.delete_special(&special.id).await.unwrap();
        assert!(repo.list_specials().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_writes_publish_changes() {
        let db = db().await;
        let mut rx = db.subscribe();

        db.catalog().create_item(beer(None)).await.unwrap();
        db.catalog()
            .create_special(NewSpecial {
                name: "Wings".to_string(),
                price_cents: 1250,
            })
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), Collection::StockedItems);
        assert_eq!(rx.recv().await.unwrap(), Collection::Specials);
    }
}
