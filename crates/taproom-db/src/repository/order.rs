//! # Order Repository
//!
//! Tabs, settlement, and the open-tab registry.
//!
//! ## Settlement Transactions
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  save_tab(commit)                  complete_payment(commit)             │
//! │  ─────────────────                 ────────────────────────             │
//! │  BEGIN                             BEGIN                                │
//! │  origin? check version             origin? check version                │
//! │    UPDATE orders (version+1)       INSERT orders (paid)                 │
//! │    DELETE all lines (3 tables)     INSERT lines (3 tables)              │
//! │  else INSERT orders (pending)      for each item:                       │
//! │  INSERT lines (3 tables)             UPDATE stock = stock - n           │
//! │  COMMIT                              WHERE stock >= n   (0 rows → fail) │
//! │  publish(Orders)                   origin? DELETE lines + old tab       │
//! │                                    COMMIT                               │
//! │                                    publish(Orders, StockedItems)        │
//! │                                                                         │
//! │  Any error before COMMIT drops the transaction: nothing is written.     │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::error::{DbError, DbResult};
use crate::feed::{ChangeFeed, Collection};
use taproom_core::cart::{CartLine, TabRef};
use taproom_core::order::{OpenTab, PaymentCommit, TabCommit};
use taproom_core::{Order, OrderLine, OrderStatus, PaymentMethod, ProductKind};

/// Name shown for a line whose product has since been removed.
pub const REMOVED_PRODUCT_NAME: &str = "(removed product)";

/// Which open tabs a listing should include.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabScope<'a> {
    /// Only tabs opened by this staff member.
    Staff(&'a str),
    /// Every open tab.
    All,
}

/// Line table and catalog table for each product kind.
fn tables(kind: ProductKind) -> (&'static str, &'static str) {
    match kind {
        ProductKind::Item => ("order_items", "stocked_items"),
        ProductKind::Shot => ("order_shots", "shots"),
        ProductKind::Special => ("order_specials", "specials"),
    }
}

#[derive(Debug, sqlx::FromRow)]
struct LineRow {
    id: String,
    order_id: String,
    product_id: String,
    name: Option<String>,
    staff_id: String,
    quantity: i64,
    price_at_time_cents: i64,
    created_at: DateTime<Utc>,
}

impl LineRow {
    fn into_line(self, kind: ProductKind) -> OrderLine {
        OrderLine {
            id: self.id,
            order_id: self.order_id,
            kind,
            product_id: self.product_id,
            name: self
                .name
                .unwrap_or_else(|| REMOVED_PRODUCT_NAME.to_string()),
            staff_id: self.staff_id,
            quantity: self.quantity,
            price_at_time_cents: self.price_at_time_cents,
            created_at: self.created_at,
        }
    }
}

/// Repository for orders and their lines.
#[derive(Debug, Clone)]
pub struct OrderRepository {
    pool: SqlitePool,
    feed: ChangeFeed,
}

impl OrderRepository {
    /// Creates a new OrderRepository.
    pub fn new(pool: SqlitePool, feed: ChangeFeed) -> Self {
        OrderRepository { pool, feed }
    }

    // =========================================================================
    // Reads
    // =========================================================================

    /// Gets an order by ID.
    pub async fn get_order(&self, id: &str) -> DbResult<Option<Order>> {
        let mut conn = self.pool.acquire().await?;
        fetch_order(&mut conn, id).await
    }

    /// Gets all lines of an order across the three line tables, items first.
    pub async fn get_lines(&self, order_id: &str) -> DbResult<Vec<OrderLine>> {
        let mut conn = self.pool.acquire().await?;
        fetch_lines(&mut conn, order_id).await
    }

    /// Gets a pending order with its lines.
    ///
    /// ## Errors
    /// `NotFound` if the order doesn't exist or is already paid.
    pub async fn get_open_tab(&self, id: &str) -> DbResult<OpenTab> {
        let order = self
            .get_order(id)
            .await?
            .filter(Order::is_pending)
            .ok_or_else(|| DbError::not_found("Open tab", id))?;
        let lines = self.get_lines(&order.id).await?;

        Ok(OpenTab { order, lines })
    }

    /// Lists pending orders, oldest first, each with its lines.
    pub async fn list_open_tabs(&self, scope: TabScope<'_>) -> DbResult<Vec<OpenTab>> {
        let orders = match scope {
            TabScope::Staff(staff_id) => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, name, status, payment_method, total_cents,
                           service_fee_cents, staff_id, version, created_at, updated_at
                    FROM orders
                    WHERE status = 'pending' AND staff_id = ?1
                    ORDER BY created_at, id
                    "#,
                )
                .bind(staff_id)
                .fetch_all(&self.pool)
                .await?
            }
            TabScope::All => {
                sqlx::query_as::<_, Order>(
                    r#"
                    SELECT id, name, status, payment_method, total_cents,
                           service_fee_cents, staff_id, version, created_at, updated_at
                    FROM orders
                    WHERE status = 'pending'
                    ORDER BY created_at, id
                    "#,
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut tabs = Vec::with_capacity(orders.len());
        for order in orders {
            let lines = self.get_lines(&order.id).await?;
            tabs.push(OpenTab { order, lines });
        }

        Ok(tabs)
    }

    /// Lists paid orders, newest first.
    pub async fn list_paid(&self, limit: u32) -> DbResult<Vec<Order>> {
        let orders = sqlx::query_as::<_, Order>(
            r#"
            SELECT id, name, status, payment_method, total_cents,
                   service_fee_cents, staff_id, version, created_at, updated_at
            FROM orders
            WHERE status = 'paid'
            ORDER BY created_at DESC, id
            LIMIT ?1
            "#,
        )
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        Ok(orders)
    }

    /// Counts orders with the given status.
    pub async fn count(&self, status: OrderStatus) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM orders WHERE status = ?1")
            .bind(status)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    // =========================================================================
    // Settlement
    // =========================================================================

    /// Persists a cart as a pending tab.
    ///
    /// A commit with an origin replaces that tab: name and totals are
    /// updated, the version is bumped, and every existing line is replaced.
    /// The original owner is kept.
    ///
    /// ## Errors
    /// - `NotFound` if the origin tab no longer exists
    /// - `ConcurrencyConflict` if it was saved or paid since it was reopened
    pub async fn save_tab(&self, commit: &TabCommit) -> DbResult<Order> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;

        let order_id = match &commit.origin {
            Some(origin) => {
                check_origin(&mut tx, origin).await?;

                let result = sqlx::query(
                    r#"
                    UPDATE orders SET
                        name = ?3,
                        total_cents = ?4,
                        service_fee_cents = ?5,
                        version = version + 1,
                        updated_at = ?6
                    WHERE id = ?1 AND version = ?2 AND status = 'pending'
                    "#,
                )
                .bind(&origin.order_id)
                .bind(origin.version)
                .bind(&commit.name)
                .bind(commit.pricing.total_cents)
                .bind(commit.pricing.service_fee_cents)
                .bind(now)
                .execute(&mut *tx)
                .await?;

                if result.rows_affected() == 0 {
                    return Err(DbError::conflict(&origin.order_id, origin.version));
                }

                delete_lines(&mut tx, &origin.order_id).await?;
                origin.order_id.clone()
            }
            None => {
                let id = generate_order_id();
                insert_order(
                    &mut tx,
                    &id,
                    &commit.name,
                    OrderStatus::Pending,
                    None,
                    commit.pricing.total_cents,
                    commit.pricing.service_fee_cents,
                    &commit.staff_id,
                    now,
                )
                .await?;
                id
            }
        };

        insert_lines(&mut tx, &order_id, &commit.staff_id, &commit.lines, now).await?;

        let order = fetch_order(&mut tx, &order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &order_id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            version = order.version,
            lines = commit.lines.len(),
            total_cents = order.total_cents,
            "Tab saved"
        );

        self.feed.publish(Collection::Orders);
        Ok(order)
    }

    /// Persists a cart as a paid order and takes item units out of stock.
    ///
    /// Every stocked item is decremented with a conditional update, so two
    /// terminals selling the last unit cannot both succeed. If the cart came
    /// from a tab, that tab and its lines are removed in the same
    /// transaction.
    ///
    /// ## Errors
    /// - `InsufficientStock` if any item no longer has enough units
    /// - `NotFound` / `ConcurrencyConflict` for a stale origin tab
    ///
    /// On error nothing is written.
    pub async fn complete_payment(&self, commit: &PaymentCommit) -> DbResult<Order> {
        let now = Utc::now();
        let order_id = generate_order_id();
        let mut tx = self.pool.begin().await?;

        if let Some(origin) = &commit.origin {
            check_origin(&mut tx, origin).await?;
        }

        insert_order(
            &mut tx,
            &order_id,
            &commit.name,
            OrderStatus::Paid,
            Some(commit.method),
            commit.pricing.total_cents,
            commit.pricing.service_fee_cents,
            &commit.staff_id,
            now,
        )
        .await?;

        insert_lines(&mut tx, &order_id, &commit.staff_id, &commit.lines, now).await?;

        let requirements = commit.stock_requirements();
        for (item_id, quantity) in &requirements {
            decrement_stock(&mut tx, item_id, *quantity, now).await?;
        }

        if let Some(origin) = &commit.origin {
            delete_lines(&mut tx, &origin.order_id).await?;

            let result = sqlx::query(
                "DELETE FROM orders WHERE id = ?1 AND version = ?2 AND status = 'pending'",
            )
            .bind(&origin.order_id)
            .bind(origin.version)
            .execute(&mut *tx)
            .await?;

            if result.rows_affected() == 0 {
                return Err(DbError::conflict(&origin.order_id, origin.version));
            }
        }

        let order = fetch_order(&mut tx, &order_id)
            .await?
            .ok_or_else(|| DbError::not_found("Order", &order_id))?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(
            order_id = %order.id,
            method = %commit.method,
            total_cents = order.total_cents,
            closed_tab = ?commit.origin.as_ref().map(|o| &o.order_id),
            "Payment completed"
        );

        self.feed.publish(Collection::Orders);
        if !requirements.is_empty() {
            self.feed.publish(Collection::StockedItems);
        }
        Ok(order)
    }

    /// Deletes an open tab and all of its lines. Irreversible.
    ///
    /// ## Errors
    /// - `NotFound` if there is no pending order with this ID
    pub async fn delete_tab(&self, order_id: &str) -> DbResult<()> {
        let mut tx = self.pool.begin().await?;

        let pending = fetch_order(&mut tx, order_id)
            .await?
            .filter(Order::is_pending)
            .is_some();
        if !pending {
            return Err(DbError::not_found("Open tab", order_id));
        }

        delete_lines(&mut tx, order_id).await?;
        sqlx::query("DELETE FROM orders WHERE id = ?1 AND status = 'pending'")
            .bind(order_id)
            .execute(&mut *tx)
            .await?;

        tx.commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        info!(order_id = %order_id, "Tab deleted");
        self.feed.publish(Collection::Orders);
        Ok(())
    }
}

// =============================================================================
// Transaction Helpers
// =============================================================================

async fn fetch_order(conn: &mut SqliteConnection, id: &str) -> DbResult<Option<Order>> {
    let order = sqlx::query_as::<_, Order>(
        r#"
        SELECT id, name, status, payment_method, total_cents,
               service_fee_cents, staff_id, version, created_at, updated_at
        FROM orders
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    Ok(order)
}

async fn fetch_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<Vec<OrderLine>> {
    let mut lines = Vec::new();

    for kind in ProductKind::ALL {
        let (line_table, product_table) = tables(kind);
        let sql = format!(
            r#"
            SELECT l.id, l.order_id, l.product_id, p.name AS name, l.staff_id,
                   l.quantity, l.price_at_time_cents, l.created_at
            FROM {line_table} l
            LEFT JOIN {product_table} p ON p.id = l.product_id
            WHERE l.order_id = ?1
            ORDER BY l.created_at, l.id
            "#
        );

        let rows = sqlx::query_as::<_, LineRow>(&sql)
            .bind(order_id)
            .fetch_all(&mut *conn)
            .await?;
        lines.extend(rows.into_iter().map(|row| row.into_line(kind)));
    }

    Ok(lines)
}

/// Fails unless the tab still exists, is pending, and has the version the
/// cart was reopened at.
async fn check_origin(conn: &mut SqliteConnection, origin: &TabRef) -> DbResult<()> {
    let current = fetch_order(conn, &origin.order_id)
        .await?
        .ok_or_else(|| DbError::not_found("Open tab", &origin.order_id))?;

    if !current.is_pending() || current.version != origin.version {
        warn!(
            order_id = %origin.order_id,
            expected = origin.version,
            actual = current.version,
            status = current.status.as_str(),
            "Stale tab"
        );
        return Err(DbError::conflict(&origin.order_id, origin.version));
    }

    Ok(())
}

#[allow(clippy::too_many_arguments)]
async fn insert_order(
    conn: &mut SqliteConnection,
    id: &str,
    name: &str,
    status: OrderStatus,
    payment_method: Option<PaymentMethod>,
    total_cents: i64,
    service_fee_cents: i64,
    staff_id: &str,
    now: DateTime<Utc>,
) -> DbResult<()> {
    debug!(id = %id, status = status.as_str(), "Inserting order");

    sqlx::query(
        r#"
        INSERT INTO orders (
            id, name, status, payment_method, total_cents,
            service_fee_cents, staff_id, version, created_at, updated_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, 1, ?8, ?8)
        "#,
    )
    .bind(id)
    .bind(name)
    .bind(status)
    .bind(payment_method)
    .bind(total_cents)
    .bind(service_fee_cents)
    .bind(staff_id)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

async fn insert_lines(
    conn: &mut SqliteConnection,
    order_id: &str,
    staff_id: &str,
    lines: &[CartLine],
    now: DateTime<Utc>,
) -> DbResult<()> {
    for line in lines {
        let (line_table, _) = tables(line.kind);
        let sql = format!(
            r#"
            INSERT INTO {line_table} (
                id, order_id, product_id, staff_id, quantity,
                price_at_time_cents, created_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            "#
        );

        sqlx::query(&sql)
            .bind(Uuid::new_v4().to_string())
            .bind(order_id)
            .bind(&line.product_id)
            .bind(staff_id)
            .bind(line.quantity)
            .bind(line.unit_price_cents)
            .bind(now)
            .execute(&mut *conn)
            .await?;
    }

    Ok(())
}

async fn delete_lines(conn: &mut SqliteConnection, order_id: &str) -> DbResult<()> {
    for kind in ProductKind::ALL {
        let (line_table, _) = tables(kind);
        let sql = format!("DELETE FROM {line_table} WHERE order_id = ?1");
        sqlx::query(&sql).bind(order_id).execute(&mut *conn).await?;
    }

    Ok(())
}

/// `quantity = quantity - n WHERE quantity >= n`, or `InsufficientStock`.
async fn decrement_stock(
    conn: &mut SqliteConnection,
    item_id: &str,
    quantity: i64,
    now: DateTime<Utc>,
) -> DbResult<()> {
    let result = sqlx::query(
        r#"
        UPDATE stocked_items
        SET quantity = quantity - ?2, updated_at = ?3
        WHERE id = ?1 AND quantity >= ?2
        "#,
    )
    .bind(item_id)
    .bind(quantity)
    .bind(now)
    .execute(&mut *conn)
    .await?;

    if result.rows_affected() > 0 {
        debug!(item_id = %item_id, quantity, "Stock decremented");
        return Ok(());
    }

    let current: Option<(String, i64)> =
        sqlx::query_as("SELECT name, quantity FROM stocked_items WHERE id = ?1")
            .bind(item_id)
            .fetch_optional(&mut *conn)
            .await?;

    match current {
        Some((name, available)) => {
            warn!(item_id = %item_id, available, requested = quantity, "Insufficient stock");
            Err(DbError::InsufficientStock {
                name,
                available,
                requested: quantity,
            })
        }
        None => Err(DbError::not_found("StockedItem", item_id)),
    }
}

/// Generates a new order ID.
pub fn generate_order_id() -> String {
    Uuid::new_v4().to_string()
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pool::{Database, DbConfig};
    use crate::repository::catalog::{NewShot, NewSpecial, NewStockedItem};
    use taproom_core::order::{prepare_payment, prepare_tab};
    use taproom_core::{Cart, PricingPolicy, Role, Shot, Special, Staff, StockedItem};

    struct Fixture {
        db: Database,
        beer: StockedItem,
        tequila: Shot,
        wings: Special,
        waitress: Staff,
        cashier: Staff,
    }

    async fn fixture(beer_stock: i64) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let catalog = db.catalog();

        let beer = catalog
            .create_item(NewStockedItem {
                name: "Beer".to_string(),
                price_cents: 450,
                category: "Beer".to_string(),
                quantity: beer_stock,
                barcode: Some("6001".to_string()),
                low_stock_threshold: 1,
            })
            .await
            .unwrap();
        let tequila = catalog
            .create_shot(NewShot {
                name: "Tequila".to_string(),
                price_cents: 300,
                barcode: None,
            })
            .await
            .unwrap();
        let wings = catalog
            .create_special(NewSpecial {
                name: "Wings".to_string(),
                price_cents: 1250,
            })
            .await
            .unwrap();

        Fixture {
            db,
            beer,
            tequila,
            wings,
            waitress: Staff::new("staff-w", "Wanjiru", Role::Waitress),
            cashier: Staff::new("staff-c", "Chipo", Role::Cashier),
        }
    }

    fn pay(cart: &Cart, staff: &Staff, name: &str) -> PaymentCommit {
        prepare_payment(
            cart,
            staff,
            name,
            Some(PaymentMethod::Cash),
            "Walk-in",
            &PricingPolicy::default(),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_scenario_c_payment_decrements_stock_at_captured_price() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.cashier.id);
        cart.add_item(&f.beer).unwrap();
        cart.add_item(&f.beer).unwrap();

        // catalog price changes after the lines were added
        let mut repriced = f.beer.clone();
        repriced.price_cents = 999;
        f.db.catalog().update_item(&repriced).await.unwrap();

        let order = f
            .db
            .orders()
            .complete_payment(&pay(&cart, &f.cashier, ""))
            .await
            .unwrap();

        assert_eq!(order.status, OrderStatus::Paid);
        assert_eq!(order.payment_method, Some(PaymentMethod::Cash));
        assert_eq!(order.name, "Walk-in");
        assert_eq!(order.total_cents, 900);

        let beer = f.db.catalog().get_item(&f.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.quantity, 3);

        let lines = f.db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 1);
        assert_eq!(lines[0].price_at_time_cents, 450);
        assert_eq!(lines[0].quantity, 2);
        assert_eq!(lines[0].staff_id, f.cashier.id);
    }

    #[tokio::test]
    async fn test_scenario_e_last_unit_sold_once() {
        let f = fixture(1).await;
        let mut first = Cart::new(&f.cashier.id);
        first.add_item(&f.beer).unwrap();
        let second = first.clone();

        f.db.orders()
            .complete_payment(&pay(&first, &f.cashier, "Bar"))
            .await
            .unwrap();

        let err = f
            .db
            .orders()
            .complete_payment(&pay(&second, &f.cashier, "Bar"))
            .await
            .unwrap_err();
        match err {
            DbError::InsufficientStock {
                available,
                requested,
                ..
            } => {
                assert_eq!(available, 0);
                assert_eq!(requested, 1);
            }
            other => panic!("expected InsufficientStock, got {other:?}"),
        }

        let beer = f.db.catalog().get_item(&f.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.quantity, 0);
        assert_eq!(f.db.orders().count(OrderStatus::Paid).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_failed_payment_writes_nothing() {
        let f = fixture(1).await;
        let mut cart = Cart::new(&f.cashier.id);
        cart.add_shot(&f.tequila).unwrap();
        cart.lines.push(CartLine {
            kind: ProductKind::Item,
            product_id: f.beer.id.clone(),
            name: "Beer".to_string(),
            quantity: 3,
            unit_price_cents: 450,
            added_at: Utc::now(),
        });

        let result = f
            .db
            .orders()
            .complete_payment(&pay(&cart, &f.cashier, "Bar"))
            .await;
        assert!(matches!(result, Err(DbError::InsufficientStock { .. })));

        assert_eq!(f.db.orders().count(OrderStatus::Paid).await.unwrap(), 0);
        let beer = f.db.catalog().get_item(&f.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.quantity, 1);
    }

    #[tokio::test]
    async fn test_save_tab_then_reopen_round_trip() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_item(&f.beer).unwrap();
        cart.add_item(&f.beer).unwrap();
        cart.add_shot(&f.tequila).unwrap();
        cart.add_special(&f.wings).unwrap();

        let commit = prepare_tab(&cart, &f.waitress, "Table 4", &PricingPolicy::default()).unwrap();
        let order = f.db.orders().save_tab(&commit).await.unwrap();
        assert_eq!(order.status, OrderStatus::Pending);
        assert_eq!(order.payment_method, None);
        assert_eq!(order.version, 1);
        assert_eq!(order.service_fee_cents, 245);
        assert_eq!(order.total_cents, 2_695);

        let tab = f.db.orders().get_open_tab(&order.id).await.unwrap();
        let reopened = tab.reopen(&f.waitress.id);

        assert_eq!(reopened.line_count(), cart.line_count());
        for line in &cart.lines {
            let back = reopened.line(&line.product_ref()).unwrap();
            assert_eq!(back.quantity, line.quantity);
            assert_eq!(back.unit_price_cents, line.unit_price_cents);
            assert_eq!(back.kind, line.kind);
        }
        assert_eq!(reopened.origin.as_ref().unwrap().version, 1);

        // no stock is consumed by a tab
        let beer = f.db.catalog().get_item(&f.beer.id).await.unwrap().unwrap();
        assert_eq!(beer.quantity, 5);
    }

    #[tokio::test]
    async fn test_resave_replaces_all_lines() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_item(&f.beer).unwrap();
        cart.add_shot(&f.tequila).unwrap();
        let policy = PricingPolicy::default();

        let order = f
            .db
            .orders()
            .save_tab(&prepare_tab(&cart, &f.waitress, "Table 4", &policy).unwrap())
            .await
            .unwrap();

        let mut edited = f.db.orders().get_open_tab(&order.id).await.unwrap().reopen(&f.waitress.id);
        edited.remove_line(&taproom_core::ProductRef::shot(&f.tequila.id));
        edited.add_special(&f.wings).unwrap();

        let saved = f
            .db
            .orders()
            .save_tab(&prepare_tab(&edited, &f.waitress, "Table 4b", &policy).unwrap())
            .await
            .unwrap();

        assert_eq!(saved.id, order.id);
        assert_eq!(saved.version, 2);
        assert_eq!(saved.name, "Table 4b");

        let lines = f.db.orders().get_lines(&order.id).await.unwrap();
        assert_eq!(lines.len(), 2);
        assert!(lines.iter().all(|l| l.kind != ProductKind::Shot));
        assert_eq!(f.db.orders().count(OrderStatus::Pending).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_stale_tab_save_conflicts() {
        let f = fixture(5).await;
        let policy = PricingPolicy::default();
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_shot(&f.tequila).unwrap();

        let order = f
            .db
            .orders()
            .save_tab(&prepare_tab(&cart, &f.waitress, "Table 9", &policy).unwrap())
            .await
            .unwrap();

        let tab = f.db.orders().get_open_tab(&order.id).await.unwrap();
        let mut first = tab.reopen(&f.waitress.id);
        let mut second = tab.reopen(&f.cashier.id);

        first.add_special(&f.wings).unwrap();
        f.db.orders()
            .save_tab(&prepare_tab(&first, &f.waitress, "Table 9", &policy).unwrap())
            .await
            .unwrap();

        second.add_item(&f.beer).unwrap();
        let err = f
            .db
            .orders()
            .save_tab(&prepare_tab(&second, &f.cashier, "Table 9", &policy).unwrap())
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrencyConflict { .. }));

        let err = f
            .db
            .orders()
            .complete_payment(&pay(&second, &f.cashier, "Table 9"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::ConcurrencyConflict { .. }));
        assert_eq!(f.db.orders().count(OrderStatus::Paid).await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_close_out_tab_removes_it() {
        let f = fixture(5).await;
        let policy = PricingPolicy::default();
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_item(&f.beer).unwrap();

        let tab = f
            .db
            .orders()
            .save_tab(&prepare_tab(&cart, &f.waitress, "Table 2", &policy).unwrap())
            .await
            .unwrap();
        let reopened = f.db.orders().get_open_tab(&tab.id).await.unwrap().reopen(&f.waitress.id);

        let paid = f
            .db
            .orders()
            .complete_payment(&pay(&reopened, &f.waitress, "Table 2"))
            .await
            .unwrap();

        assert_ne!(paid.id, tab.id);
        assert_eq!(paid.service_fee_cents, 45);
        assert!(f.db.orders().get_order(&tab.id).await.unwrap().is_none());
        assert!(f.db.orders().get_lines(&tab.id).await.unwrap().is_empty());
        assert_eq!(f.db.orders().get_lines(&paid.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_open_tabs_scoped_per_staff() {
        let f = fixture(5).await;
        let policy = PricingPolicy::default();
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_shot(&f.tequila).unwrap();

        f.db.orders()
            .save_tab(&prepare_tab(&cart, &f.waitress, "Table 1", &policy).unwrap())
            .await
            .unwrap();
        f.db.orders()
            .save_tab(&prepare_tab(&cart, &f.cashier, "Bar 3", &policy).unwrap())
            .await
            .unwrap();

        let mine = f
            .db
            .orders()
            .list_open_tabs(TabScope::Staff(&f.waitress.id))
            .await
            .unwrap();
        assert_eq!(mine.len(), 1);
        assert_eq!(mine[0].order.name, "Table 1");
        assert_eq!(mine[0].lines.len(), 1);

        let all = f.db.orders().list_open_tabs(TabScope::All).await.unwrap();
        assert_eq!(all.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_tab() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.waitress.id);
        cart.add_special(&f.wings).unwrap();

        let tab = f
            .db
            .orders()
            .save_tab(&prepare_tab(&cart, &f.waitress, "Table 7", &PricingPolicy::default()).unwrap())
            .await
            .unwrap();

        f.db.orders().delete_tab(&tab.id).await.unwrap();
        assert!(f.db.orders().get_order(&tab.id).await.unwrap().is_none());
        assert!(f.db.orders().get_lines(&tab.id).await.unwrap().is_empty());
        assert!(matches!(
            f.db.orders().delete_tab(&tab.id).await,
            Err(DbError::NotFound { .. })
        ));
    }

    #[tokio::test]
    async fn test_paid_orders_cannot_be_deleted_as_tabs() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.cashier.id);
        cart.add_shot(&f.tequila).unwrap();

        let paid = f
            .db
            .orders()
            .complete_payment(&pay(&cart, &f.cashier, "Bar"))
            .await
            .unwrap();

        assert!(f.db.orders().delete_tab(&paid.id).await.is_err());
        assert!(f.db.orders().get_open_tab(&paid.id).await.is_err());
        assert_eq!(f.db.orders().list_paid(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_removed_product_keeps_history() {
        let f = fixture(5).await;
        let mut cart = Cart::new(&f.cashier.id);
        cart.add_shot(&f.tequila).unwrap();

        let paid = f
            .db
            .orders()
            .complete_payment(&pay(&cart, &f.cashier, "Bar"))
            .await
            .unwrap();
        f.db.catalog().delete_shot(&f.tequila.id).await.unwrap();

        let lines = f.db.orders().get_lines(&paid.id).await.unwrap();
        assert_eq!(lines[0].name, REMOVED_PRODUCT_NAME);
        assert_eq!(lines[0].kind, ProductKind::Shot);
    }

    #[tokio::test]
    async fn test_settlement_publishes_changes() {
        let f = fixture(5).await;
        let mut rx = f.db.subscribe();
        let mut cart = Cart::new(&f.cashier.id);
        cart.add_item(&f.beer).unwrap();

        f.db.orders()
            .complete_payment(&pay(&cart, &f.cashier, "Bar"))
            .await
            .unwrap();

        assert_eq!(rx.recv().await.unwrap(), Collection::Orders);
        assert_eq!(rx.recv().await.unwrap(), Collection::StockedItems);
    }
}
