//! # Cart Operations
//!
//! ## Live Stock
//! Adds and increments of stocked items check the count in the store at the
//! moment of the change, not the snapshot in the read model. Shots and
//! specials have no ceiling.
//!
//! ```text
//! mutate_cart(cart_id, staff, Add(item))
//!      │
//!      ├──► db.catalog().get_item(id)   fresh quantity + price
//!      │
//!      └──► lock cart ──► Cart::add_item ──► unlock
//!                          │
//!                          └── OutOfStock / InsufficientStock: cart unchanged
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;
use ts_rs::TS;

use taproom_core::{Cart, CoreError, PricingResult, Product, ProductKind, ProductRef, Staff};

use super::PosService;
use crate::error::{ApiResult, Operation};

/// A single change to a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "op", content = "args", rename_all = "snake_case")]
pub enum CartOp {
    /// Add one unit of an explicitly selected product.
    Add(ProductRef),

    /// Add one unit of whatever the code resolves to.
    AddByCode(String),

    /// Change a line's quantity by a signed delta. Reaching zero removes it.
    ChangeQuantity { product: ProductRef, delta: i64 },

    /// Remove a line, if present.
    Remove(ProductRef),

    /// Empty the cart. Nothing is persisted.
    Clear,
}

impl CartOp {
    fn operation(&self) -> &'static str {
        match self {
            CartOp::Add(_) | CartOp::AddByCode(_) => "add to cart",
            CartOp::ChangeQuantity { .. } => "change quantity",
            CartOp::Remove(_) => "remove line",
            CartOp::Clear => "clear cart",
        }
    }
}

impl PosService {
    /// Opens an empty cart owned by the caller.
    pub async fn open_cart(&self, staff: &Staff) -> Cart {
        self.carts.insert(Cart::new(staff.id.clone())).await
    }

    pub async fn get_cart(&self, cart_id: &str, staff: &Staff) -> ApiResult<Cart> {
        self.carts.snapshot(cart_id, staff).await
    }

    /// Abandons the caller's cart. Nothing is persisted and a reopened tab
    /// stays as it was last saved.
    pub async fn discard_cart(&self, cart_id: &str, staff: &Staff) -> ApiResult<()> {
        let cart = self.carts.take(cart_id, staff).await.during("discard cart")?;
        self.close_cart(&cart.id).await;
        debug!(cart_id = %cart_id, lines = cart.line_count(), "Cart discarded");
        Ok(())
    }

    /// Applies one operation and returns the updated cart.
    ///
    /// On error the cart is unchanged.
    pub async fn mutate_cart(&self, cart_id: &str, staff: &Staff, op: CartOp) -> ApiResult<Cart> {
        debug!(cart_id = %cart_id, staff_id = %staff.id, ?op, "mutate_cart");
        let operation = op.operation();
        self.apply(cart_id, staff, op).await.during(operation)
    }

    /// Prices the cart for the caller's role. Never mutates the cart.
    pub async fn price_cart(&self, cart_id: &str, staff: &Staff) -> ApiResult<PricingResult> {
        self.carts
            .with_cart(cart_id, staff, |cart| self.policy.price_cart(cart, staff.role))
            .await
    }

    async fn apply(&self, cart_id: &str, staff: &Staff, op: CartOp) -> ApiResult<Cart> {
        match op {
            CartOp::Add(key) => {
                let product = self.live_product(&key).await?;
                self.add_product(cart_id, staff, product).await
            }
            CartOp::AddByCode(code) => {
                let found = self.catalog.lookup_code(&code).await?;
                let product = self.live_product(&found.product_ref()).await?;
                self.add_product(cart_id, staff, product).await
            }
            CartOp::ChangeQuantity { product, delta } => {
                let live_stock = if product.kind.is_stock_tracked() && delta > 0 {
                    self.db
                        .catalog()
                        .get_item(&product.id)
                        .await?
                        .map(|item| item.quantity)
                } else {
                    None
                };

                let cart = self
                    .carts
                    .with_cart_mut(cart_id, staff, |cart| {
                        cart.change_quantity(&product, delta, live_stock)?;
                        Ok::<_, CoreError>(cart.clone())
                    })
                    .await??;
                Ok(cart)
            }
            CartOp::Remove(product) => {
                self.carts
                    .with_cart_mut(cart_id, staff, |cart| {
                        if cart.remove_line(&product).is_none() {
                            debug!(product = %product, "No line to remove");
                        }
                        cart.clone()
                    })
                    .await
            }
            CartOp::Clear => {
                self.carts
                    .with_cart_mut(cart_id, staff, |cart| {
                        cart.clear();
                        cart.clone()
                    })
                    .await
            }
        }
    }

    async fn add_product(&self, cart_id: &str, staff: &Staff, product: Product) -> ApiResult<Cart> {
        let cart = self
            .carts
            .with_cart_mut(cart_id, staff, |cart| {
                cart.add(&product)?;
                Ok::<_, CoreError>(cart.clone())
            })
            .await??;
        Ok(cart)
    }

    /// Resolves a selection, reading stocked items straight from the store
    /// so the stock check uses the live count.
    async fn live_product(&self, key: &ProductRef) -> ApiResult<Product> {
        match key.kind {
            ProductKind::Item => {
                let item = self
                    .db
                    .catalog()
                    .get_item(&key.id)
                    .await?
                    .ok_or_else(|| CoreError::NotFound(key.to_string()))?;
                Ok(Product::Item(item))
            }
            ProductKind::Shot | ProductKind::Special => Ok(self.catalog.resolve(key).await?),
        }
    }
}
