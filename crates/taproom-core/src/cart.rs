//! # Cart (Order Draft)
//!
//! The in-memory collection of lines a staff member assembles before the
//! order is persisted as a tab or a paid sale.
//!
//! ## Cart Operations
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  Operation              Item line                Shot / Special line    │
//! │  ─────────              ─────────                ───────────────────    │
//! │  add_item / add_*       stock <= 0 → OutOfStock  +1 or new line, always │
//! │                         +1 > stock → Insufficient                       │
//! │  change_quantity(+d)    q+d > stock → Insufficient  q+d, always         │
//! │  change_quantity(-d)    q-d <= 0 → line removed  q-d <= 0 → removed     │
//! │  remove_line            removed                  removed                │
//! │  clear                  all lines dropped, nothing persisted            │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Invariants
//! - At most one line per `(kind, product_id)`
//! - Every line has `quantity >= 1`
//! - An item line never grows past the stock count seen at the increment
//! - A failed operation leaves the cart unchanged
//! - `unit_price_cents` is frozen when the line is first added

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::error::{CoreError, CoreResult};
use crate::money::Money;
use crate::types::{Product, ProductKind, ProductRef, Shot, Special, StockedItem};
use crate::validation::{checked_line_quantity, MAX_LINE_QUANTITY};

// =============================================================================
// Cart Line
// =============================================================================

/// One line of a cart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct CartLine {
    pub kind: ProductKind,
    pub product_id: String,
    /// Product name at time of adding (for display and receipts).
    pub name: String,
    pub quantity: i64,
    /// Unit price in cents, captured when the line was added.
    pub unit_price_cents: i64,
    #[ts(as = "String")]
    pub added_at: DateTime<Utc>,
}

impl CartLine {
    fn from_product(product: &Product) -> Self {
        CartLine {
            kind: product.kind(),
            product_id: product.id().to_string(),
            name: product.name().to_string(),
            quantity: 1,
            unit_price_cents: product.price().cents(),
            added_at: Utc::now(),
        }
    }

    #[inline]
    pub fn unit_price(&self) -> Money {
        Money::from_cents(self.unit_price_cents)
    }

    /// `quantity × unit_price`.
    #[inline]
    pub fn line_value(&self) -> Money {
        self.unit_price().multiply_quantity(self.quantity)
    }

    pub fn product_ref(&self) -> ProductRef {
        ProductRef::new(self.kind, self.product_id.clone())
    }

    fn matches(&self, key: &ProductRef) -> bool {
        self.kind == key.kind && self.product_id == key.id
    }
}

// =============================================================================
// Tab Reference
// =============================================================================

/// Where a cart came from when it was rehydrated from an open tab.
///
/// `version` is the tab's version at reopen time; saving or closing out the
/// tab fails with a concurrency conflict if someone else saved it since.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct TabRef {
    pub order_id: String,
    pub version: i64,
}

// =============================================================================
// Cart
// =============================================================================

/// A staff-local order draft.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Cart {
    pub id: String,
    /// Staff member whose session owns this cart.
    pub staff_id: String,
    pub lines: Vec<CartLine>,
    /// Set when the cart was reopened from a pending tab.
    pub origin: Option<TabRef>,
    /// Tab name carried over from a reopened tab.
    pub tab_name: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl Cart {
    /// Creates a new empty cart owned by `staff_id`.
    pub fn new(staff_id: impl Into<String>) -> Self {
        Cart {
            id: Uuid::new_v4().to_string(),
            staff_id: staff_id.into(),
            lines: Vec::new(),
            origin: None,
            tab_name: None,
            created_at: Utc::now(),
        }
    }

    /// Adds one unit of any product, dispatching on its kind.
    pub fn add(&mut self, product: &Product) -> CoreResult<&CartLine> {
        match product {
            Product::Item(item) => self.add_item(item),
            Product::Shot(shot) => self.add_shot(shot),
            Product::Special(special) => self.add_special(special),
        }
    }

    /// Adds one unit of a stocked item.
    ///
    /// ## Errors
    /// - `OutOfStock` if the item's quantity is 0 or less
    /// - `InsufficientStock` if the existing line is already at the stock count
    pub fn add_item(&mut self, item: &StockedItem) -> CoreResult<&CartLine> {
        if item.is_out_of_stock() {
            return Err(CoreError::OutOfStock {
                name: item.name.clone(),
            });
        }

        let key = ProductRef::item(item.id.clone());
        if let Some(idx) = self.position(&key) {
            let requested = checked_line_quantity(self.lines[idx].quantity, 1)?;
            if requested > item.quantity {
                return Err(CoreError::InsufficientStock {
                    name: item.name.clone(),
                    available: item.quantity,
                    requested,
                });
            }
            self.lines[idx].quantity = requested;
            return Ok(&self.lines[idx]);
        }

        Ok(self.push(CartLine::from_product(&Product::Item(item.clone()))))
    }

    /// Adds one unit of a shot. Fails only at the line quantity cap.
    pub fn add_shot(&mut self, shot: &Shot) -> CoreResult<&CartLine> {
        self.bump_or_insert(Product::Shot(shot.clone()))
    }

    /// Adds one unit of a special. Fails only at the line quantity cap.
    pub fn add_special(&mut self, special: &Special) -> CoreResult<&CartLine> {
        self.bump_or_insert(Product::Special(special.clone()))
    }

    /// Changes a line's quantity by `delta`.
    ///
    /// ## Arguments
    /// * `key` - The line to change
    /// * `delta` - Signed change
    /// * `live_stock` - Current stock count for item lines (ignored otherwise)
    ///
    /// ## Returns
    /// * `Ok(Some(line))` - The updated line
    /// * `Ok(None)` - The line reached zero and was removed
    ///
    /// A result above [`MAX_LINE_QUANTITY`] (or an overflowing `delta`) is a
    /// validation error and leaves the line as it was.
    pub fn change_quantity(
        &mut self,
        key: &ProductRef,
        delta: i64,
        live_stock: Option<i64>,
    ) -> CoreResult<Option<&CartLine>> {
        let idx = self
            .position(key)
            .ok_or_else(|| CoreError::LineNotFound(key.to_string()))?;

        let requested = checked_line_quantity(self.lines[idx].quantity, delta)?;
        if requested <= 0 {
            self.lines.remove(idx);
            return Ok(None);
        }

        if key.kind.is_stock_tracked() && delta > 0 {
            let available = live_stock.ok_or_else(|| CoreError::NotFound(key.to_string()))?;
            if requested > available {
                return Err(CoreError::InsufficientStock {
                    name: self.lines[idx].name.clone(),
                    available,
                    requested,
                });
            }
        }

        self.lines[idx].quantity = requested;
        Ok(Some(&self.lines[idx]))
    }

    /// Removes a line. Returns the removed line, if there was one.
    pub fn remove_line(&mut self, key: &ProductRef) -> Option<CartLine> {
        self.position(key).map(|idx| self.lines.remove(idx))
    }

    /// Empties the cart and forgets any tab origin.
    pub fn clear(&mut self) {
        self.lines.clear();
        self.origin = None;
        self.tab_name = None;
    }

    pub fn line(&self, key: &ProductRef) -> Option<&CartLine> {
        self.lines.iter().find(|l| l.matches(key))
    }

    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }

    pub fn line_count(&self) -> usize {
        self.lines.len()
    }

    /// Total units across all lines.
    pub fn total_quantity(&self) -> i64 {
        self.lines.iter().map(|l| l.quantity).sum()
    }

    fn position(&self, key: &ProductRef) -> Option<usize> {
        self.lines.iter().position(|l| l.matches(key))
    }

    fn push(&mut self, line: CartLine) -> &CartLine {
        self.lines.push(line);
        let last = self.lines.len() - 1;
        &self.lines[last]
    }

    fn bump_or_insert(&mut self, product: Product) -> CoreResult<&CartLine> {
        match self.position(&product.product_ref()) {
            Some(idx) => {
                self.lines[idx].quantity = checked_line_quantity(self.lines[idx].quantity, 1)?;
                Ok(&self.lines[idx])
            }
            None => Ok(self.push(CartLine::from_product(&product))),
        }
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ValidationError;

    fn beer(stock: i64) -> StockedItem {
        StockedItem {
            id: "beer".to_string(),
            name: "Beer".to_string(),
            price_cents: 450,
            category: "Beer".to_string(),
            quantity: stock,
            barcode: Some("6001".to_string()),
            low_stock_threshold: 2,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn tequila() -> Shot {
        Shot {
            id: "tequila".to_string(),
            name: "Tequila".to_string(),
            price_cents: 300,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn wings() -> Special {
        Special {
            id: "wings".to_string(),
            name: "Wings".to_string(),
            price_cents: 1250,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_scenario_a_stock_ceiling() {
        let mut cart = Cart::new("staff-1");
        let item = beer(5);

        for _ in 0..3 {
            cart.add_item(&item).unwrap();
        }
        let key = ProductRef::item("beer");
        assert_eq!(cart.line(&key).unwrap().quantity, 3);

        let err = cart.change_quantity(&key, 3, Some(item.quantity)).unwrap_err();
        assert_eq!(
            err,
            CoreError::InsufficientStock {
                name: "Beer".to_string(),
                available: 5,
                requested: 6,
            }
        );
        assert_eq!(cart.line(&key).unwrap().quantity, 3);
    }

    #[test]
    fn test_add_item_out_of_stock_leaves_cart_unchanged() {
        let mut cart = Cart::new("staff-1");
        cart.add_shot(&tequila()).unwrap();
        let before = cart.clone();

        let err = cart.add_item(&beer(0)).unwrap_err();
        assert!(matches!(err, CoreError::OutOfStock { .. }));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_add_item_never_exceeds_stock() {
        let mut cart = Cart::new("staff-1");
        let item = beer(2);
        cart.add_item(&item).unwrap();
        cart.add_item(&item).unwrap();

        let err = cart.add_item(&item).unwrap_err();
        assert!(matches!(err, CoreError::InsufficientStock { requested: 3, .. }));
        assert_eq!(cart.total_quantity(), 2);
    }

    #[test]
    fn test_quantity_never_exceeds_stock_over_any_sequence() {
        let item = beer(4);
        let key = ProductRef::item("beer");
        let deltas = [1, 2, 3, -1, 5, 2, -4, 1, 1, 1, 1, 7];

        let mut cart = Cart::new("staff-1");
        cart.add_item(&item).unwrap();
        for delta in deltas {
            let _ = cart.change_quantity(&key, delta, Some(item.quantity));
            let _ = cart.add_item(&item);
            if let Some(line) = cart.line(&key) {
                assert!(line.quantity <= item.quantity);
                assert!(line.quantity >= 1);
            }
        }
    }

    #[test]
    fn test_untracked_lines_have_no_ceiling() {
        let mut cart = Cart::new("staff-1");
        for _ in 0..50 {
            cart.add_shot(&tequila()).unwrap();
        }
        cart.add_special(&wings()).unwrap();

        let key = ProductRef::shot("tequila");
        cart.change_quantity(&key, 100, None).unwrap();
        assert_eq!(cart.line(&key).unwrap().quantity, 150);
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_overflowing_delta_is_rejected_and_cart_unchanged() {
        let mut cart = Cart::new("staff-1");
        cart.add_shot(&tequila()).unwrap();
        cart.add_item(&beer(5)).unwrap();
        let before = cart.clone();

        let err = cart
            .change_quantity(&ProductRef::shot("tequila"), i64::MAX, None)
            .unwrap_err();
        assert!(matches!(
            err,
            CoreError::Validation(ValidationError::OutOfRange { ref field, .. }) if field == "quantity"
        ));

        let err = cart
            .change_quantity(&ProductRef::item("beer"), i64::MAX, Some(i64::MAX))
            .unwrap_err();
        assert!(matches!(err, CoreError::Validation(_)));
        assert_eq!(cart, before);
    }

    #[test]
    fn test_line_quantity_is_capped() {
        let mut cart = Cart::new("staff-1");
        cart.add_special(&wings()).unwrap();
        let key = ProductRef::special("wings");

        cart.change_quantity(&key, MAX_LINE_QUANTITY - 1, None).unwrap();
        assert!(cart.add_special(&wings()).is_err());
        assert!(cart.change_quantity(&key, 1, None).is_err());
        assert_eq!(cart.line(&key).unwrap().quantity, MAX_LINE_QUANTITY);
        assert_eq!(
            cart.line(&key).unwrap().line_value(),
            Money::from_cents(1250 * MAX_LINE_QUANTITY)
        );
    }

    #[test]
    fn test_change_to_zero_removes_line() {
        let mut cart = Cart::new("staff-1");
        cart.add_item(&beer(5)).unwrap();
        cart.add_item(&beer(5)).unwrap();

        let key = ProductRef::item("beer");
        let result = cart.change_quantity(&key, -2, Some(5)).unwrap();
        assert!(result.is_none());
        assert!(cart.line(&key).is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_below_zero_removes_line() {
        let mut cart = Cart::new("staff-1");
        cart.add_special(&wings()).unwrap();

        let key = ProductRef::special("wings");
        assert!(cart.change_quantity(&key, -10, None).unwrap().is_none());
        assert!(cart.is_empty());
    }

    #[test]
    fn test_change_unknown_line_fails() {
        let mut cart = Cart::new("staff-1");
        let err = cart
            .change_quantity(&ProductRef::shot("nope"), 1, None)
            .unwrap_err();
        assert!(matches!(err, CoreError::LineNotFound(_)));
    }

    #[test]
    fn test_same_id_different_kind_are_distinct_lines() {
        let mut cart = Cart::new("staff-1");
        let mut shot = tequila();
        shot.id = "beer".to_string();

        cart.add_item(&beer(5)).unwrap();
        cart.add_shot(&shot).unwrap();
        assert_eq!(cart.line_count(), 2);
    }

    #[test]
    fn test_price_frozen_at_first_add() {
        let mut cart = Cart::new("staff-1");
        let mut item = beer(5);
        cart.add_item(&item).unwrap();

        item.price_cents = 500;
        cart.add_item(&item).unwrap();

        let line = cart.line(&ProductRef::item("beer")).unwrap();
        assert_eq!(line.quantity, 2);
        assert_eq!(line.unit_price_cents, 450);
    }

    #[test]
    fn test_remove_and_clear() {
        let mut cart = Cart::new("staff-1");
        cart.add_shot(&tequila()).unwrap();
        cart.add_special(&wings()).unwrap();

        assert!(cart.remove_line(&ProductRef::shot("tequila")).is_some());
        assert!(cart.remove_line(&ProductRef::shot("tequila")).is_none());
        assert_eq!(cart.line_count(), 1);

        cart.origin = Some(TabRef {
            order_id: "o-1".to_string(),
            version: 1,
        });
        cart.clear();
        assert!(cart.is_empty());
        assert!(cart.origin.is_none());
    }
}
