//! # Order Lifecycle
//!
//! The pure half of settlement: turning a cart into a commit request, and
//! turning a persisted tab back into a cart.
//!
//! ## State Machine
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │   ┌─────────┐  save_tab   ┌───────────┐  complete_payment  ┌────────┐  │
//! │   │  Draft  │────────────►│  Pending  │───────────────────►│  Paid  │  │
//! │   │ (cart)  │◄────────────│   (tab)   │                    │(final) │  │
//! │   └────┬────┘   reopen    └─────┬─────┘                    └────────┘  │
//! │        │                        │ delete_tab                    ▲       │
//! │        │                        ▼                               │       │
//! │        │                    (removed)                           │       │
//! │        └────────────────── complete_payment ────────────────────┘       │
//! │                                                                         │
//! │  clear() on a Draft leaves no trace.                                    │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The store-side half (transactions, stock decrement) lives in
//! `taproom-db`; this module only decides *what* gets written.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use ts_rs::TS;

use crate::cart::{Cart, CartLine, TabRef};
use crate::error::{CoreResult, ValidationError};
use crate::pricing::{PricingPolicy, PricingResult};
use crate::types::{Order, OrderLine, PaymentMethod, ProductKind, Staff};
use crate::validation::validate_tab_name;

/// Why a tab was reopened. Both purposes rehydrate the same cart; they
/// only differ in which settlement the caller runs next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ReopenPurpose {
    Edit,
    Payment,
}

// =============================================================================
// Commit Requests
// =============================================================================

/// Everything needed to write a pending tab.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TabCommit {
    pub name: String,
    /// Staff recorded on the order and on every line.
    pub staff_id: String,
    pub lines: Vec<CartLine>,
    pub pricing: PricingResult,
    /// The tab being replaced, if the cart was reopened from one.
    pub origin: Option<TabRef>,
}

/// Everything needed to write a paid order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PaymentCommit {
    pub name: String,
    pub staff_id: String,
    pub method: PaymentMethod,
    pub lines: Vec<CartLine>,
    pub pricing: PricingResult,
    /// The tab being closed out, if any. It is removed once the paid
    /// order is written.
    pub origin: Option<TabRef>,
}

impl PaymentCommit {
    /// Units to take out of stock, per stocked item.
    pub fn stock_requirements(&self) -> Vec<(String, i64)> {
        stock_requirements(&self.lines)
    }
}

/// Builds a tab commit from the cart.
///
/// ## Errors
/// - `ValidationError::Required` for a blank tab name
/// - `ValidationError::EmptyCart` for a cart with no lines
pub fn prepare_tab(
    cart: &Cart,
    staff: &Staff,
    tab_name: &str,
    policy: &PricingPolicy,
) -> CoreResult<TabCommit> {
    let name = validate_tab_name(tab_name)?;
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    Ok(TabCommit {
        name,
        staff_id: staff.id.clone(),
        lines: cart.lines.clone(),
        pricing: policy.price_cart(cart, staff.role),
        origin: cart.origin.clone(),
    })
}

/// Builds a payment commit from the cart.
///
/// A blank `tab_name` falls back to `walk_in_name`.
///
/// ## Errors
/// - `ValidationError::Required` when no payment method was chosen
/// - `ValidationError::EmptyCart` for a cart with no lines
pub fn prepare_payment(
    cart: &Cart,
    staff: &Staff,
    tab_name: &str,
    method: Option<PaymentMethod>,
    walk_in_name: &str,
    policy: &PricingPolicy,
) -> CoreResult<PaymentCommit> {
    let method = method.ok_or_else(|| ValidationError::Required {
        field: "payment method".to_string(),
    })?;
    if cart.is_empty() {
        return Err(ValidationError::EmptyCart.into());
    }

    let name = if tab_name.trim().is_empty() {
        validate_tab_name(walk_in_name)?
    } else {
        validate_tab_name(tab_name)?
    };

    Ok(PaymentCommit {
        name,
        staff_id: staff.id.clone(),
        method,
        lines: cart.lines.clone(),
        pricing: policy.price_cart(cart, staff.role),
        origin: cart.origin.clone(),
    })
}

/// Sums item-line quantities per stocked item, sorted by id so that
/// concurrent settlements touch rows in the same order.
pub fn stock_requirements(lines: &[CartLine]) -> Vec<(String, i64)> {
    let mut needed: BTreeMap<String, i64> = BTreeMap::new();
    for line in lines.iter().filter(|l| l.kind == ProductKind::Item) {
        *needed.entry(line.product_id.clone()).or_default() += line.quantity;
    }
    needed.into_iter().collect()
}

// =============================================================================
// Open Tabs
// =============================================================================

/// A pending order together with its lines from all three collections.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OpenTab {
    pub order: Order,
    pub lines: Vec<OrderLine>,
}

impl OpenTab {
    /// Lines in cart shape, tagged with their kind.
    pub fn cart_lines(&self) -> Vec<CartLine> {
        self.lines
            .iter()
            .map(|l| CartLine {
                kind: l.kind,
                product_id: l.product_id.clone(),
                name: l.name.clone(),
                quantity: l.quantity,
                unit_price_cents: l.price_at_time_cents,
                added_at: l.created_at,
            })
            .collect()
    }

    /// Rehydrates the tab into a fresh cart owned by `staff_id`.
    ///
    /// The cart remembers the tab (id and version) so the next save replaces
    /// it and a payment closes it out.
    pub fn reopen(&self, staff_id: impl Into<String>) -> Cart {
        let mut cart = Cart::new(staff_id);
        cart.lines = self.cart_lines();
        cart.origin = Some(TabRef {
            order_id: self.order.id.clone(),
            version: self.order.version,
        });
        cart.tab_name = Some(self.order.name.clone());
        cart
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
