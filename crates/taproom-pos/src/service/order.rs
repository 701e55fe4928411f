//! # Tabs and Settlement
//!
//! ## Save vs. Pay
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  save_tab(cart, name)                complete_payment(cart, name, how) │
//! │      │                                   │                              │
//! │      ▼                                   ▼                              │
//! │  prepare_tab                         prepare_payment                    │
//! │  (name + lines required)             (method + lines required,          │
//! │      │                                blank name → walk-in name)        │
//! │      ▼                                   ▼                              │
//! │  OrderRepository::save_tab           OrderRepository::complete_payment  │
//! │  (one transaction)                   (one transaction, stock decrement, │
//! │      │                                origin tab removed)               │
//! │      ▼                                   ▼                              │
//! │  cart discarded                      cart discarded                     │
//! │  provisional receipt                 final receipt                      │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! The cart is only discarded after the store commits. A failed save or
//! payment leaves it exactly as it was, so the operator can fix and retry.

use tracing::{debug, info};

use taproom_core::order::{prepare_payment, prepare_tab};
use taproom_core::{
    Cart, OpenTab, PaymentMethod, ReceiptRequest, ReopenPurpose, Staff,
};
use taproom_db::TabScope;

use super::PosService;
use crate::error::{ApiError, ApiResult, Operation};

impl PosService {
    /// Persists the caller's cart as a pending tab and closes the cart.
    ///
    /// A cart reopened from a tab replaces that tab's lines.
    ///
    /// ## Returns
    /// The order ID of the tab.
    pub async fn save_tab(&self, cart_id: &str, staff: &Staff, tab_name: &str) -> ApiResult<String> {
        const OP: &str = "save tab";
        debug!(cart_id = %cart_id, staff_id = %staff.id, "save_tab");

        let cart = self.carts.snapshot(cart_id, staff).await.during(OP)?;
        let commit = prepare_tab(&cart, staff, tab_name, &self.policy).during(OP)?;
        let order = self.db.orders().save_tab(&commit).await.during(OP)?;

        self.close_cart(cart_id).await;
        self.print(&ReceiptRequest::from_cart(
            &cart,
            &commit.name,
            &staff.display_name,
            &commit.pricing,
            None,
        ));

        info!(
            order_id = %order.id,
            staff_id = %staff.id,
            total_cents = order.total_cents,
            "Tab saved"
        );
        Ok(order.id)
    }

    /// Settles the caller's cart: a paid order is written and stocked items
    /// are taken out of stock. A cart reopened from a tab closes that tab.
    ///
    /// ## Errors
    /// - `VALIDATION_ERROR` for a missing method or an empty cart
    /// - `INSUFFICIENT_STOCK` if any item ran out since it was added
    /// - `CONCURRENCY_CONFLICT` if the origin tab changed since it was reopened
    ///
    /// ## Returns
    /// The order ID of the paid order.
    pub async fn complete_payment(
        &self,
        cart_id: &str,
        staff: &Staff,
        tab_name: &str,
        method: Option<PaymentMethod>,
    ) -> ApiResult<String> {
        const OP: &str = "complete payment";
        debug!(cart_id = %cart_id, staff_id = %staff.id, ?method, "complete_payment");

        let cart = self.carts.snapshot(cart_id, staff).await.during(OP)?;
        let commit = prepare_payment(
            &cart,
            staff,
            tab_name,
            method,
            &self.config.receipt.walk_in_name,
            &self.policy,
        )
        .during(OP)?;
        let order = self.db.orders().complete_payment(&commit).await.during(OP)?;

        self.close_cart(cart_id).await;
        self.print(&ReceiptRequest::from_cart(
            &cart,
            &commit.name,
            &staff.display_name,
            &commit.pricing,
            Some(commit.method),
        ));

        info!(
            order_id = %order.id,
            staff_id = %staff.id,
            method = %commit.method,
            total_cents = order.total_cents,
            "Payment completed"
        );
        Ok(order.id)
    }

    /// Deletes an open tab and its lines. Irreversible.
    pub async fn delete_tab(&self, order_id: &str, staff: &Staff) -> ApiResult<()> {
        const OP: &str = "delete tab";
        self.visible_tab(order_id, staff).await.during(OP)?;
        self.db.orders().delete_tab(order_id).await.during(OP)?;

        info!(order_id = %order_id, staff_id = %staff.id, "Tab deleted");
        Ok(())
    }

    /// Open tabs the caller may see: their own, or every tab when tabs are
    /// shared.
    pub async fn list_open_tabs(&self, staff: &Staff) -> ApiResult<Vec<OpenTab>> {
        let scope = if self.config.tabs.shared {
            TabScope::All
        } else {
            TabScope::Staff(&staff.id)
        };
        self.db
            .orders()
            .list_open_tabs(scope)
            .await
            .during("list open tabs")
    }

    /// Rehydrates an open tab into a cart owned by the caller.
    ///
    /// Edit and payment reopen identically; the purpose only decides which
    /// operation the caller runs next.
    ///
    /// Reopening a tab the caller already has open returns that cart, edits
    /// included. If the tab was saved since, the old cart is closed and a
    /// fresh one is built from the current version.
    pub async fn reopen_tab(
        &self,
        order_id: &str,
        purpose: ReopenPurpose,
        staff: &Staff,
    ) -> ApiResult<Cart> {
        let tab = self.visible_tab(order_id, staff).await.during("reopen tab")?;

        if let Some(existing) = self.carts.find_reopened(order_id, staff).await {
            let current = existing
                .origin
                .as_ref()
                .is_some_and(|o| o.version == tab.order.version);
            if current {
                debug!(order_id = %order_id, cart_id = %existing.id, "Tab already open");
                return Ok(existing);
            }
            self.close_cart(&existing.id).await;
        }

        let cart = self.carts.insert(tab.reopen(staff.id.clone())).await;

        info!(
            order_id = %order_id,
            cart_id = %cart.id,
            ?purpose,
            lines = cart.line_count(),
            "Tab reopened"
        );
        Ok(cart)
    }

    /// Prints a provisional bill for an open tab from its persisted lines.
    pub async fn reprint_tab(&self, order_id: &str, staff: &Staff) -> ApiResult<ReceiptRequest> {
        let tab = self.visible_tab(order_id, staff).await.during("reprint tab")?;
        let receipt = ReceiptRequest::from_tab(&tab, &staff.display_name, &self.policy);
        self.print(&receipt);
        Ok(receipt)
    }

    async fn visible_tab(&self, order_id: &str, staff: &Staff) -> ApiResult<OpenTab> {
        let tab = self.db.orders().get_open_tab(order_id).await?;
        if !self.config.tabs.shared && tab.order.staff_id != staff.id {
            return Err(ApiError::not_found("Open tab", order_id));
        }
        Ok(tab)
    }

    pub(super) async fn close_cart(&self, cart_id: &str) {
        self.carts.remove(cart_id).await;
        self.scanner.forget(cart_id).await;
    }
}
