//! # Cart Sessions
//!
//! Open carts, keyed by cart ID.
//!
//! ## Ownership
//! A cart belongs to the staff member who opened (or reopened) it. Every
//! access checks the caller's identity, so one session can never touch
//! another session's draft.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Cart Session Operations                              │
//! │                                                                         │
//! │  open_cart / reopen_tab ─────► insert(cart)                             │
//! │  reopen_tab (again) ─────────► find_reopened(order_id, staff)           │
//! │                                                                         │
//! │  mutate_cart ────────────────► with_cart_mut(id, staff, |c| ...)        │
//! │                                                                         │
//! │  price_cart / get_cart ──────► with_cart(id, staff, |c| ...)            │
//! │                                                                         │
//! │  save_tab / complete_payment ► snapshot, commit, then remove(id)        │
//! │                                                                         │
//! │  discard_cart ───────────────► take(id, staff)                          │
//! │                                                                         │
//! │  NOTE: the lock is never held across a database call.                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::Mutex;
use tracing::debug;

use taproom_core::{Cart, Staff};

use crate::error::{ApiError, ApiResult};

/// Shared map of open carts.
#[derive(Debug, Clone, Default)]
pub struct CartSessions {
    carts: Arc<Mutex<HashMap<String, Cart>>>,
}

impl CartSessions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a cart and returns a copy of it.
    pub async fn insert(&self, cart: Cart) -> Cart {
        debug!(cart_id = %cart.id, staff_id = %cart.staff_id, "Cart session opened");
        let copy = cart.clone();
        self.carts.lock().await.insert(cart.id.clone(), cart);
        copy
    }

    /// Executes a function with read access to the caller's cart.
    pub async fn with_cart<F, R>(&self, cart_id: &str, staff: &Staff, f: F) -> ApiResult<R>
    where
        F: FnOnce(&Cart) -> R,
    {
        let carts = self.carts.lock().await;
        let cart = owned(carts.get(cart_id), cart_id, staff)?;
        Ok(f(cart))
    }

    /// Executes a function with write access to the caller's cart.
    pub async fn with_cart_mut<F, R>(&self, cart_id: &str, staff: &Staff, f: F) -> ApiResult<R>
    where
        F: FnOnce(&mut Cart) -> R,
    {
        let mut carts = self.carts.lock().await;
        let cart = carts
            .get_mut(cart_id)
            .filter(|c| c.staff_id == staff.id)
            .ok_or_else(|| ApiError::not_found("Cart", cart_id))?;
        Ok(f(cart))
    }

    /// A copy of the caller's cart.
    pub async fn snapshot(&self, cart_id: &str, staff: &Staff) -> ApiResult<Cart> {
        self.with_cart(cart_id, staff, Cart::clone).await
    }

    /// The caller's cart that was reopened from tab `order_id`, if one is open.
    pub async fn find_reopened(&self, order_id: &str, staff: &Staff) -> Option<Cart> {
        self.carts
            .lock()
            .await
            .values()
            .find(|c| {
                c.staff_id == staff.id
                    && c.origin.as_ref().is_some_and(|o| o.order_id == order_id)
            })
            .cloned()
    }

    /// Removes the caller's cart and returns it.
    pub async fn take(&self, cart_id: &str, staff: &Staff) -> ApiResult<Cart> {
        let mut carts = self.carts.lock().await;
        owned(carts.get(cart_id), cart_id, staff)?;
        let cart = carts
            .remove(cart_id)
            .ok_or_else(|| ApiError::not_found("Cart", cart_id))?;
        debug!(cart_id = %cart_id, "Cart session discarded");
        Ok(cart)
    }

    /// Discards a cart. Returns whether it existed.
    pub async fn remove(&self, cart_id: &str) -> bool {
        let removed = self.carts.lock().await.remove(cart_id).is_some();
        if removed {
            debug!(cart_id = %cart_id, "Cart session closed");
        }
        removed
    }

    /// Number of open carts.
    pub async fn len(&self) -> usize {
        self.carts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.carts.lock().await.is_empty()
    }
}

fn owned<'a>(cart: Option<&'a Cart>, cart_id: &str, staff: &Staff) -> ApiResult<&'a Cart> {
    cart.filter(|c| c.staff_id == staff.id)
        .ok_or_else(|| ApiError::not_found("Cart", cart_id))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorCode;
    use taproom_core::{Role, TabRef};

    fn waitress() -> Staff {
        Staff::new("staff-1", "Grace", Role::Waitress)
    }

    #[tokio::test]
    async fn test_insert_and_snapshot() {
        let sessions = CartSessions::new();
        let cart = sessions.insert(Cart::new("staff-1")).await;

        let copy = sessions.snapshot(&cart.id, &waitress()).await.unwrap();
        assert_eq!(copy.id, cart.id);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn test_other_staff_cannot_see_cart() {
        let sessions = CartSessions::new();
        let cart = sessions.insert(Cart::new("staff-1")).await;
        let other = Staff::new("staff-2", "Tendai", Role::Cashier);

        let err = sessions.snapshot(&cart.id, &other).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);

        let err = sessions
            .with_cart_mut(&cart.id, &other, |c| c.clear())
            .await
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
    }

    #[tokio::test]
    async fn test_take_checks_owner() {
        let sessions = CartSessions::new();
        let cart = sessions.insert(Cart::new("staff-1")).await;
        let other = Staff::new("staff-2", "Tendai", Role::Cashier);

        let err = sessions.take(&cart.id, &other).await.unwrap_err();
        assert_eq!(err.code, ErrorCode::NotFound);
        assert_eq!(sessions.len().await, 1);

        let taken = sessions.take(&cart.id, &waitress()).await.unwrap();
        assert_eq!(taken.id, cart.id);
        assert!(sessions.is_empty().await);
    }

    #[tokio::test]
    async fn test_find_reopened_is_per_staff() {
        let sessions = CartSessions::new();
        let mut reopened = Cart::new("staff-1");
        reopened.origin = Some(TabRef {
            order_id: "order-1".to_string(),
            version: 1,
        });
        let reopened = sessions.insert(reopened).await;
        sessions.insert(Cart::new("staff-1")).await;

        let found = sessions.find_reopened("order-1", &waitress()).await.unwrap();
        assert_eq!(found.id, reopened.id);
        assert!(sessions.find_reopened("order-2", &waitress()).await.is_none());

        let other = Staff::new("staff-2", "Tendai", Role::Cashier);
        assert!(sessions.find_reopened("order-1", &other).await.is_none());
    }

    #[tokio::test]
    async fn test_remove() {
        let sessions = CartSessions::new();
        let cart = sessions.insert(Cart::new("staff-1")).await;

        assert!(sessions.remove(&cart.id).await);
        assert!(!sessions.remove(&cart.id).await);
        assert!(sessions.is_empty().await);
    }
}
