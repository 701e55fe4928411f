//! # Pricing Engine
//!
//! Pure functions that price a cart snapshot. Pricing never mutates the
//! cart and is recomputed from scratch on every display and every commit,
//! so the live cart and the persisted order cannot drift apart.
//!
//! ## Formulas
//! ```text
//! subtotal     = Σ line.quantity × line.unit_price           (exact)
//! service_fee  = subtotal × fee_rate   if role == fee_role   (rounded once)
//!              = 0                     otherwise
//! total        = subtotal + service_fee                      (exact)
//! vat_included = total - total / (1 + vat_rate)              (rounded once,
//!                                                             informational)
//! ```

use serde::{Deserialize, Serialize};
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::money::Money;
use crate::types::{Order, Rate, Role};

/// Default service fee: 10%.
pub const DEFAULT_SERVICE_FEE_BPS: u32 = 1000;

/// Default VAT rate embedded in prices: 15%.
pub const DEFAULT_VAT_BPS: u32 = 1500;

// =============================================================================
// Policy
// =============================================================================

/// Venue pricing configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PricingPolicy {
    /// Fee charged on the subtotal for eligible staff.
    pub service_fee_rate: Rate,
    /// The staff role whose orders carry the service fee.
    pub service_fee_role: Role,
    /// VAT rate already included in catalog prices.
    pub vat_rate: Rate,
}

impl Default for PricingPolicy {
    fn default() -> Self {
        PricingPolicy {
            service_fee_rate: Rate::from_bps(DEFAULT_SERVICE_FEE_BPS),
            service_fee_role: Role::Waitress,
            vat_rate: Rate::from_bps(DEFAULT_VAT_BPS),
        }
    }
}

impl PricingPolicy {
    /// Prices a cart for a caller with `role`.
    pub fn price_cart(&self, cart: &Cart, role: Role) -> PricingResult {
        self.price_lines(&cart.lines, role)
    }

    /// Prices a set of lines for a caller with `role`.
    pub fn price_lines(&self, lines: &[CartLine], role: Role) -> PricingResult {
        let subtotal = subtotal(lines);
        let service_fee = self.service_fee(subtotal, role);
        self.finish(subtotal, service_fee)
    }

    /// Rebuilds the pricing of an already persisted order.
    ///
    /// The stored fee is authoritative; only the VAT portion is derived.
    pub fn price_order(&self, order: &Order) -> PricingResult {
        self.finish(order.subtotal(), order.service_fee())
    }

    /// The service fee owed on `subtotal` by a caller with `role`.
    pub fn service_fee(&self, subtotal: Money, role: Role) -> Money {
        if role == self.service_fee_role {
            subtotal.apply_rate(self.service_fee_rate)
        } else {
            Money::zero()
        }
    }

    fn finish(&self, subtotal: Money, service_fee: Money) -> PricingResult {
        let total = subtotal + service_fee;
        PricingResult {
            subtotal_cents: subtotal.cents(),
            service_fee_cents: service_fee.cents(),
            total_cents: total.cents(),
            vat_inclusive_cents: total.inclusive_portion(self.vat_rate).cents(),
        }
    }
}

/// `Σ quantity × unit_price` over the lines.
pub fn subtotal(lines: &[CartLine]) -> Money {
    lines.iter().map(CartLine::line_value).sum()
}

// =============================================================================
// Result
// =============================================================================

/// A priced snapshot of a cart.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct PricingResult {
    pub subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
    /// Tax contained in the total. Not charged separately, not persisted.
    pub vat_inclusive_cents: i64,
}

impl PricingResult {
    #[inline]
    pub fn subtotal(&self) -> Money {
        Money::from_cents(self.subtotal_cents)
    }

    #[inline]
    pub fn service_fee(&self) -> Money {
        Money::from_cents(self.service_fee_cents)
    }

    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn vat_inclusive(&self) -> Money {
        Money::from_cents(self.vat_inclusive_cents)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
