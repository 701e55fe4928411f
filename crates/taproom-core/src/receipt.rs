//! # Receipts
//!
//! Builds the printable summary of a cart or a persisted order and renders
//! it as fixed-width text for a thermal printer.
//!
//! ```text
//! ┌────────────────────────────────┐
//! │          THE TAPROOM           │
//! │ Tab: Table 4                   │
//! │ Served by: Wanjiru             │
//! │ ------------------------------ │
//! │ 2 x Beer               K9.00   │
//! │ 1 x Tequila            K3.00   │
//! │ ------------------------------ │
//! │ Subtotal              K12.00   │
//! │ Service fee            K1.20   │
//! │ TOTAL                 K13.20   │
//! │ VAT incl.              K1.72   │
//! │ *** PROVISIONAL ***            │
//! └────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::Write as _;
use ts_rs::TS;

use crate::cart::{Cart, CartLine};
use crate::money::Money;
use crate::order::OpenTab;
use crate::pricing::{PricingPolicy, PricingResult};
use crate::types::{Order, OrderLine, PaymentMethod};

/// Printable width in characters (58mm paper).
pub const RECEIPT_WIDTH: usize = 32;

/// One printed line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptLine {
    pub name: String,
    pub quantity: i64,
    pub unit_price_cents: i64,
    pub line_value_cents: i64,
}

impl From<&CartLine> for ReceiptLine {
    fn from(line: &CartLine) -> Self {
        ReceiptLine {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.unit_price_cents,
            line_value_cents: line.line_value().cents(),
        }
    }
}

impl From<&OrderLine> for ReceiptLine {
    fn from(line: &OrderLine) -> Self {
        ReceiptLine {
            name: line.name.clone(),
            quantity: line.quantity,
            unit_price_cents: line.price_at_time_cents,
            line_value_cents: line.line_value().cents(),
        }
    }
}

/// Everything a receipt printer needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ReceiptRequest {
    pub tab_name: String,
    pub staff_name: String,
    pub lines: Vec<ReceiptLine>,
    pub subtotal_cents: i64,
    pub service_fee_cents: i64,
    pub total_cents: i64,
    pub vat_inclusive_cents: i64,
    pub payment_method: Option<PaymentMethod>,
    /// `false` for a provisional bill printed from an open tab.
    pub is_final: bool,
    #[ts(as = "String")]
    pub printed_at: DateTime<Utc>,
}

impl ReceiptRequest {
    /// Receipt for a cart priced with `pricing`.
    pub fn from_cart(
        cart: &Cart,
        tab_name: &str,
        staff_name: &str,
        pricing: &PricingResult,
        payment_method: Option<PaymentMethod>,
    ) -> Self {
        ReceiptRequest {
            tab_name: tab_name.to_string(),
            staff_name: staff_name.to_string(),
            lines: cart.lines.iter().map(ReceiptLine::from).collect(),
            subtotal_cents: pricing.subtotal_cents,
            service_fee_cents: pricing.service_fee_cents,
            total_cents: pricing.total_cents,
            vat_inclusive_cents: pricing.vat_inclusive_cents,
            payment_method,
            is_final: payment_method.is_some(),
            printed_at: Utc::now(),
        }
    }

    /// Receipt for a persisted order. Totals come from the stored order.
    pub fn from_order(
        order: &Order,
        lines: &[OrderLine],
        staff_name: &str,
        policy: &PricingPolicy,
    ) -> Self {
        let pricing = policy.price_order(order);
        ReceiptRequest {
            tab_name: order.name.clone(),
            staff_name: staff_name.to_string(),
            lines: lines.iter().map(ReceiptLine::from).collect(),
            subtotal_cents: pricing.subtotal_cents,
            service_fee_cents: pricing.service_fee_cents,
            total_cents: pricing.total_cents,
            vat_inclusive_cents: pricing.vat_inclusive_cents,
            payment_method: order.payment_method,
            is_final: !order.is_pending(),
            printed_at: Utc::now(),
        }
    }

    /// Provisional bill for an open tab.
    pub fn from_tab(tab: &OpenTab, staff_name: &str, policy: &PricingPolicy) -> Self {
        Self::from_order(&tab.order, &tab.lines, staff_name, policy)
    }

    /// Renders the receipt as plain text, one `\n`-terminated row each.
    pub fn render(&self, venue_name: &str, currency_prefix: &str) -> String {
        let money = |cents: i64| Money::from_cents(cents).format_with_prefix(currency_prefix);
        let rule = "-".repeat(RECEIPT_WIDTH);
        let mut out = String::new();

        let _ = writeln!(out, "{:^width$}", venue_name, width = RECEIPT_WIDTH);
        let _ = writeln!(out, "Tab: {}", self.tab_name);
        let _ = writeln!(out, "Served by: {}", self.staff_name);
        let _ = writeln!(out, "{}", self.printed_at.format("%Y-%m-%d %H:%M"));
        let _ = writeln!(out, "{}", rule);

        for line in &self.lines {
            let label = format!("{} x {}", line.quantity, line.name);
            out.push_str(&columns(&label, &money(line.line_value_cents)));
        }

        let _ = writeln!(out, "{}", rule);
        out.push_str(&columns("Subtotal", &money(self.subtotal_cents)));
        if self.service_fee_cents != 0 {
            out.push_str(&columns("Service fee", &money(self.service_fee_cents)));
        }
        out.push_str(&columns("TOTAL", &money(self.total_cents)));
        out.push_str(&columns("VAT incl.", &money(self.vat_inclusive_cents)));

        match (self.is_final, self.payment_method) {
            (true, Some(method)) => {
                let _ = writeln!(out, "Paid by {}", method);
            }
            (true, None) => {}
            (false, _) => {
                let _ = writeln!(out, "*** PROVISIONAL ***");
            }
        }

        out
    }
}

/// Left label, right-aligned amount. Long labels are cut to fit.
fn columns(label: &str, amount: &str) -> String {
    let room = RECEIPT_WIDTH.saturating_sub(amount.chars().count() + 1);
    let label: String = label.chars().take(room).collect();
    format!(
        "{}{:>width$}\n",
        label,
        amount,
        width = RECEIPT_WIDTH - label.chars().count()
    )
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{ProductKind, Role};

    fn cart() -> Cart {
        let mut cart = Cart::new("staff-w");
        cart.lines.push(CartLine {
            kind: ProductKind::Item,
            product_id: "beer".to_string(),
            name: "Beer".to_string(),
            quantity: 2,
            unit_price_cents: 450,
            added_at: Utc::now(),
        });
        cart.lines.push(CartLine {
            kind: ProductKind::Shot,
            product_id: "tequila".to_string(),
            name: "Tequila".to_string(),
            quantity: 1,
            unit_price_cents: 300,
            added_at: Utc::now(),
        });
        cart
    }

    #[test]
    fn test_provisional_receipt_from_cart() {
        let cart = cart();
        let pricing = PricingPolicy::default().price_cart(&cart, Role::Waitress);
        let receipt = ReceiptRequest::from_cart(&cart, "Table 4", "Wanjiru", &pricing, None);

        assert!(!receipt.is_final);
        assert_eq!(receipt.lines.len(), 2);
        assert_eq!(receipt.lines[0].line_value_cents, 900);
        assert_eq!(receipt.total_cents, 1_320);

        let text = receipt.render("THE TAPROOM", "K");
        assert!(text.contains("Tab: Table 4"));
        assert!(text.contains("2 x Beer"));
        assert!(text.contains("K9.00"));
        assert!(text.contains("Service fee"));
        assert!(text.contains("K13.20"));
        assert!(text.contains("VAT incl."));
        assert!(text.contains("PROVISIONAL"));
    }

    #[test]
    fn test_final_receipt_shows_method_and_no_fee_row() {
        let cart = cart();
        let pricing = PricingPolicy::default().price_cart(&cart, Role::Cashier);
        let receipt = ReceiptRequest::from_cart(
            &cart,
            "Walk-in",
            "Tom",
            &pricing,
            Some(PaymentMethod::Cash),
        );

        let text = receipt.render("THE TAPROOM", "K");
        assert!(receipt.is_final);
        assert!(!text.contains("Service fee"));
        assert!(text.contains("VAT incl."));
        assert!(text.contains("Paid by cash"));
    }

    #[test]
    fn test_rows_fit_the_paper() {
        let mut cart = cart();
        cart.lines[0].name = "An extremely long imported craft lager name".to_string();
        let pricing = PricingPolicy::default().price_cart(&cart, Role::Cashier);
        let text = ReceiptRequest::from_cart(&cart, "T", "S", &pricing, None).render("V", "K");

        for row in text.lines().filter(|r| r.contains('K')) {
            assert!(row.chars().count() <= RECEIPT_WIDTH, "row too wide: {row}");
        }
    }
}
