//! # Domain Types
//!
//! Core domain types used throughout Taproom POS.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  Product (sum type, never unioned in storage)                           │
//! │  ├── Item(StockedItem)   finite quantity, barcode-addressable           │
//! │  ├── Shot(Shot)          unlimited, may carry a barcode                 │
//! │  └── Special(Special)    unlimited, never scanned                       │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │     Order       │   │   OrderLine     │   │     Staff       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id / name      │   │  kind (table)   │   │  id             │       │
//! │  │  status         │   │  product_id     │   │  display_name   │       │
//! │  │  payment_method │   │  quantity       │   │  role           │       │
//! │  │  total / fee    │   │  price_at_time  │   │                 │       │
//! │  │  version        │   │  staff_id       │   │                 │       │
//! │  └─────────────────┘   └─────────────────┘   └─────────────────┘       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use ts_rs::TS;

use crate::error::ValidationError;
use crate::money::Money;

// =============================================================================
// Rate
// =============================================================================

/// A percentage represented in basis points (bps).
///
/// 1 basis point = 0.01%, so 1000 bps = 10% (service fee) and
/// 1500 bps = 15% (VAT).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
pub struct Rate(u32);

impl Rate {
    #[inline]
    pub const fn from_bps(bps: u32) -> Self {
        Rate(bps)
    }

    #[inline]
    pub const fn bps(&self) -> u32 {
        self.0
    }
}

// =============================================================================
// Product Kind
// =============================================================================

/// Which catalog a product (and therefore a cart or order line) belongs to.
///
/// The kind is carried explicitly on every line so pricing and persistence
/// dispatch on it rather than on the shape of the record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum ProductKind {
    /// Stocked item with a finite quantity.
    Item,
    /// Untracked shot.
    Shot,
    /// Untracked special (food).
    Special,
}

impl ProductKind {
    pub const ALL: [ProductKind; 3] = [ProductKind::Item, ProductKind::Shot, ProductKind::Special];

    /// Whether lines of this kind are bounded by a stock count.
    #[inline]
    pub const fn is_stock_tracked(&self) -> bool {
        matches!(self, ProductKind::Item)
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            ProductKind::Item => "item",
            ProductKind::Shot => "shot",
            ProductKind::Special => "special",
        }
    }
}

impl fmt::Display for ProductKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ProductKind {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "item" | "items" => Ok(ProductKind::Item),
            "shot" | "shots" => Ok(ProductKind::Shot),
            "special" | "specials" => Ok(ProductKind::Special),
            _ => Err(ValidationError::NotAllowed {
                field: "kind".to_string(),
                allowed: vec!["item".into(), "shot".into(), "special".into()],
            }),
        }
    }
}

/// Identity of a product across the three catalogs: `(kind, id)`.
///
/// This is also the identity of a cart line - at most one line per key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct ProductRef {
    pub kind: ProductKind,
    pub id: String,
}

impl ProductRef {
    pub fn new(kind: ProductKind, id: impl Into<String>) -> Self {
        ProductRef {
            kind,
            id: id.into(),
        }
    }

    pub fn item(id: impl Into<String>) -> Self {
        ProductRef::new(ProductKind::Item, id)
    }

    pub fn shot(id: impl Into<String>) -> Self {
        ProductRef::new(ProductKind::Shot, id)
    }

    pub fn special(id: impl Into<String>) -> Self {
        ProductRef::new(ProductKind::Special, id)
    }
}

impl fmt::Display for ProductRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.kind, self.id)
    }
}

// =============================================================================
// Products
// =============================================================================

/// A product with an authoritative stock count.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct StockedItem {
    pub id: String,
    pub name: String,
    /// Price in cents (>= 0).
    pub price_cents: i64,
    pub category: String,
    /// Units on hand (>= 0).
    pub quantity: i64,
    /// Unique when present.
    pub barcode: Option<String>,
    /// Reported as low stock when `quantity <= low_stock_threshold`.
    pub low_stock_threshold: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl StockedItem {
    #[inline]
    pub fn price(&self) -> Money {
        Money::from_cents(self.price_cents)
    }

    #[inline]
    pub fn is_low_stock(&self) -> bool {
        self.quantity <= self.low_stock_threshold
    }

    #[inline]
    pub fn is_out_of_stock(&self) -> bool {
        self.quantity <= 0
    }
}

/// An untracked shot. Conceptually always available.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Shot {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    /// Shots may be scanned, but do not have to be.
    pub barcode: Option<String>,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// An untracked special (kitchen item). Never addressed by barcode.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Special {
    pub id: String,
    pub name: String,
    pub price_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

/// A product from any of the three catalogs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Product {
    Item(StockedItem),
    Shot(Shot),
    Special(Special),
}

impl Product {
    pub fn kind(&self) -> ProductKind {
        match self {
            Product::Item(_) => ProductKind::Item,
            Product::Shot(_) => ProductKind::Shot,
            Product::Special(_) => ProductKind::Special,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            Product::Item(p) => &p.id,
            Product::Shot(p) => &p.id,
            Product::Special(p) => &p.id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Product::Item(p) => &p.name,
            Product::Shot(p) => &p.name,
            Product::Special(p) => &p.name,
        }
    }

    pub fn price(&self) -> Money {
        match self {
            Product::Item(p) => p.price(),
            Product::Shot(p) => Money::from_cents(p.price_cents),
            Product::Special(p) => Money::from_cents(p.price_cents),
        }
    }

    pub fn product_ref(&self) -> ProductRef {
        ProductRef::new(self.kind(), self.id())
    }

    /// Live stock for items, `None` for the unlimited catalogs.
    pub fn stock(&self) -> Option<i64> {
        match self {
            Product::Item(p) => Some(p.quantity),
            Product::Shot(_) | Product::Special(_) => None,
        }
    }
}

// =============================================================================
// Staff Identity
// =============================================================================

/// Staff role, as supplied by the identity provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Admin,
    Cashier,
    Waitress,
}

impl Role {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::Cashier => "cashier",
            Role::Waitress => "waitress",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "admin" => Ok(Role::Admin),
            "cashier" => Ok(Role::Cashier),
            "waitress" | "waiter" => Ok(Role::Waitress),
            _ => Err(ValidationError::NotAllowed {
                field: "role".to_string(),
                allowed: vec!["admin".into(), "cashier".into(), "waitress".into()],
            }),
        }
    }
}

/// The caller identity threaded through every cart and order operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Staff {
    pub id: String,
    pub display_name: String,
    pub role: Role,
}

impl Staff {
    pub fn new(id: impl Into<String>, display_name: impl Into<String>, role: Role) -> Self {
        Staff {
            id: id.into(),
            display_name: display_name.into(),
            role,
        }
    }
}

// =============================================================================
// Order Status / Payment Method
// =============================================================================

/// Persisted order state. `Paid` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    /// Open tab: mutable, removable only by deletion or close-out.
    Pending,
    /// Settled sale.
    Paid,
}

impl OrderStatus {
    pub const fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Paid => "paid",
        }
    }
}

#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    Cash,
    Visa,
    Mpesa,
    Ecocash,
}

impl PaymentMethod {
    pub const fn as_str(&self) -> &'static str {
        match self {
            PaymentMethod::Cash => "cash",
            PaymentMethod::Visa => "visa",
            PaymentMethod::Mpesa => "mpesa",
            PaymentMethod::Ecocash => "ecocash",
        }
    }
}

impl fmt::Display for PaymentMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethod {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "cash" => Ok(PaymentMethod::Cash),
            "visa" | "card" => Ok(PaymentMethod::Visa),
            "mpesa" | "m-pesa" => Ok(PaymentMethod::Mpesa),
            "ecocash" => Ok(PaymentMethod::Ecocash),
            "" => Err(ValidationError::Required {
                field: "payment method".to_string(),
            }),
            _ => Err(ValidationError::NotAllowed {
                field: "payment method".to_string(),
                allowed: vec![
                    "cash".into(),
                    "visa".into(),
                    "mpesa".into(),
                    "ecocash".into(),
                ],
            }),
        }
    }
}

// =============================================================================
// Order
// =============================================================================

/// A persisted order: either an open tab or a paid sale.
///
/// ## Invariant
/// `total_cents = subtotal + service_fee_cents`, where the subtotal is the
/// sum of `quantity × price_at_time` over the order's lines.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct Order {
    pub id: String,
    /// Table or tab name (non-empty).
    pub name: String,
    pub status: OrderStatus,
    /// Present iff `status == Paid`.
    pub payment_method: Option<PaymentMethod>,
    pub total_cents: i64,
    pub service_fee_cents: i64,
    /// Staff member that owns the order.
    pub staff_id: String,
    /// Incremented on every save; used to detect concurrent tab edits.
    pub version: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
    #[ts(as = "String")]
    pub updated_at: DateTime<Utc>,
}

impl Order {
    #[inline]
    pub fn total(&self) -> Money {
        Money::from_cents(self.total_cents)
    }

    #[inline]
    pub fn service_fee(&self) -> Money {
        Money::from_cents(self.service_fee_cents)
    }

    /// Sum of line values, derived from the stored total.
    #[inline]
    pub fn subtotal(&self) -> Money {
        self.total() - self.service_fee()
    }

    #[inline]
    pub fn is_pending(&self) -> bool {
        self.status == OrderStatus::Pending
    }
}

/// One persisted line of an order. Lines live in three parallel
/// collections; `kind` records which one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[ts(export)]
#[serde(rename_all = "camelCase")]
pub struct OrderLine {
    pub id: String,
    pub order_id: String,
    pub kind: ProductKind,
    pub product_id: String,
    /// Current catalog name of the product (joined on read).
    pub name: String,
    /// Staff member who recorded the line.
    pub staff_id: String,
    pub quantity: i64,
    /// Unit price frozen at commit time.
    pub price_at_time_cents: i64,
    #[ts(as = "String")]
    pub created_at: DateTime<Utc>,
}

impl OrderLine {
    #[inline]
    pub fn price_at_time(&self) -> Money {
        Money::from_cents(self.price_at_time_cents)
    }

    #[inline]
    pub fn line_value(&self) -> Money {
        self.price_at_time().multiply_quantity(self.quantity)
    }

    pub fn product_ref(&self) -> ProductRef {
        ProductRef::new(self.kind, self.product_id.clone())
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    fn item(quantity: i64, threshold: i64) -> StockedItem {
        StockedItem {
            id: "beer".to_string(),
            name: "Beer".to_string(),
            price_cents: 450,
            category: "Beer".to_string(),
            quantity,
            barcode: Some("600100".to_string()),
            low_stock_threshold: threshold,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_low_stock_is_inclusive() {
        assert!(item(5, 5).is_low_stock());
        assert!(!item(6, 5).is_low_stock());
        assert!(item(0, 0).is_out_of_stock());
    }

    #[test]
    fn test_product_accessors() {
        let product = Product::Item(item(3, 1));
        assert_eq!(product.kind(), ProductKind::Item);
        assert_eq!(product.stock(), Some(3));
        assert_eq!(product.product_ref(), ProductRef::item("beer"));

        let shot = Product::Shot(Shot {
            id: "tequila".to_string(),
            name: "Tequila".to_string(),
            price_cents: 300,
            barcode: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        });
        assert_eq!(shot.stock(), None);
        assert_eq!(shot.price().cents(), 300);
    }

    #[test]
    fn test_payment_method_parse() {
        assert_eq!("M-Pesa".parse::<PaymentMethod>().unwrap(), PaymentMethod::Mpesa);
        assert_eq!("cash".parse::<PaymentMethod>().unwrap(), PaymentMethod::Cash);
        assert!(matches!(
            "".parse::<PaymentMethod>(),
            Err(ValidationError::Required { .. })
        ));
        assert!("cheque".parse::<PaymentMethod>().is_err());
    }

    #[test]
    fn test_role_parse() {
        assert_eq!("Waitress".parse::<Role>().unwrap(), Role::Waitress);
        assert!("chef".parse::<Role>().is_err());
    }

    #[test]
    fn test_product_serializes_with_kind_tag() {
        let json = serde_json::to_value(Product::Item(item(1, 0))).unwrap();
        assert_eq!(json["kind"], "item");
        assert_eq!(json["priceCents"], 450);
    }
}
