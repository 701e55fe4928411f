//! # taproom-core: Pure Business Logic for Taproom POS
//!
//! Everything that decides what is owed, what is in stock, and what gets
//! persisted, as pure functions over plain data.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Taproom POS Architecture                         │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 taproom-pos (service + binary)                  │   │
//! │  │   scan ──► mutate_cart ──► price_cart ──► save_tab / pay        │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │             ★ taproom-core (THIS CRATE) ★                       │   │
//! │  │                                                                 │   │
//! │  │   ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐ ┌─────────┐  │   │
//! │  │   │ catalog │ │  cart   │ │ pricing │ │  order  │ │ receipt │  │   │
//! │  │   │ lookup  │ │ ceilings│ │ fee/VAT │ │lifecycle│ │  text   │  │   │
//! │  │   └─────────┘ └─────────┘ └─────────┘ └─────────┘ └─────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO CLOCK READS IN DECISIONS            │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                 taproom-db (SQLite, settlement)                 │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Products, staff, orders
//! - [`money`] - Integer cents, half-up rate application
//! - [`catalog`] - Code and selection lookup over a catalog snapshot
//! - [`cart`] - Order draft with stock ceilings
//! - [`pricing`] - Subtotal, service fee, total, VAT decomposition
//! - [`order`] - Commit requests and tab rehydration
//! - [`receipt`] - Printable receipts
//! - [`scanner`] - Keystroke decoding and scan debounce
//! - [`validation`] / [`error`] - Input rules and domain errors
//!
//! ## Example Usage
//!
//! ```rust
//! use taproom_core::money::Money;
//! use taproom_core::types::Rate;
//!
//! let subtotal = Money::from_cents(10_000);
//! let fee = subtotal.apply_rate(Rate::from_bps(1000));
//! assert_eq!(fee.cents(), 1_000);
//!
//! // 15% VAT already contained in K110.00
//! let vat = (subtotal + fee).inclusive_portion(Rate::from_bps(1500));
//! assert_eq!(vat.cents(), 1_435);
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod cart;
pub mod catalog;
pub mod error;
pub mod money;
pub mod order;
pub mod pricing;
pub mod receipt;
pub mod scanner;
pub mod types;
pub mod validation;

// =============================================================================
// Re-exports
// =============================================================================

pub use cart::{Cart, CartLine, TabRef};
pub use catalog::Catalog;
pub use error::{CoreError, CoreResult, ValidationError};
pub use money::Money;
pub use order::{OpenTab, PaymentCommit, ReopenPurpose, TabCommit};
pub use pricing::{PricingPolicy, PricingResult};
pub use receipt::{ReceiptLine, ReceiptRequest};
pub use scanner::{
    CodeSource, KeyEvent, KeystrokeDecoder, KeystrokeSource, ScanDebouncer, ScanSignal,
};
pub use types::*;
