//! # Catalog Lookup
//!
//! Resolves a scanned code or an explicit selection to exactly one product
//! from an in-memory snapshot of the three catalogs.
//!
//! ## Lookup Order
//! ```text
//! code "6001234"
//!      │
//!      ▼
//! Stocked items: barcode or id matches? ──yes──► Product::Item
//!      │ no
//!      ▼
//! Shots: barcode or id matches? ──────────yes──► Product::Shot
//!      │ no
//!      ▼
//! NotFound            (specials are never code-addressable)
//! ```
//!
//! The snapshot is replaced wholesale, one collection at a time, whenever
//! the store reports a change. Nothing is patched incrementally.

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult};
use crate::types::{Product, ProductKind, ProductRef, Shot, Special, StockedItem};

/// A point-in-time copy of the three product catalogs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Catalog {
    items: Vec<StockedItem>,
    shots: Vec<Shot>,
    specials: Vec<Special>,
}

impl Catalog {
    pub fn new(items: Vec<StockedItem>, shots: Vec<Shot>, specials: Vec<Special>) -> Self {
        Catalog {
            items,
            shots,
            specials,
        }
    }

    /// Resolves a scan code.
    ///
    /// ## Errors
    /// `NotFound` when the code is blank or matches nothing scannable.
    pub fn lookup_code(&self, code: &str) -> CoreResult<Product> {
        let code = code.trim();
        if code.is_empty() {
            return Err(CoreError::NotFound("an empty code".to_string()));
        }

        if let Some(item) = self
            .items
            .iter()
            .find(|i| i.barcode.as_deref() == Some(code) || i.id == code)
        {
            return Ok(Product::Item(item.clone()));
        }

        if let Some(shot) = self
            .shots
            .iter()
            .find(|s| s.barcode.as_deref() == Some(code) || s.id == code)
        {
            return Ok(Product::Shot(shot.clone()));
        }

        Err(CoreError::NotFound(format!("code '{}'", code)))
    }

    /// Resolves an explicit selection.
    pub fn resolve(&self, key: &ProductRef) -> CoreResult<Product> {
        let found = match key.kind {
            ProductKind::Item => self
                .items
                .iter()
                .find(|i| i.id == key.id)
                .cloned()
                .map(Product::Item),
            ProductKind::Shot => self
                .shots
                .iter()
                .find(|s| s.id == key.id)
                .cloned()
                .map(Product::Shot),
            ProductKind::Special => self
                .specials
                .iter()
                .find(|s| s.id == key.id)
                .cloned()
                .map(Product::Special),
        };

        found.ok_or_else(|| CoreError::NotFound(key.to_string()))
    }

    pub fn items(&self) -> &[StockedItem] {
        &self.items
    }

    pub fn shots(&self) -> &[Shot] {
        &self.shots
    }

    pub fn specials(&self) -> &[Special] {
        &self.specials
    }

    pub fn replace_items(&mut self, items: Vec<StockedItem>) {
        self.items = items;
    }

    pub fn replace_shots(&mut self, shots: Vec<Shot>) {
        self.shots = shots;
    }

    pub fn replace_specials(&mut self, specials: Vec<Special>) {
        self.specials = specials;
    }

    /// Items at or below their low-stock threshold.
    pub fn low_stock_items(&self) -> Vec<&StockedItem> {
        self.items.iter().filter(|i| i.is_low_stock()).collect()
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
