//! # POS Service
//!
//! The request/response surface of the order-composition and settlement
//! engine. Every operation takes the caller's `Staff` identity explicitly.
//!
//! ## Operation Organization
//! ```text
//! service/
//! ├── mod.rs      ◄─── PosService, product lookup, low stock
//! ├── cart.rs     ◄─── open_cart, mutate_cart, price_cart
//! ├── order.rs    ◄─── save_tab, complete_payment, tabs, reprint
//! ├── scan.rs     ◄─── ScanStation, scan, pump_scanner
//! ├── receipt.rs  ◄─── ReceiptSink, LogReceiptSink, MemoryReceiptSink
//! └── report.rs   ◄─── Low-stock plain-text report
//! ```
//!
//! ## Order Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                                                                         │
//! │  open_cart ──► Draft ──── save_tab ────► Pending ──── delete_tab ──► ✗  │
//! │                  │  ▲                       │                           │
//! │                  │  └──── reopen_tab ───────┘                           │
//! │                  │                                                      │
//! │                  └──── complete_payment ──► Paid (terminal)             │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

mod cart;
mod order;
mod receipt;
mod report;
mod scan;

pub use cart::CartOp;
pub use receipt::{LogReceiptSink, MemoryReceiptSink, ReceiptError, ReceiptSink};
pub use report::render_low_stock_report;
pub use scan::ScanStation;

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use taproom_core::{
    KeystrokeDecoder, PricingPolicy, Product, ReceiptRequest, StockedItem,
};
use taproom_db::Database;

use crate::config::PosConfig;
use crate::error::{ApiResult, Operation};
use crate::state::{CartSessions, CatalogState};

/// The POS engine: catalog lookup, carts, pricing, settlement, tabs.
///
/// Cheap to share behind an `Arc`; all state is internally synchronized.
pub struct PosService {
    db: Database,
    config: PosConfig,
    policy: PricingPolicy,
    catalog: CatalogState,
    carts: CartSessions,
    scanner: ScanStation,
    receipts: Arc<dyn ReceiptSink>,
    refresh: JoinHandle<()>,
}

impl Drop for PosService {
    fn drop(&mut self) {
        self.refresh.abort();
    }
}

impl PosService {
    /// Builds the service, loads the catalog read model, and starts the
    /// task that keeps it current. The task stops when the service is
    /// dropped.
    ///
    /// Receipts go to the log until [`PosService::with_receipt_sink`]
    /// replaces the sink.
    pub async fn new(db: Database, config: PosConfig) -> ApiResult<Self> {
        let catalog = CatalogState::default();
        // Subscribe first so nothing committed during the load is missed.
        let refresh = catalog.spawn_refresh(db.clone());
        if let Err(e) = catalog.reload_all(&db).await {
            refresh.abort();
            return Err(e).during("load catalog");
        }

        let policy = config.pricing_policy();
        let scanner = ScanStation::new(config.scanner.debounce());

        info!(
            service_fee_bps = policy.service_fee_rate.bps(),
            service_fee_role = %policy.service_fee_role,
            vat_bps = policy.vat_rate.bps(),
            shared_tabs = config.tabs.shared,
            "POS service ready"
        );

        Ok(PosService {
            db,
            config,
            policy,
            catalog,
            carts: CartSessions::new(),
            scanner,
            receipts: Arc::new(LogReceiptSink),
            refresh,
        })
    }

    pub fn with_receipt_sink(mut self, sink: Arc<dyn ReceiptSink>) -> Self {
        self.receipts = sink;
        self
    }

    pub fn config(&self) -> &PosConfig {
        &self.config
    }

    pub fn pricing_policy(&self) -> &PricingPolicy {
        &self.policy
    }

    pub fn catalog(&self) -> &CatalogState {
        &self.catalog
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    /// A decoder tuned by the `[scanner]` settings.
    pub fn keystroke_decoder(&self) -> KeystrokeDecoder {
        KeystrokeDecoder::new(
            self.config.scanner.burst_gap(),
            self.config.scanner.min_code_len,
        )
    }

    // =========================================================================
    // Catalog
    // =========================================================================

    /// Resolves a barcode or product ID. Stocked items win over shots;
    /// specials are never code-addressable.
    pub async fn lookup_product(&self, code: &str) -> ApiResult<Product> {
        debug!(code = %code, "lookup_product");
        self.catalog.lookup_code(code).await.during("lookup product")
    }

    /// Stocked items at or below their low-stock threshold, read from the
    /// store rather than the snapshot.
    pub async fn low_stock_items(&self) -> ApiResult<Vec<StockedItem>> {
        self.db
            .catalog()
            .low_stock_items()
            .await
            .during("list low stock")
    }

    /// Renders the low-stock report for the notifier.
    pub async fn low_stock_report(&self) -> ApiResult<String> {
        let items = self.low_stock_items().await?;
        Ok(render_low_stock_report(
            &items,
            &self.config.receipt.venue_name,
            chrono::Utc::now(),
        ))
    }

    // =========================================================================
    // Receipts
    // =========================================================================

    fn print(&self, receipt: &ReceiptRequest) {
        let rendered = receipt.render(
            &self.config.receipt.venue_name,
            &self.config.receipt.currency_prefix,
        );
        if let Err(e) = self.receipts.print(receipt, &rendered) {
            warn!(tab = %receipt.tab_name, error = %e, "Receipt could not be printed");
        }
    }
}

// =============================================================================
// Test Fixtures
// =============================================================================

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use taproom_core::{Role, Shot, Special, Staff};
    use taproom_db::{DbConfig, NewShot, NewSpecial, NewStockedItem};

    pub struct Fixture {
        pub service: PosService,
        pub receipts: Arc<MemoryReceiptSink>,
    }

    pub async fn fixture() -> Fixture {
        fixture_with(PosConfig::default()).await
    }

    pub async fn fixture_with(config: PosConfig) -> Fixture {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let receipts = Arc::new(MemoryReceiptSink::new());
        let service = PosService::new(db, config)
            .await
            .unwrap()
            .with_receipt_sink(receipts.clone());
        Fixture { service, receipts }
    }

    pub fn waitress() -> Staff {
        Staff::new("staff-grace", "Grace", Role::Waitress)
    }

    pub fn cashier() -> Staff {
        Staff::new("staff-tendai", "Tendai", Role::Cashier)
    }

    /// "Beer", K4.50, barcode 6001234567890, low-stock threshold 2.
    pub async fn beer(f: &Fixture, quantity: i64) -> StockedItem {
        let item = f
            .service
            .database()
            .catalog()
            .create_item(NewStockedItem {
                name: "Beer".to_string(),
                price_cents: 450,
                category: "Beer".to_string(),
                quantity,
                barcode: Some("6001234567890".to_string()),
                low_stock_threshold: 2,
            })
            .await
            .unwrap();
        f.service.catalog().reload_all(f.service.database()).await.unwrap();
        item
    }

    pub async fn tequila(f: &Fixture) -> Shot {
        let shot = f
            .service
            .database()
            .catalog()
            .create_shot(NewShot {
                name: "Tequila".to_string(),
                price_cents: 300,
                barcode: None,
            })
            .await
            .unwrap();
        f.service.catalog().reload_all(f.service.database()).await.unwrap();
        shot
    }

    pub async fn wings(f: &Fixture) -> Special {
        let special = f
            .service
            .database()
            .catalog()
            .create_special(NewSpecial {
                name: "Chicken Wings".to_string(),
                price_cents: 1250,
            })
            .await
            .unwrap();
        f.service.catalog().reload_all(f.service.database()).await.unwrap();
        special
    }
}
