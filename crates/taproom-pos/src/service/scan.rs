//! # Scan Station
//!
//! Turns decoded codes into cart adds with operator feedback.
//!
//! ```text
//! CodeSource ──► code ──► ScanStation::admit ──► duplicate inside window? ──► Ignored
//!                               │
//!                               ▼
//!                     mutate_cart(AddByCode)
//!                        │             │
//!                        ▼             ▼
//!                    Accepted      Rejected (unknown code, no stock)
//! ```
//!
//! Each cart gets its own debouncer, so two terminals scanning the same
//! bottle at the same moment both count.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use taproom_core::{CodeSource, ScanDebouncer, ScanSignal, Staff};

use super::{CartOp, PosService};
use crate::error::{ApiResult, ErrorCode};

/// Per-cart scan debouncing.
#[derive(Debug)]
pub struct ScanStation {
    window: Duration,
    debouncers: Mutex<HashMap<String, ScanDebouncer>>,
}

impl ScanStation {
    pub fn new(window: Duration) -> Self {
        ScanStation {
            window,
            debouncers: Mutex::new(HashMap::new()),
        }
    }

    /// Whether a code read for `cart_id` at `now` should be processed.
    pub async fn admit(&self, cart_id: &str, code: &str, now: Instant) -> bool {
        let mut debouncers = self.debouncers.lock().await;
        debouncers
            .entry(cart_id.to_string())
            .or_insert_with(|| ScanDebouncer::new(self.window))
            .accept(code, now)
    }

    /// Drops the debouncer of a closed cart.
    pub async fn forget(&self, cart_id: &str) {
        self.debouncers.lock().await.remove(cart_id);
    }

    /// Number of carts with a debouncer.
    pub async fn len(&self) -> usize {
        self.debouncers.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.debouncers.lock().await.is_empty()
    }
}

impl PosService {
    /// Handles one decoded code for the caller's cart.
    ///
    /// ## Returns
    /// - `Accepted` when one unit was added
    /// - `Rejected` for an unknown code or a stock ceiling
    /// - `Ignored` for a repeat of the previous code inside the debounce window
    ///
    /// ## Errors
    /// An unknown cart, or a store failure while reading live stock.
    pub async fn scan(
        &self,
        cart_id: &str,
        staff: &Staff,
        code: &str,
        now: Instant,
    ) -> ApiResult<ScanSignal> {
        // Unknown cart is an error, not a rejected scan.
        self.carts.with_cart(cart_id, staff, |_| ()).await?;

        if !self.scanner.admit(cart_id, code, now).await {
            debug!(cart_id = %cart_id, code = %code, "Duplicate scan ignored");
            return Ok(ScanSignal::Ignored);
        }

        match self
            .mutate_cart(cart_id, staff, CartOp::AddByCode(code.to_string()))
            .await
        {
            Ok(_) => {
                info!(cart_id = %cart_id, code = %code, "Scan accepted");
                Ok(ScanSignal::Accepted)
            }
            Err(e) if e.code == ErrorCode::NotFound || e.is_stock_error() => {
                warn!(cart_id = %cart_id, code = %code, reason = %e.message, "Scan rejected");
                Ok(ScanSignal::Rejected)
            }
            Err(e) => Err(e),
        }
    }

    /// Drains a code source into the caller's cart, one signal per code.
    pub async fn pump_scanner<S>(
        &self,
        cart_id: &str,
        staff: &Staff,
        source: &mut S,
    ) -> ApiResult<Vec<ScanSignal>>
    where
        S: CodeSource,
    {
        let mut signals = Vec::new();
        while let Some(code) = source.next_code() {
            signals.push(self.scan(cart_id, staff, &code, Instant::now()).await?);
        }
        Ok(signals)
    }
}
