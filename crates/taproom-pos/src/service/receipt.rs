//! # Receipt Output
//!
//! Where rendered receipts go once a tab is saved, a payment completes, or
//! a tab is reprinted.
//!
//! A sink failure never undoes a committed settlement: the service logs it
//! and carries on.

use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::{debug, info};

use taproom_core::ReceiptRequest;

#[derive(Debug, Error)]
pub enum ReceiptError {
    #[error("Receipt printer unavailable: {0}")]
    Unavailable(String),

    #[error("Failed to encode receipt: {0}")]
    Encode(#[from] serde_json::Error),
}

/// Receives every receipt the service produces.
pub trait ReceiptSink: Send + Sync {
    /// `rendered` is the plain-text layout of `receipt`.
    fn print(&self, receipt: &ReceiptRequest, rendered: &str) -> Result<(), ReceiptError>;
}

/// Writes receipts to the log. The default sink.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogReceiptSink;

impl ReceiptSink for LogReceiptSink {
    fn print(&self, receipt: &ReceiptRequest, rendered: &str) -> Result<(), ReceiptError> {
        debug!(payload = %serde_json::to_string(receipt)?, "Receipt payload");
        info!(
            tab = %receipt.tab_name,
            is_final = receipt.is_final,
            total_cents = receipt.total_cents,
            "Receipt\n{}",
            rendered
        );
        Ok(())
    }
}

/// Keeps every receipt in memory, for a UI preview pane or tests.
#[derive(Debug, Default)]
pub struct MemoryReceiptSink {
    printed: Mutex<Vec<(ReceiptRequest, String)>>,
}

impl MemoryReceiptSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Receipts in the order they were printed.
    pub fn receipts(&self) -> Vec<ReceiptRequest> {
        self.entries().iter().map(|(r, _)| r.clone()).collect()
    }

    /// The most recent rendered receipt.
    pub fn last_rendered(&self) -> Option<String> {
        self.entries().last().map(|(_, text)| text.clone())
    }

    // Poisoning is ignored: every write is a single push.
    fn entries(&self) -> MutexGuard<'_, Vec<(ReceiptRequest, String)>> {
        self.printed.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl ReceiptSink for MemoryReceiptSink {
    fn print(&self, receipt: &ReceiptRequest, rendered: &str) -> Result<(), ReceiptError> {
        self.entries().push((receipt.clone(), rendered.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn receipt() -> ReceiptRequest {
        ReceiptRequest {
            tab_name: "Table 4".to_string(),
            staff_name: "Grace".to_string(),
            lines: Vec::new(),
            subtotal_cents: 0,
            service_fee_cents: 0,
            total_cents: 0,
            vat_inclusive_cents: 0,
            payment_method: None,
            is_final: false,
            printed_at: Utc::now(),
        }
    }

    #[test]
    fn test_memory_sink_keeps_order() {
        let sink = MemoryReceiptSink::new();
        sink.print(&receipt(), "first").unwrap();
        sink.print(&receipt(), "second").unwrap();

        assert_eq!(sink.receipts().len(), 2);
        assert_eq!(sink.last_rendered().as_deref(), Some("second"));
    }

    #[test]
    fn test_memory_sink_survives_poisoned_lock() {
        let sink = std::sync::Arc::new(MemoryReceiptSink::new());
        sink.print(&receipt(), "before").unwrap();

        let holder = sink.clone();
        let panicked = std::thread::spawn(move || {
            let _guard = holder.printed.lock().unwrap();
            panic!("printer thread died");
        })
        .join();
        assert!(panicked.is_err());
        assert!(sink.printed.is_poisoned());

        sink.print(&receipt(), "after").unwrap();
        assert_eq!(sink.receipts().len(), 2);
        assert_eq!(sink.last_rendered().as_deref(), Some("after"));
    }

    #[test]
    fn test_log_sink_accepts_receipts() {
        assert!(LogReceiptSink.print(&receipt(), "text").is_ok());
    }
}
