//! Low-stock report for the owner's notifier.
//!
//! ```text
//! Taproom low stock
//! 2026-10-18 21:04 UTC
//!
//! ITEM                      QTY  MIN
//! Beer                        2    2
//! Castle Lite                 0    5
//! ```

use chrono::{DateTime, Utc};

use taproom_core::StockedItem;

const NAME_WIDTH: usize = 24;

/// Renders `items` as a plain-text table, most urgent first.
///
/// An empty list renders a single "all stocked" line under the heading.
pub fn render_low_stock_report(
    items: &[StockedItem],
    venue_name: &str,
    generated_at: DateTime<Utc>,
) -> String {
    let mut out = format!(
        "{venue_name} low stock\n{}\n\n",
        generated_at.format("%Y-%m-%d %H:%M UTC")
    );

    if items.is_empty() {
        out.push_str("All items above threshold.\n");
        return out;
    }

    let mut sorted: Vec<&StockedItem> = items.iter().collect();
    sorted.sort_by(|a, b| a.quantity.cmp(&b.quantity).then_with(|| a.name.cmp(&b.name)));

    out.push_str(&format!("{:<NAME_WIDTH$} {:>4} {:>4}\n", "ITEM", "QTY", "MIN"));
    for item in sorted {
        out.push_str(&format!(
            "{:<NAME_WIDTH$} {:>4} {:>4}\n",
            truncate(&item.name),
            item.quantity,
            item.low_stock_threshold
        ));
    }
    out
}

fn truncate(name: &str) -> String {
    if name.chars().count() <= NAME_WIDTH {
        name.to_string()
    } else {
        let mut short: String = name.chars().take(NAME_WIDTH - 1).collect();
        short.push('~');
        short
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn item(name: &str, quantity: i64, threshold: i64) -> StockedItem {
        let now = Utc::now();
        StockedItem {
            id: format!("item-{name}"),
            name: name.to_string(),
            price_cents: 450,
            category: "Beer".to_string(),
            quantity,
            barcode: None,
            low_stock_threshold: threshold,
            created_at: now,
            updated_at: now,
        }
    }

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 18, 21, 4, 0).unwrap()
    }

    #[test]
    fn test_report_orders_by_urgency() {
        let items = vec![item("Beer", 2, 2), item("Castle Lite", 0, 5)];
        let report = render_low_stock_report(&items, "Taproom", at());

        assert!(report.starts_with("Taproom low stock\n2026-10-18 21:04 UTC\n"));
        let castle = report.find("Castle Lite").unwrap();
        let beer = report.find("Beer").unwrap();
        assert!(castle < beer);
        assert!(report.contains(&format!("{:<24} {:>4} {:>4}", "Beer", 2, 2)));
    }

    #[test]
    fn test_empty_report() {
        let report = render_low_stock_report(&[], "Taproom", at());
        assert!(report.ends_with("All items above threshold.\n"));
    }

    #[test]
    fn test_long_names_are_truncated() {
        let items = vec![item("An Extremely Long Craft Beer Name", 1, 3)];
        let report = render_low_stock_report(&items, "Taproom", at());
        assert!(report.contains("An Extremely Long Craft~"));
        assert!(!report.contains("Beer Name"));
    }
}
