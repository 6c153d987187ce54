//! Product entry data structure.

use serde::{Deserialize, Serialize};

/// A product listed on a category page at a point in time.
///
/// Two entries are the same entry only when every field matches; a price
/// change therefore produces a different entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ProductEntry {
    /// Display name
    pub title: String,

    /// Price text as scraped, currency formatting preserved
    pub price: String,

    /// Link to the product detail page
    pub url: String,

    /// Stock indicator, `None` when the page shows none
    #[serde(default)]
    pub stock_status: Option<String>,
}

impl ProductEntry {
    /// Create an entry without a stock indicator.
    pub fn new(title: impl Into<String>, price: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            price: price.into(),
            url: url.into(),
            stock_status: None,
        }
    }

    /// Attach a stock indicator.
    pub fn with_stock_status(mut self, status: impl Into<String>) -> Self {
        self.stock_status = Some(status.into());
        self
    }

    /// One-line `title - price` rendering used in reports.
    pub fn summary(&self) -> String {
        format!("{} - {}", self.title, self.price)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_price_change_is_a_different_entry() {
        let old = ProductEntry::new("Catan", "₹1999", "/catan");
        let new = ProductEntry::new("Catan", "₹1799", "/catan");
        assert_ne!(old, new);
    }

    #[test]
    fn test_missing_stock_status_serializes_as_null() {
        let entry = ProductEntry::new("Azul", "₹2499", "/azul");
        let json = serde_json::to_value(&entry).unwrap();
        assert!(json["stock_status"].is_null());

        let parsed: ProductEntry =
            serde_json::from_str(r#"{"title":"Azul","price":"₹2499","url":"/azul"}"#).unwrap();
        assert_eq!(parsed, entry);
    }

    #[test]
    fn test_summary() {
        let entry = ProductEntry::new("Wingspan", "₹3499", "/wingspan").with_stock_status("Pre-order");
        assert_eq!(entry.summary(), "Wingspan - ₹3499");
    }
}
