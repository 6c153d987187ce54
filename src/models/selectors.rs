// src/models/selectors.rs

//! CSS selectors for scraping a listing page.

use serde::{Deserialize, Serialize};

/// CSS selectors locating products on a listing page.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ListingSelectors {
    /// Container holding every product on the page
    #[serde(default = "defaults::container")]
    pub container: String,

    /// One node per product, searched within the container
    #[serde(default = "defaults::item")]
    pub item: String,

    /// Anchor carrying the product title and link
    #[serde(default = "defaults::title_link")]
    pub title_link: String,

    /// Discounted price, preferred when present
    #[serde(default = "defaults::price_discounted")]
    pub price_discounted: String,

    /// Regular price, used when no discounted price is shown
    #[serde(default = "defaults::price_normal")]
    pub price_normal: String,

    /// Optional stock indicator
    #[serde(default = "defaults::stock_status")]
    pub stock_status: String,

    /// HTML attribute holding the product link (usually "href")
    #[serde(default = "defaults::link_attr")]
    pub link_attr: String,
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            container: defaults::container(),
            item: defaults::item(),
            title_link: defaults::title_link(),
            price_discounted: defaults::price_discounted(),
            price_normal: defaults::price_normal(),
            stock_status: defaults::stock_status(),
            link_attr: defaults::link_attr(),
        }
    }
}

impl ListingSelectors {
    /// All selector strings paired with their field names.
    pub fn named(&self) -> [(&'static str, &str); 6] {
        [
            ("container", &self.container),
            ("item", &self.item),
            ("title_link", &self.title_link),
            ("price_discounted", &self.price_discounted),
            ("price_normal", &self.price_normal),
            ("stock_status", &self.stock_status),
        ]
    }
}

mod defaults {
    pub fn container() -> String {
        "div.main-products.product-grid".into()
    }
    pub fn item() -> String {
        ".product-thumb".into()
    }
    pub fn title_link() -> String {
        ".name a".into()
    }
    pub fn price_discounted() -> String {
        ".price-new".into()
    }
    pub fn price_normal() -> String {
        ".price-normal".into()
    }
    pub fn stock_status() -> String {
        ".preorder-stock".into()
    }
    pub fn link_attr() -> String {
        "href".into()
    }
}
