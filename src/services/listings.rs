// src/services/listings.rs

//! Listing fetcher service.
//!
//! Retrieves a category page and extracts its product entries using the
//! configured CSS selectors.

use async_trait::async_trait;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};
use url::Url;

use crate::error::{AppError, Result};
use crate::models::{Category, Config, ListingSelectors, ProductEntry};
use crate::utils::http::{create_async_client, fetch_text};
use crate::utils::{normalize_whitespace, resolve_url};

/// Source of the current entries of a category.
#[async_trait]
pub trait ListingSource: Send + Sync {
    /// Fetch the current entries of a category, in page order.
    async fn fetch(&self, category: &Category) -> Result<Vec<ProductEntry>>;
}

/// Selectors compiled once and applied to every listing page.
#[derive(Debug, Clone)]
pub struct ListingParser {
    raw: ListingSelectors,
    container: Selector,
    item: Selector,
    title_link: Selector,
    price_discounted: Selector,
    price_normal: Selector,
    stock_status: Selector,
    title: Selector,
}

impl ListingParser {
    /// Compile the configured selectors.
    pub fn new(selectors: &ListingSelectors) -> Result<Self> {
        Ok(Self {
            raw: selectors.clone(),
            container: Self::parse_selector(&selectors.container)?,
            item: Self::parse_selector(&selectors.item)?,
            title_link: Self::parse_selector(&selectors.title_link)?,
            price_discounted: Self::parse_selector(&selectors.price_discounted)?,
            price_normal: Self::parse_selector(&selectors.price_normal)?,
            stock_status: Self::parse_selector(&selectors.stock_status)?,
            title: Self::parse_selector("title")?,
        })
    }

    /// Extract product entries from a listing page.
    ///
    /// Fails with a structure error when the container is absent. Items
    /// without a title/link or without any price are skipped.
    pub fn parse(&self, html: &str, page_url: &str) -> Result<Vec<ProductEntry>> {
        let document = Html::parse_document(html);

        match document.select(&self.title).next() {
            Some(title) => log::debug!("Page title: {}", normalize_whitespace(&text_of(&title))),
            None => log::debug!("Page title: <none>"),
        }

        let container = document
            .select(&self.container)
            .next()
            .ok_or_else(|| AppError::structure(page_url, &self.raw.container))?;

        let base_url = Url::parse(page_url).ok();
        let items: Vec<ElementRef> = container.select(&self.item).collect();
        log::info!("Found {} products on {}", items.len(), page_url);

        Ok(items
            .iter()
            .filter_map(|item| self.parse_item(item, base_url.as_ref()))
            .collect())
    }

    fn parse_item(&self, item: &ElementRef, base_url: Option<&Url>) -> Option<ProductEntry> {
        let link = item.select(&self.title_link).next()?;
        let title = normalize_whitespace(&text_of(&link));
        let href = link.value().attr(&self.raw.link_attr)?;
        if title.is_empty() {
            return None;
        }

        let url = match base_url {
            Some(base) => resolve_url(base, href.trim()),
            None => href.trim().to_string(),
        };

        let price = self
            .first_text(item, &self.price_discounted)
            .or_else(|| self.first_text(item, &self.price_normal));
        let Some(price) = price else {
            log::warn!("Could not find price for {}, skipping", title);
            return None;
        };

        let stock_status = self.first_text(item, &self.stock_status);

        Some(ProductEntry {
            title,
            price,
            url,
            stock_status,
        })
    }

    /// Normalized text of the first match, `None` when absent or blank.
    fn first_text(&self, item: &ElementRef, selector: &Selector) -> Option<String> {
        item.select(selector)
            .next()
            .map(|el| normalize_whitespace(&text_of(&el)))
            .filter(|text| !text.is_empty())
    }

    fn parse_selector(s: &str) -> Result<Selector> {
        Selector::parse(s).map_err(|e| AppError::selector(s, format!("{e:?}")))
    }
}

fn text_of(element: &ElementRef) -> String {
    element.text().collect()
}

/// HTTP-backed listing source.
pub struct ListingFetcher {
    client: Client,
    parser: ListingParser,
}

impl ListingFetcher {
    /// Create a fetcher from the fetcher and selector configuration.
    pub fn new(config: &Config) -> Result<Self> {
        Ok(Self {
            client: create_async_client(&config.fetcher)?,
            parser: ListingParser::new(&config.selectors)?,
        })
    }
}

#[async_trait]
impl ListingSource for ListingFetcher {
    async fn fetch(&self, category: &Category) -> Result<Vec<ProductEntry>> {
        log::info!("Fetching {} from {}", category.name, category.url);
        let html = fetch_text(&self.client, &category.url).await?;
        let entries = self.parser.parse(&html, &category.url)?;
        log::info!("{}: {} entries parsed", category.name, entries.len());
        Ok(entries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const PAGE_URL: &str = "https://shop.example.com/pre-orders?fq=1";

    fn parser() -> ListingParser {
        ListingParser::new(&ListingSelectors::default()).unwrap()
    }

    fn page(items: &str) -> String {
        format!(
            r#"<html><head><title>Pre-Orders</title></head><body>
            <div class="main-products product-grid">{items}</div>
            </body></html>"#
        )
    }

    #[test]
    fn test_parse_selector_valid() {
        assert!(ListingParser::parse_selector("div.class").is_ok());
        assert!(ListingParser::parse_selector(".name a").is_ok());
    }

    #[test]
    fn test_parse_selector_invalid() {
        assert!(ListingParser::parse_selector("[[invalid").is_err());
    }

    #[test]
    fn test_parses_entries_in_page_order() {
        let html = page(
            r#"
            <div class="product-thumb">
              <div class="name"><a href="/wingspan">  Wingspan </a></div>
              <span class="price-new">₹3499</span>
              <span class="price-normal">₹3999</span>
              <span class="preorder-stock"> Pre-order </span>
            </div>
            <div class="product-thumb">
              <div class="name"><a href="https://shop.example.com/catan">Catan</a></div>
              <span class="price-normal">₹1999</span>
            </div>"#,
        );

        let entries = parser().parse(&html, PAGE_URL).unwrap();
        assert_eq!(
            entries,
            vec![
                ProductEntry::new("Wingspan", "₹3499", "https://shop.example.com/wingspan")
                    .with_stock_status("Pre-order"),
                ProductEntry::new("Catan", "₹1999", "https://shop.example.com/catan"),
            ]
        );
    }

    #[test]
    fn test_skips_items_without_link_or_price() {
        let html = page(
            r#"
            <div class="product-thumb"><span class="price-normal">₹100</span></div>
            <div class="product-thumb">
              <div class="name"><a href="/no-price">No Price</a></div>
              <span class="price-new">   </span>
            </div>
            <div class="product-thumb">
              <div class="name"><a>No Href</a></div>
              <span class="price-normal">₹200</span>
            </div>
            <div class="product-thumb">
              <div class="name"><a href="/azul">Azul</a></div>
              <span class="price-normal">₹2499</span>
            </div>"#,
        );

        let entries = parser().parse(&html, PAGE_URL).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Azul");
        assert!(entries[0].stock_status.is_none());
    }

    #[test]
    fn test_blank_discounted_price_falls_back_to_normal() {
        let html = page(
            r#"<div class="product-thumb">
                 <div class="name"><a href="/azul">Azul</a></div>
                 <span class="price-new"> </span>
                 <span class="price-normal">₹2499</span>
               </div>"#,
        );
        let entries = parser().parse(&html, PAGE_URL).unwrap();
        assert_eq!(entries[0].price, "₹2499");
    }

    #[test]
    fn test_empty_container_is_valid() {
        let entries = parser().parse(&page(""), PAGE_URL).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_missing_container_is_structure_error() {
        let html = r#"<html><body><div class="product-thumb"></div></body></html>"#;
        let err = parser().parse(html, PAGE_URL).unwrap_err();
        assert!(matches!(err, AppError::Structure { .. }));
    }

    /// Serve one canned HTTP response on a local port, returning its URL.
    async fn serve_once(status_line: &str, body: &str) -> String {
        use tokio::io::{AsyncReadExt, AsyncWriteExt};

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let response = format!(
            "HTTP/1.1 {status_line}\r\nContent-Type: text/html\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
            body.len()
        );

        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut request: Vec<u8> = Vec::new();
            let mut chunk = [0u8; 1024];
            while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                match socket.read(&mut chunk).await {
                    Ok(0) | Err(_) => break,
                    Ok(n) => request.extend_from_slice(&chunk[..n]),
                }
            }
            socket.write_all(response.as_bytes()).await.unwrap();
            let _ = socket.shutdown().await;
        });

        format!("http://{addr}/pre-orders?fq=1")
    }

    fn fetcher() -> ListingFetcher {
        ListingFetcher::new(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_fetch_error_status_is_fetch_error() {
        let url = serve_once("503 Service Unavailable", "").await;
        let category = Category::new("pre_orders", "Pre-Orders", url.as_str());

        let err = fetcher().fetch(&category).await.unwrap_err();
        match err {
            AppError::Fetch { url: failed, message } => {
                assert_eq!(failed, url);
                assert!(message.contains("503"));
            }
            other => panic!("expected fetch error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_fetch_page_without_container_is_structure_error() {
        let url = serve_once("200 OK", "<html></html>").await;
        let category = Category::new("new_arrivals", "New Arrivals", url);

        let err = fetcher().fetch(&category).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Structure { ref selector, .. } if selector == "div.main-products.product-grid"
        ));
    }

    #[tokio::test]
    async fn test_fetch_resolves_links_against_page_url() {
        let body = page(
            r#"<div class="product-thumb">
                 <div class="name"><a href="/azul">Azul</a></div>
                 <span class="price-normal">₹2499</span>
               </div>"#,
        );
        let url = serve_once("200 OK", &body).await;
        let category = Category::new("pre_orders", "Pre-Orders", url.as_str());

        let entries = fetcher().fetch(&category).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].title, "Azul");
        assert!(entries[0].url.starts_with("http://127.0.0.1:"));
        assert!(entries[0].url.ends_with("/azul"));
    }
}
