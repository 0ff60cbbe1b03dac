#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use listingmap::engine::{Clock, EngineOptions};
use listingmap::errors::FetchError;
use listingmap::fetcher::{FetchedPage, PageFetcher};
use std::cell::RefCell;
use std::collections::HashMap;

pub const INDEX_URL: &str = "https://site/sitemap.xml";

/// In-memory site: unknown URLs fail like a refused connection.
#[derive(Default)]
pub struct FakeSite {
    pages: HashMap<String, FetchedPage>,
    requests: RefCell<Vec<String>>,
}

impl FakeSite {
    pub fn new() -> Self {
        Self::default()
    }

    /// Root index pointing at one property sitemap holding `urls`.
    pub fn with_listings(urls: &[String]) -> Self {
        let sitemap = "https://site/property-sitemap.xml".to_string();
        Self::new()
            .page(INDEX_URL, &index_xml(&[sitemap.clone()]))
            .page(&sitemap, &urlset_xml(urls))
    }

    pub fn page(mut self, url: &str, body: &str) -> Self {
        self.pages.insert(url.to_string(), FetchedPage::ok(body));
        self
    }

    pub fn status(mut self, url: &str, status: u16, body: &str) -> Self {
        self.pages.insert(
            url.to_string(),
            FetchedPage {
                status,
                body: body.to_string(),
            },
        );
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }

    pub fn fetch_count(&self, url: &str) -> usize {
        self.requests.borrow().iter().filter(|r| r.as_str() == url).count()
    }
}

impl PageFetcher for FakeSite {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        self.requests.borrow_mut().push(url.to_string());
        let page = self
            .pages
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::Transport(format!("connection refused: {}", url)))?;

        if !page.is_success() && page.status != 404 && page.status != 410 {
            return Err(FetchError::Status(page.status));
        }
        Ok(page)
    }
}

pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

pub fn run_time() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 7, 25, 12, 0, 0).unwrap()
}

pub fn options() -> EngineOptions {
    EngineOptions {
        index_url: INDEX_URL.to_string(),
        ..EngineOptions::default()
    }
}

pub fn listing_url(n: usize) -> String {
    format!("https://site/property/{}", n)
}

pub fn index_xml(sitemaps: &[String]) -> String {
    let entries: String = sitemaps
        .iter()
        .map(|loc| format!("<sitemap><loc>{}</loc></sitemap>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</sitemapindex>"#,
        entries
    )
}

pub fn urlset_xml(urls: &[String]) -> String {
    let entries: String = urls
        .iter()
        .map(|loc| format!("<url><loc>{}</loc></url>", loc))
        .collect();
    format!(
        r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
        entries
    )
}

pub fn listing_html(mls_url: &str, img: &str, address: &str) -> String {
    format!(
        r#"<html><head><meta property="og:image" content="{}"></head>
<body><h2 class="heading">{}</h2><div class="copy-url-in"><input type="text" value="{}"></div></body></html>"#,
        img, address, mls_url
    )
}

/// Listing page for `url`, with fields derived from the URL.
pub fn listing_for(url: &str) -> String {
    let slug = url.rsplit('/').next().unwrap_or_default();
    listing_html(
        &format!("https://site/idx/{}", slug),
        &format!("https://img/{}.jpg?w=800", slug),
        &format!("{} Main St", slug),
    )
}

pub fn sold_html() -> String {
    r#"<html><body class="error404"><h1>Oops! That page can't be found.</h1></body></html>"#.to_string()
}
