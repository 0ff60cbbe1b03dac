use crate::{debug_eprintln, debug_println};
use crate::errors::FetchError;
use anyhow::Result;
use reqwest::blocking::Client;
use std::time::Duration;

const USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

/// Raw response for a page. Not-found bodies are kept so the extractor can
/// still look for the removed-listing marker.
#[derive(Debug, Clone)]
pub struct FetchedPage {
    pub status: u16,
    pub body: String,
}

impl FetchedPage {
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

pub trait PageFetcher {
    /// Returns the page for 2xx, 404 and 410 responses; any other status or
    /// a transport problem is an error.
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError>;

    /// Like `fetch`, but anything other than 2xx is an error.
    fn fetch_text(&self, url: &str) -> Result<String, FetchError> {
        let page = self.fetch(url)?;
        if !page.is_success() {
            return Err(FetchError::Status(page.status));
        }
        Ok(page.body)
    }
}

pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .build()?;

        Ok(Self { client })
    }
}

impl PageFetcher for HttpFetcher {
    fn fetch(&self, url: &str) -> Result<FetchedPage, FetchError> {
        debug_println!("GET {}", url);
        let response = self.client.get(url).send().map_err(|e| {
            debug_eprintln!("GET {} failed: {:?}", url, e);
            FetchError::from(e)
        })?;
        let status = response.status();

        if !status.is_success() && status.as_u16() != 404 && status.as_u16() != 410 {
            return Err(FetchError::Status(status.as_u16()));
        }

        let body = response.text()?;
        debug_println!("{} -> HTTP {} ({} bytes)", url, status.as_u16(), body.len());

        Ok(FetchedPage {
            status: status.as_u16(),
            body,
        })
    }
}
