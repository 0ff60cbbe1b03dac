use crate::errors::SitemapError;
use crate::fetcher::PageFetcher;
use crate::report::RunReporter;
use quick_xml::events::Event;
use quick_xml::Reader;
use regex::Regex;

/// How many matching sub-sitemaps the index resolver keeps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubSitemapSelection {
    FirstMatch,
    FirstN(usize),
}

impl SubSitemapSelection {
    pub fn limit(self) -> usize {
        match self {
            SubSitemapSelection::FirstMatch => 1,
            SubSitemapSelection::FirstN(n) => n,
        }
    }
}

/// `<loc>` values of every `<sitemap>` in a sitemap index, in document order.
pub fn parse_sitemap_index(xml: &str) -> Result<Vec<String>, String> {
    extract_locs(xml, b"sitemap")
}

/// `<loc>` values of every `<url>` in a urlset, in document order.
pub fn parse_urlset(xml: &str) -> Result<Vec<String>, String> {
    extract_locs(xml, b"url")
}

fn extract_locs(xml: &str, entry: &[u8]) -> Result<Vec<String>, String> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut locs = Vec::new();
    let mut depth = 0usize;
    // Only a <loc> directly under the entry counts; image:loc and friends don't.
    let mut entry_depth: Option<usize> = None;
    let mut current: Option<String> = None;

    loop {
        match reader.read_event().map_err(|e| e.to_string())? {
            Event::Start(e) => {
                depth += 1;
                let name = e.local_name();
                if entry_depth.is_none() && name.as_ref() == entry {
                    entry_depth = Some(depth);
                } else if name.as_ref() == b"loc" && entry_depth == Some(depth - 1) {
                    current = Some(String::new());
                }
            }
            Event::Text(e) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&e.unescape().map_err(|e| e.to_string())?);
                }
            }
            Event::CData(e) => {
                if let Some(buf) = current.as_mut() {
                    buf.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
            }
            Event::End(_) => {
                if let Some(loc) = current.take() {
                    let loc = loc.trim();
                    if !loc.is_empty() {
                        locs.push(loc.to_string());
                    }
                }
                if entry_depth == Some(depth) {
                    entry_depth = None;
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(locs)
}

/// Fetches the root index and keeps the sub-sitemaps whose location matches
/// `pattern`, capped by `selection`. No match yields `SitemapError::EmptyIndex`.
pub fn resolve_index<F: PageFetcher>(
    fetcher: &F,
    index_url: &str,
    pattern: &str,
    selection: SubSitemapSelection,
    reporter: &RunReporter,
) -> Result<Vec<String>, SitemapError> {
    let pattern = Regex::new(pattern)?;

    reporter.info("🔍", &format!("Fetching main sitemap: {}", index_url));
    let xml = fetcher
        .fetch_text(index_url)
        .map_err(|source| SitemapError::Fetch {
            url: index_url.to_string(),
            source,
        })?;

    let all_sub_sitemaps = parse_sitemap_index(&xml).map_err(|message| SitemapError::Parse {
        url: index_url.to_string(),
        message,
    })?;
    reporter.info("📦", &format!("Sub-sitemaps found: {}", all_sub_sitemaps.len()));

    let selected: Vec<String> = all_sub_sitemaps
        .into_iter()
        .filter(|loc| pattern.is_match(loc))
        .take(selection.limit())
        .collect();

    if selected.is_empty() {
        return Err(SitemapError::EmptyIndex {
            index_url: index_url.to_string(),
        });
    }

    for sitemap in &selected {
        reporter.info("📄", &format!("Using property sitemap: {}", sitemap));
    }

    Ok(selected)
}

/// Flattens the selected sub-sitemaps into listing URLs. Duplicates across
/// sub-sitemaps are kept; any single failure aborts collection.
pub fn collect_listing_urls<F: PageFetcher>(
    fetcher: &F,
    sitemaps: &[String],
    reporter: &RunReporter,
) -> Result<Vec<String>, SitemapError> {
    let mut listing_urls = Vec::new();

    for sitemap in sitemaps {
        reporter.info("📥", &format!("Reading: {}", sitemap));
        let xml = fetcher
            .fetch_text(sitemap)
            .map_err(|source| SitemapError::Fetch {
                url: sitemap.clone(),
                source,
            })?;

        let urls = parse_urlset(&xml).map_err(|message| SitemapError::Parse {
            url: sitemap.clone(),
            message,
        })?;
        crate::debug_println!("{} listed {} URLs", sitemap, urls.len());
        listing_urls.extend(urls);
    }

    Ok(listing_urls)
}
