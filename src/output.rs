use crate::engine::{EngineOptions, RunOutput};
use crate::models::ListingRecord;
use crate::report::RunReporter;
use crate::utils;
use anyhow::{Context, Result};
use chrono::{DateTime, Duration, NaiveDate, Utc};
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use std::path::{Path, PathBuf};

const SITEMAP_NS: &str = "http://www.sitemaps.org/schemas/sitemap/0.9";
const IMAGE_NS: &str = "http://www.google.com/schemas/sitemap-image/1.1";

pub const FULL_SITEMAP_FILE: &str = "mls-sitemap.xml";
pub const FRESH_SITEMAP_FILE: &str = "sitemap-new.xml";
pub const LEDGER_FILE: &str = "visited-properties.json";
pub const NEW_LISTINGS_FILE: &str = "new-properties.json";
pub const SOLD_LOG_FILE: &str = "sold-log.txt";

/// Priority/changefreq pair of a rendered sitemap.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapProfile {
    Standard,
    Fresh,
}

impl SitemapProfile {
    pub fn priority(self) -> &'static str {
        match self {
            SitemapProfile::Standard => "0.9",
            SitemapProfile::Fresh => "1.0",
        }
    }

    pub fn changefreq(self) -> &'static str {
        match self {
            SitemapProfile::Standard => "daily",
            SitemapProfile::Fresh => "hourly",
        }
    }
}

/// Where a run reads and writes its files.
#[derive(Debug, Clone)]
pub struct OutputPaths {
    pub full_sitemap: PathBuf,
    pub fresh_sitemap: PathBuf,
    pub ledger: PathBuf,
    pub new_listings: PathBuf,
    pub sold_log: PathBuf,
}

impl OutputPaths {
    pub fn in_dir(dir: &Path) -> Self {
        Self {
            full_sitemap: dir.join(FULL_SITEMAP_FILE),
            fresh_sitemap: dir.join(FRESH_SITEMAP_FILE),
            ledger: dir.join(LEDGER_FILE),
            new_listings: dir.join(NEW_LISTINGS_FILE),
            sold_log: dir.join(SOLD_LOG_FILE),
        }
    }
}

/// Records discovered within `window` of `now`.
pub fn fresh_subset(records: &[ListingRecord], now: DateTime<Utc>, window: Duration) -> Vec<ListingRecord> {
    let cutoff = now - window;
    records
        .iter()
        .filter(|record| record.discovered_at >= cutoff)
        .cloned()
        .collect()
}

/// Renders a namespaced `urlset` with one `url` block per record. Every entry
/// shares the same `lastmod`.
pub fn render_sitemap(
    records: &[ListingRecord],
    profile: SitemapProfile,
    title_suffix: &str,
    lastmod: NaiveDate,
) -> Result<String> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    let lastmod = lastmod.format("%Y-%m-%d").to_string();

    writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
    writer.write_event(Event::Start(
        BytesStart::new("urlset").with_attributes([("xmlns", SITEMAP_NS), ("xmlns:image", IMAGE_NS)]),
    ))?;

    for record in records {
        let title = format!("{} | {}", record.listing.address, title_suffix);

        writer.write_event(Event::Start(BytesStart::new("url")))?;
        write_text_element(&mut writer, "loc", &record.listing.mls_url)?;
        writer.write_event(Event::Start(BytesStart::new("image:image")))?;
        write_text_element(&mut writer, "image:loc", &record.listing.img)?;
        write_text_element(&mut writer, "image:title", &title)?;
        writer.write_event(Event::End(BytesEnd::new("image:image")))?;
        write_text_element(&mut writer, "priority", profile.priority())?;
        write_text_element(&mut writer, "changefreq", profile.changefreq())?;
        write_text_element(&mut writer, "lastmod", &lastmod)?;
        writer.write_event(Event::End(BytesEnd::new("url")))?;
    }

    writer.write_event(Event::End(BytesEnd::new("urlset")))?;

    let mut xml = String::from_utf8(writer.into_inner()).context("Rendered sitemap is not UTF-8")?;
    xml.push('\n');
    Ok(xml)
}

fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// Writes every artifact of a finished run. The ledger goes last so a failed
/// sitemap write never advances it.
pub fn write_outputs(
    paths: &OutputPaths,
    run: &mut RunOutput,
    options: &EngineOptions,
    reporter: &RunReporter,
) -> Result<()> {
    let lastmod = run.finished_at.date_naive();

    let full = run.sitemap_records(options.scope);
    let xml = render_sitemap(&full, SitemapProfile::Standard, &options.standard_title_suffix, lastmod)?;
    utils::write_atomically(&paths.full_sitemap, xml.as_bytes())?;
    reporter.info(
        "🗺️",
        &format!("{} saved with {} entries", paths.full_sitemap.display(), full.len()),
    );

    if let Some(window) = options.fresh_window {
        let fresh = fresh_subset(&run.accepted, run.finished_at, window);
        let xml = render_sitemap(&fresh, SitemapProfile::Fresh, &options.fresh_title_suffix, lastmod)?;
        utils::write_atomically(&paths.fresh_sitemap, xml.as_bytes())?;
        reporter.info(
            "🚀",
            &format!("{} saved with {} new entries", paths.fresh_sitemap.display(), fresh.len()),
        );
    }

    let snapshot = serde_json::to_string_pretty(&run.accepted).context("Failed to serialize new listings")?;
    utils::write_atomically(&paths.new_listings, snapshot.as_bytes())?;

    let sold = run.state.sold_log.append_pending(&paths.sold_log)?;
    if sold > 0 {
        reporter.info("📁", &format!("Logged {} newly sold listings.", sold));
    }

    run.state.ledger.save(&paths.ledger)?;
    reporter.info(
        "📝",
        &format!(
            "Saved {} ({} known) and {}",
            paths.ledger.display(),
            run.state.ledger.len(),
            paths.new_listings.display()
        ),
    );

    Ok(())
}
