use crate::errors::{ListingError, SitemapError};
use crate::fetcher::PageFetcher;
use crate::ledger::{Ledger, SoldLog};
use crate::models::{ListingOutcome, ListingRecord, SkipReason};
use crate::parser::{Extraction, ListingExtractor, Normalization};
use crate::report::RunReporter;
use crate::sitemap::{self, SubSitemapSelection};
use anyhow::Result;
use chrono::{DateTime, Duration, Utc};
use scraper::Html;
use std::collections::HashSet;

pub const DEFAULT_INDEX_URL: &str = "https://www.steavycarter.com/sitemap.xml";
pub const DEFAULT_SITEMAP_PATTERN: &str = "property-sitemap";
pub const DEFAULT_FRESH_WINDOW_HOURS: i64 = 72;

/// The two historical entry points, expressed as option presets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunMode {
    /// 200 candidates from the first three property sitemaps, with a fresh feed.
    Daily,
    /// 100 candidates from the first property sitemap, no fresh feed.
    Classic,
}

/// Which records the full sitemap is rendered from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SitemapScope {
    /// Every ledger entry with listing data.
    Cumulative,
    /// Only records accepted or refreshed during this run.
    CurrentRun,
}

#[derive(Debug, Clone)]
pub struct EngineOptions {
    pub index_url: String,
    pub sitemap_pattern: String,
    pub selection: SubSitemapSelection,
    pub candidate_cap: usize,
    /// Re-fetch URLs the ledger already knows.
    pub refresh: bool,
    pub normalization: Normalization,
    /// `None` disables the fresh sitemap.
    pub fresh_window: Option<Duration>,
    pub scope: SitemapScope,
    pub standard_title_suffix: String,
    pub fresh_title_suffix: String,
}

impl EngineOptions {
    pub fn for_mode(mode: RunMode) -> Self {
        let (selection, candidate_cap, fresh_window) = match mode {
            RunMode::Daily => (
                SubSitemapSelection::FirstN(3),
                200,
                Some(Duration::hours(DEFAULT_FRESH_WINDOW_HOURS)),
            ),
            RunMode::Classic => (SubSitemapSelection::FirstMatch, 100, None),
        };

        Self {
            index_url: DEFAULT_INDEX_URL.to_string(),
            sitemap_pattern: DEFAULT_SITEMAP_PATTERN.to_string(),
            selection,
            candidate_cap,
            refresh: false,
            normalization: Normalization::default(),
            fresh_window,
            scope: SitemapScope::Cumulative,
            standard_title_suffix: "IDX Property | Steavy Carter Realtor".to_string(),
            fresh_title_suffix: "New MLS Listing | Steavy Carter".to_string(),
        }
    }
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self::for_mode(RunMode::Daily)
    }
}

pub trait Clock {
    fn now(&self) -> DateTime<Utc>;
}

pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Persistent state for one run. Handed to the engine and handed back.
#[derive(Debug, Clone, Default)]
pub struct RunState {
    pub ledger: Ledger,
    pub sold_log: SoldLog,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunSummary {
    /// Candidates considered after the cap.
    pub attempted: usize,
    pub added: usize,
    pub refreshed: usize,
    pub skipped_known: usize,
    pub skipped_sold: usize,
    pub sold: usize,
    pub rejected: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn skipped(&self) -> usize {
        self.skipped_known + self.skipped_sold
    }

    fn count(&mut self, outcome: &ListingOutcome) {
        match outcome {
            ListingOutcome::Skipped(SkipReason::Known) => self.skipped_known += 1,
            ListingOutcome::Skipped(SkipReason::PreviouslySold) => self.skipped_sold += 1,
            ListingOutcome::Failed(_) => self.errors += 1,
            ListingOutcome::Sold => self.sold += 1,
            ListingOutcome::Rejected(_) => self.rejected += 1,
            ListingOutcome::Accepted(_) => self.added += 1,
            ListingOutcome::Refreshed(_) => self.refreshed += 1,
        }
    }
}

pub struct RunOutput {
    pub state: RunState,
    /// Newly accepted this run, in processing order.
    pub accepted: Vec<ListingRecord>,
    /// Accepted and refreshed records, in processing order. One per URL.
    pub written: Vec<ListingRecord>,
    pub summary: RunSummary,
    pub finished_at: DateTime<Utc>,
}

impl RunOutput {
    pub fn sitemap_records(&self, scope: SitemapScope) -> Vec<ListingRecord> {
        match scope {
            SitemapScope::Cumulative => self.state.ledger.records(),
            SitemapScope::CurrentRun => self.written.clone(),
        }
    }
}

/// Index resolution plus collection. An index without property sitemaps is
/// logged and yields no URLs; every other failure aborts the run.
pub fn discover_listing_urls<F: PageFetcher>(
    fetcher: &F,
    options: &EngineOptions,
    reporter: &RunReporter,
) -> Result<Vec<String>, SitemapError> {
    let sitemaps = match sitemap::resolve_index(
        fetcher,
        &options.index_url,
        &options.sitemap_pattern,
        options.selection,
        reporter,
    ) {
        Ok(sitemaps) => sitemaps,
        Err(SitemapError::EmptyIndex { index_url }) => {
            reporter.warn("🚫", &format!("No property sitemap found in {}", index_url));
            return Ok(Vec::new());
        }
        Err(e) => return Err(e),
    };

    sitemap::collect_listing_urls(fetcher, &sitemaps, reporter)
}

/// Runs the per-listing state machine over the first `candidate_cap` URLs.
/// Never fails: every per-listing problem ends up in the summary.
pub fn process_listings<F: PageFetcher, C: Clock>(
    fetcher: &F,
    clock: &C,
    extractor: &ListingExtractor,
    mut state: RunState,
    listing_urls: &[String],
    options: &EngineOptions,
    reporter: &RunReporter,
) -> RunOutput {
    let candidates = &listing_urls[..listing_urls.len().min(options.candidate_cap)];
    let mut summary = RunSummary {
        attempted: candidates.len(),
        ..RunSummary::default()
    };
    let mut accepted = Vec::new();
    let mut written = Vec::new();
    // URLs already accepted or refreshed during this run
    let mut seen: HashSet<&str> = HashSet::new();

    reporter.info(
        "💥",
        &format!(
            "Processing up to {} properties ({} collected)",
            candidates.len(),
            listing_urls.len()
        ),
    );

    for url in candidates {
        let outcome = if seen.contains(url.as_str()) {
            ListingOutcome::Skipped(SkipReason::Known)
        } else {
            process_listing(fetcher, clock, extractor, &mut state, url, options, reporter)
        };
        report_outcome(reporter, url, &outcome);
        summary.count(&outcome);

        match outcome {
            ListingOutcome::Accepted(record) => {
                seen.insert(url.as_str());
                written.push(record.clone());
                accepted.push(record);
            }
            ListingOutcome::Refreshed(record) => {
                seen.insert(url.as_str());
                written.push(record);
            }
            _ => {}
        }
    }

    RunOutput {
        state,
        accepted,
        written,
        summary,
        finished_at: clock.now(),
    }
}

fn process_listing<F: PageFetcher, C: Clock>(
    fetcher: &F,
    clock: &C,
    extractor: &ListingExtractor,
    state: &mut RunState,
    url: &str,
    options: &EngineOptions,
    reporter: &RunReporter,
) -> ListingOutcome {
    if state.sold_log.contains(url) {
        return ListingOutcome::Skipped(SkipReason::PreviouslySold);
    }

    let known = state.ledger.contains(url);
    if known && !options.refresh {
        return ListingOutcome::Skipped(SkipReason::Known);
    }

    reporter.info("🔗", &format!("Visiting: {}", url));
    let page = match fetcher.fetch(url) {
        Ok(page) => page,
        Err(e) => return ListingOutcome::Failed(ListingError::from(e).to_string()),
    };

    let document = Html::parse_document(&page.body);
    let extraction = extractor.extract(&document);

    if !page.is_success() && !matches!(extraction, Extraction::Sold) {
        return ListingOutcome::Failed(ListingError::Status(page.status).to_string());
    }

    match extraction {
        Extraction::Sold => {
            state.sold_log.record(url);
            if known {
                state.ledger.remove(url);
            }
            ListingOutcome::Sold
        }
        Extraction::Rejected(missing) => ListingOutcome::Rejected(missing),
        Extraction::Listing(listing) => {
            let now = clock.now();
            if known {
                ListingOutcome::Refreshed(state.ledger.refresh(url, listing, now))
            } else {
                let record = ListingRecord {
                    listing,
                    discovered_at: now,
                };
                state.ledger.insert(url, &record);
                ListingOutcome::Accepted(record)
            }
        }
    }
}

fn report_outcome(reporter: &RunReporter, url: &str, outcome: &ListingOutcome) {
    match outcome {
        ListingOutcome::Skipped(SkipReason::Known) => {
            reporter.muted("⏩", &format!("Skipped (already known): {}", url))
        }
        ListingOutcome::Skipped(SkipReason::PreviouslySold) => {
            reporter.muted("⏩", &format!("Skipped previously sold: {}", url))
        }
        ListingOutcome::Failed(message) => reporter.error("❌", &format!("Error on {}: {}", url, message)),
        ListingOutcome::Sold => reporter.warn("⛔", &format!("Skipped (removed/sold page): {}", url)),
        ListingOutcome::Rejected(missing) => {
            let fields: Vec<String> = missing.iter().map(|field| field.to_string()).collect();
            reporter.warn(
                "⚠️",
                &format!("Missing data for {} ({})", url, fields.join(", ")),
            )
        }
        ListingOutcome::Accepted(record) => {
            reporter.success("✅", &format!("Added new: {}", record.listing.mls_url))
        }
        ListingOutcome::Refreshed(record) => {
            reporter.success("🔄", &format!("Refreshed: {}", record.listing.mls_url))
        }
    }
}

/// One full engine pass: discover, cap, process. Stage failures are returned
/// before any state is touched.
pub fn run_engine<F: PageFetcher, C: Clock>(
    fetcher: &F,
    clock: &C,
    state: RunState,
    options: &EngineOptions,
    reporter: &RunReporter,
) -> Result<RunOutput> {
    let extractor = ListingExtractor::new(options.normalization.clone())?;
    let listing_urls = discover_listing_urls(fetcher, options, reporter)?;

    Ok(process_listings(
        fetcher,
        clock,
        &extractor,
        state,
        &listing_urls,
        options,
        reporter,
    ))
}
