use anyhow::{bail, Result};
use clap::{Parser, ValueEnum};
use listingmap::engine::{self, EngineOptions, RunMode, RunState, SitemapScope, SystemClock};
use listingmap::fetcher::HttpFetcher;
use listingmap::ledger::{Ledger, SoldLog};
use listingmap::output::{self, OutputPaths};
use listingmap::report::RunReporter;
use listingmap::sitemap::SubSitemapSelection;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// 200 listings from up to 3 property sitemaps, plus the fresh feed
    Daily,
    /// 100 listings from the first property sitemap, no fresh feed
    Classic,
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Scope {
    Cumulative,
    CurrentRun,
}

#[derive(Parser, Debug)]
#[command(author, version, about = "Listingmap - MLS listing sitemap generator")]
struct Args {
    /// Preset for caps, sub-sitemap selection and the fresh feed
    #[arg(long, value_enum, default_value_t = Mode::Daily)]
    mode: Mode,

    /// Root sitemap index URL
    #[arg(long)]
    index_url: Option<String>,

    /// Regex a sub-sitemap location must match to be used
    #[arg(long)]
    sitemap_pattern: Option<String>,

    /// Use at most this many matching sub-sitemaps (1 = first match only)
    #[arg(long)]
    max_sitemaps: Option<usize>,

    /// Maximum number of candidate listing URLs per run
    #[arg(short = 'i', long)]
    max_listings: Option<usize>,

    /// Re-fetch listings already in the ledger
    #[arg(short, long)]
    refresh: bool,

    /// Do not write sitemap-new.xml
    #[arg(long)]
    no_fresh: bool,

    /// Trailing window for sitemap-new.xml, in hours
    #[arg(long, value_parser = clap::value_parser!(i64).range(1..))]
    fresh_hours: Option<i64>,

    /// Cut image URLs at the first occurrence of this character
    #[arg(long)]
    image_separator: Option<char>,

    /// Keep '&' in addresses instead of replacing it with "and"
    #[arg(long)]
    keep_ampersands: bool,

    /// Render the full sitemap from the whole ledger or from this run only
    #[arg(long, value_enum)]
    scope: Option<Scope>,

    /// Directory holding the ledger, sold log and generated files
    #[arg(short, long, default_value = ".")]
    out_dir: PathBuf,

    /// HTTP timeout per request, in seconds
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

impl Args {
    fn engine_options(&self) -> Result<EngineOptions> {
        let mode = match self.mode {
            Mode::Daily => RunMode::Daily,
            Mode::Classic => RunMode::Classic,
        };
        let mut options = EngineOptions::for_mode(mode);

        if let Some(url) = &self.index_url {
            options.index_url = url.clone();
        }
        if let Some(pattern) = &self.sitemap_pattern {
            options.sitemap_pattern = pattern.clone();
        }
        match self.max_sitemaps {
            Some(0) => bail!("--max-sitemaps must be at least 1"),
            Some(1) => options.selection = SubSitemapSelection::FirstMatch,
            Some(n) => options.selection = SubSitemapSelection::FirstN(n),
            None => {}
        }
        if let Some(cap) = self.max_listings {
            options.candidate_cap = cap;
        }
        options.refresh = self.refresh;
        if let Some(hours) = self.fresh_hours {
            options.fresh_window = Some(chrono::Duration::hours(hours));
        }
        if self.no_fresh {
            options.fresh_window = None;
        }
        if let Some(separator) = self.image_separator {
            options.normalization.image_param_separator = separator;
        }
        if self.keep_ampersands {
            options.normalization.ampersand_substitution = false;
        }
        if let Some(scope) = self.scope {
            options.scope = match scope {
                Scope::Cumulative => SitemapScope::Cumulative,
                Scope::CurrentRun => SitemapScope::CurrentRun,
            };
        }

        Ok(options)
    }
}

fn run(args: &Args, reporter: &RunReporter) -> Result<()> {
    let options = args.engine_options()?;
    let paths = OutputPaths::in_dir(&args.out_dir);

    let state = RunState {
        ledger: Ledger::load(&paths.ledger)?,
        sold_log: SoldLog::load(&paths.sold_log)?,
    };
    reporter.muted(
        "📁",
        &format!(
            "Loaded {} known listings and {} sold URLs",
            state.ledger.len(),
            state.sold_log.len()
        ),
    );

    let fetcher = HttpFetcher::new(Duration::from_secs(args.timeout_secs))?;
    let mut run = engine::run_engine(&fetcher, &SystemClock, state, &options, reporter)?;

    output::write_outputs(&paths, &mut run, &options, reporter)?;
    reporter.summary(&run.summary);

    Ok(())
}

fn main() {
    let args = Args::parse();
    listingmap::debug::set_verbose(args.debug);

    println!("Listingmap - MLS Listing Sitemap Generator");
    println!("==========================================");

    let reporter = RunReporter::new();
    if let Err(e) = run(&args, &reporter) {
        reporter.error("💥", &format!("Run aborted: {:#}", e));
        std::process::exit(1);
    }
}
