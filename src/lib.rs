use scraper::{ElementRef, Html};
use std::fmt;
use tracing::{debug, error, info, warn};

pub mod caguns;
pub mod config;
pub mod fetcher;
pub mod notify;
pub mod pacer;
pub mod twilio;

mod data;
mod error;
mod utils;

pub use config::Config;
pub use data::Table;
pub use error::{CrawlerError, Rejection};
pub use fetcher::{ListingPage, PageFetcher};
pub use pacer::{FixedDelay, Pacer};
pub use utils::parse_datetime;

/// One listing entry inside a parsed page, before field extraction.
pub type AdNode<'a> = ElementRef<'a>;

pub trait Listing {
    /// Absolute listing URL, the deduplication key.
    fn link(&self) -> &str;
    fn title(&self) -> &str;
}

pub trait Crawler {
    type Document: Listing + fmt::Display + Send + Sync;

    /// Ad entries of the page's listing container in document order, or `None` when the
    /// page has no container.
    fn ad_nodes<'a>(&self, doc: &'a Html) -> Option<Vec<AdNode<'a>>>;
    fn extract(&self, node: AdNode<'_>) -> Result<Self::Document, Rejection>;
}

#[async_trait::async_trait]
pub trait PageSource {
    async fn fetch(&self, page: u32) -> Result<ListingPage, CrawlerError>;
}

#[async_trait::async_trait]
pub trait Store {
    type Record: Listing;

    async fn exists(&self, link: &str) -> Result<bool, CrawlerError>;

    /// Fails with [`CrawlerError::StoreConflict`] when the link is already stored.
    async fn insert(&self, record: &Self::Record) -> Result<(), CrawlerError>;
}

#[async_trait::async_trait]
pub trait Notifier {
    /// Delivers one payload and returns the channel's delivery id.
    async fn deliver(&self, payload: &str) -> Result<String, CrawlerError>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunSettings {
    pub max_pages: u32,
    /// Extract and log candidates without touching the store or the notifier.
    pub dry_run: bool,
}

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct RunReport {
    pub pages_fetched: u32,
    pub pages_failed: u32,
    pub candidates: usize,
    pub rejected: usize,
    pub duplicates: usize,
    pub store_failures: usize,
    pub new_ads: usize,
    pub delivery: Option<Result<String, String>>,
}

pub struct Coordinator<C, F, S, N, P> {
    settings: RunSettings,
    crawler: C,
    fetcher: F,
    store: S,
    notifier: Option<N>,
    pacer: P,
}

impl<C, F, S, N, P> Coordinator<C, F, S, N, P>
where
    C: Crawler,
    F: PageSource,
    S: Store<Record = C::Document>,
    N: Notifier,
    P: Pacer,
{
    /// A `None` notifier disables the end-of-run notification.
    pub fn new(
        settings: RunSettings,
        crawler: C,
        fetcher: F,
        store: S,
        notifier: Option<N>,
        pacer: P,
    ) -> Self {
        Coordinator {
            settings,
            crawler,
            fetcher,
            store,
            notifier,
            pacer,
        }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn fetcher(&self) -> &F {
        &self.fetcher
    }

    pub fn notifier(&self) -> Option<&N> {
        self.notifier.as_ref()
    }

    pub fn pacer(&self) -> &P {
        &self.pacer
    }

    pub async fn run(&self) -> RunReport {
        let mut report = RunReport::default();
        let mut messages: Vec<String> = vec![];

        for page in 1..=self.settings.max_pages {
            self.process_page(page, &mut report, &mut messages).await;

            if page < self.settings.max_pages {
                self.pacer.pause().await;
            }
        }

        match &self.notifier {
            Some(notifier) if !messages.is_empty() => {
                let delivery = notify::send_batch(notifier, &messages)
                    .await
                    .map_err(|e| e.to_string());
                report.delivery = Some(delivery);
            }
            Some(_) => debug!("No new ads, nothing to notify"),
            None => debug!("Notifications disabled"),
        }

        info!(
            pages_fetched = report.pages_fetched,
            pages_failed = report.pages_failed,
            rejected = report.rejected,
            duplicates = report.duplicates,
            store_failures = report.store_failures,
            "Scraping complete. {} new ad(s) added.",
            report.new_ads
        );
        report
    }

    async fn process_page(&self, page: u32, report: &mut RunReport, messages: &mut Vec<String>) {
        let listing = match self.fetcher.fetch(page).await {
            Ok(listing) => listing,
            Err(e) => {
                warn!(page, error = %e, "Skipping page");
                report.pages_failed += 1;
                return;
            }
        };
        report.pages_fetched += 1;
        debug!(page, status = listing.status, "Fetched page");

        let candidates = {
            let doc = Html::parse_document(&listing.markup);
            match self.crawler.ad_nodes(&doc) {
                Some(nodes) => {
                    debug!(page, "Found {} ad node(s)", nodes.len());
                    nodes
                        .into_iter()
                        .map(|node| self.crawler.extract(node))
                        .collect::<Vec<_>>()
                }
                None => {
                    let e = CrawlerError::ContainerNotFound { page };
                    warn!(page, error = %e, "Skipping page");
                    return;
                }
            }
        };

        for candidate in candidates {
            match candidate {
                Ok(ad) => self.ingest(ad, report, messages).await,
                Err(reason) => {
                    debug!(page, %reason, "Rejected ad");
                    report.rejected += 1;
                }
            }
        }
    }

    async fn ingest(&self, ad: C::Document, report: &mut RunReport, messages: &mut Vec<String>) {
        report.candidates += 1;
        if self.settings.dry_run {
            info!(link = ad.link(), "Candidate: {}", ad.title());
            return;
        }

        match self.store.exists(ad.link()).await {
            Ok(true) => {
                debug!(link = ad.link(), "Ad already exists");
                report.duplicates += 1;
                return;
            }
            Ok(false) => {}
            Err(e) => {
                error!(link = ad.link(), error = %e, "Existence check failed");
                report.store_failures += 1;
                return;
            }
        }

        match self.store.insert(&ad).await {
            Ok(()) => {
                report.new_ads += 1;
                info!("[{}] Added ad: {}", report.new_ads, ad.title());
                messages.push(ad.to_string());
            }
            Err(CrawlerError::StoreConflict { link }) => {
                debug!(link = %link, "Ad already exists");
                report.duplicates += 1;
            }
            Err(e) => {
                error!(link = ad.link(), error = %e, "Failed to store ad");
                report.store_failures += 1;
            }
        }
    }
}
