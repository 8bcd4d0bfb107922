use clap::Parser;
use classified_ads_crawler::caguns::{CagunsCrawler, CagunsData};
use classified_ads_crawler::twilio::TwilioService;
use classified_ads_crawler::{Config, Coordinator, FixedDelay, PageFetcher};
use tracing::info;
use tracing_error::ErrorLayer;
use tracing_subscriber::prelude::*;

/// Scrape new classified ads, store the unseen ones and text a summary.
#[derive(Parser, Debug)]
#[command(version, about)]
struct Cli {
    /// Number of listing pages to walk (overrides CRAWLER_MAX_PAGES)
    #[arg(short = 'n', long)]
    max_pages: Option<u32>,

    /// SQLite database file (overrides CRAWLER_DATABASE)
    #[arg(long)]
    database: Option<String>,

    /// Delay between page fetches in milliseconds (overrides CRAWLER_PAGE_DELAY_MS)
    #[arg(long)]
    delay_ms: Option<u64>,

    /// Do not send the SMS summary
    #[arg(long)]
    no_notify: bool,

    /// Extract and log candidates without storing or notifying
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(tracing_subscriber::fmt::layer())
        .with(
            tracing_subscriber::EnvFilter::try_from_env("LOG_LEVEL").unwrap_or_else(|_| {
                "info,html5ever=error,selectors=error,hyper=warn,reqwest=info,sqlx=warn".into()
            }),
        )
        .with(ErrorLayer::default())
        .init();

    let cli = Cli::parse();

    let mut config = if cli.no_notify {
        Config::from_env_with(&[("NOTIFY_ENABLED", "false")])?
    } else {
        Config::from_env()?
    };
    if let Some(max_pages) = cli.max_pages.filter(|n| *n > 0) {
        config.max_pages = max_pages;
    }
    if let Some(database) = cli.database {
        config.database = database;
    }
    if let Some(delay_ms) = cli.delay_ms {
        config.page_delay_ms = delay_ms;
    }

    info!(
        base_url = %config.base_url,
        filter = %config.filter,
        region = %config.region,
        sub_region = %config.sub_region,
        max_pages = config.max_pages,
        "Fetching classifieds"
    );

    let crawler = CagunsCrawler::new(config.base_url.clone(), &config.region, &config.sub_region);
    let fetcher = PageFetcher::new(
        config.base_url.clone(),
        &config.filter,
        config.user_agent.as_deref(),
        config.cookie.as_deref(),
    )?;
    let store = CagunsData::new(&config.database).await?;
    let notifier = config.twilio.clone().map(TwilioService::new);
    let pacer = FixedDelay::from_millis(config.page_delay_ms);

    let coordinator = Coordinator::new(
        config.run_settings(cli.dry_run),
        crawler,
        fetcher,
        store,
        notifier,
        pacer,
    );
    let report = coordinator.run().await;

    info!("Total ads stored: {}", coordinator.store().count().await?);
    println!("Scraping complete. {} new ad(s) added.", report.new_ads);

    Ok(())
}
