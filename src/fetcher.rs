use crate::{CrawlerError, PageSource};
use reqwest::header::{self, HeaderMap, HeaderValue};
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingPage {
    pub page: u32,
    pub status: u16,
    pub markup: String,
}

/// `{base}/classifieds/?filter={filter}&sort=create_date&page={page}`
pub fn listing_url(base: &Url, filter: &str, page: u32) -> Result<Url, CrawlerError> {
    let mut url = base.join("/classifieds/")?;
    url.query_pairs_mut()
        .append_pair("filter", filter)
        .append_pair("sort", "create_date")
        .append_pair("page", &page.to_string());
    Ok(url)
}

pub struct PageFetcher {
    client: reqwest::Client,
    base_url: Url,
    filter: String,
}

impl PageFetcher {
    pub fn new(
        base_url: Url,
        filter: &str,
        user_agent: Option<&str>,
        cookie: Option<&str>,
    ) -> Result<PageFetcher, CrawlerError> {
        let mut headers = HeaderMap::new();
        headers.insert(
            header::ACCEPT,
            HeaderValue::from_static(
                "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8",
            ),
        );
        headers.insert(
            header::ACCEPT_LANGUAGE,
            HeaderValue::from_static("en-US,en;q=0.9"),
        );
        headers.insert(
            header::REFERER,
            HeaderValue::from_str(base_url.as_str())
                .map_err(|e| CrawlerError::Config(format!("base url as referer: {e}")))?,
        );
        if let Some(cookie) = cookie {
            headers.insert(
                header::COOKIE,
                HeaderValue::from_str(cookie)
                    .map_err(|e| CrawlerError::Config(format!("CRAWLER_COOKIE: {e}")))?,
            );
        }

        let client = reqwest::Client::builder()
            .user_agent(user_agent.unwrap_or(DEFAULT_USER_AGENT))
            .default_headers(headers)
            .cookie_store(true)
            .gzip(true)
            .brotli(true)
            .timeout(REQUEST_TIMEOUT)
            .build()?;

        Ok(PageFetcher {
            client,
            base_url,
            filter: filter.to_string(),
        })
    }

    pub fn page_url(&self, page: u32) -> Result<Url, CrawlerError> {
        listing_url(&self.base_url, &self.filter, page)
    }
}

#[async_trait::async_trait]
impl PageSource for PageFetcher {
    async fn fetch(&self, page: u32) -> Result<ListingPage, CrawlerError> {
        let url = self.page_url(page)?;
        debug!("Visit {}", url);

        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            warn!(page, status = status.as_u16(), "Error fetching the site");
            return Err(CrawlerError::FetchStatus {
                page,
                status: status.as_u16(),
            });
        }

        let markup = response.text().await?;
        Ok(ListingPage {
            page,
            status: status.as_u16(),
            markup,
        })
    }
}
