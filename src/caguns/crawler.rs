use crate::{
    caguns::ClassifiedAd,
    parse_datetime,
    utils::{collapse_whitespace, normalize_key},
    AdNode, Crawler, Rejection,
};
use chrono::{DateTime, FixedOffset};
use lazy_static::lazy_static;
use scraper::{ElementRef, Html, Selector};
use std::collections::HashMap;
use tracing::warn;
use url::Url;

const E: &str = "Invalid selector";
lazy_static! {
    static ref CONTAINER: Selector =
        Selector::parse("div.structItemContainerCasListView").expect(E);
    // Ads carry extra modifier classes, so match on a substring of the class attribute.
    static ref AD: Selector = Selector::parse(r#"div[class*="structItem--ad"]"#).expect(E);
    static ref CUSTOM_FIELD: Selector = Selector::parse("dl.pairs--customField").expect(E);
    static ref DT: Selector = Selector::parse("dt").expect(E);
    static ref DD: Selector = Selector::parse("dd").expect(E);
    static ref TITLE: Selector = Selector::parse(".structItem-title").expect(E);
    static ref A: Selector = Selector::parse("a[href]").expect(E);
    static ref DESCRIPTION: Selector = Selector::parse(".structItem-adDescription").expect(E);
    static ref PRICE: Selector = Selector::parse(".structItem-adPrice").expect(E);
    static ref CREATED: Selector = Selector::parse(".structItem-adCreateDate time").expect(E);
    static ref UPDATED: Selector = Selector::parse(".structItem-adUpdateDate time").expect(E);
}

#[derive(Debug)]
pub struct CagunsCrawler {
    base_url: Url,
    region: String,
    sub_region: String,
}

impl CagunsCrawler {
    pub fn new(base_url: Url, region: &str, sub_region: &str) -> CagunsCrawler {
        CagunsCrawler {
            base_url,
            region: region.to_lowercase(),
            sub_region: sub_region.to_lowercase(),
        }
    }

    fn is_accepted(&self, region: &str, sub_region: &str) -> bool {
        region.to_lowercase() == self.region && sub_region.to_lowercase() == self.sub_region
    }

    fn custom_fields(&self, node: AdNode<'_>) -> HashMap<String, String> {
        node.select(&CUSTOM_FIELD)
            .filter_map(|dl| {
                let key = dl
                    .value()
                    .attr("data-field")
                    .map(ToString::to_string)
                    .or_else(|| dl.select(&DT).next().map(text))?;
                let value = dl.select(&DD).next().map(text).unwrap_or_default();
                Some((normalize_key(&key), value))
            })
            .collect()
    }

    fn timestamp(&self, el: Option<ElementRef<'_>>, field: &str) -> Option<DateTime<FixedOffset>> {
        let el = el?;
        let raw = el
            .value()
            .attr("datetime")
            .or_else(|| el.value().attr("data-time"))?;

        let parsed = parse_datetime(raw).or_else(|| {
            el.value()
                .attr("data-time")
                .filter(|t| *t != raw)
                .and_then(parse_datetime)
        });
        if parsed.is_none() {
            warn!(field, raw, "Unparseable datetime");
        }
        parsed
    }
}

fn text(el: ElementRef<'_>) -> String {
    collapse_whitespace(&el.text().collect::<String>())
}

impl Crawler for CagunsCrawler {
    type Document = ClassifiedAd;

    fn ad_nodes<'a>(&self, doc: &'a Html) -> Option<Vec<AdNode<'a>>> {
        let container = doc.select(&CONTAINER).next()?;
        Some(container.select(&AD).collect())
    }

    fn extract(&self, node: AdNode<'_>) -> Result<ClassifiedAd, Rejection> {
        let mut fields = self.custom_fields(node);
        let region = fields.remove("region").unwrap_or_default();
        let sub_region = fields.remove("sub_region").unwrap_or_default();
        if !self.is_accepted(&region, &sub_region) {
            return Err(Rejection::RegionMismatch { region, sub_region });
        }

        // An earlier anchor may be a prefix label; the last one is the ad itself.
        let anchor = node
            .select(&TITLE)
            .next()
            .and_then(|title| title.select(&A).last())
            .ok_or(Rejection::MissingTitleOrLink)?;
        let title = text(anchor);
        let link = anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty())
            .and_then(|href| self.base_url.join(href).ok())
            .map(String::from)
            .unwrap_or_default();
        if title.is_empty() || link.is_empty() {
            return Err(Rejection::MissingTitleOrLink);
        }

        let description = node
            .select(&DESCRIPTION)
            .next()
            .map(text)
            .unwrap_or_default();

        let price = node.select(&PRICE).next().map(text).unwrap_or_default();

        let posted_at = self.timestamp(node.select(&CREATED).next(), "posted_at");
        let updated_at = self.timestamp(node.select(&UPDATED).next(), "updated_at");

        Ok(ClassifiedAd {
            title,
            link,
            price,
            description,
            region,
            sub_region,
            posted_at,
            updated_at,
        })
    }
}
