mod crawler;
mod data;

pub use crawler::CagunsCrawler;
pub use data::{AdTable, CagunsData};

use crate::Listing;

use chrono::{DateTime, FixedOffset};
use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedAd {
    pub title: String,
    pub link: String,
    pub price: String,
    pub description: String,
    pub region: String,
    pub sub_region: String,
    pub posted_at: Option<DateTime<FixedOffset>>,
    pub updated_at: Option<DateTime<FixedOffset>>,
}

/// The block this ad contributes to the run notification.
impl fmt::Display for ClassifiedAd {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.title)?;
        if !self.price.is_empty() {
            writeln!(f, "Price: {}", self.price)?;
        }
        if let Some(d) = self.posted_at.as_ref() {
            writeln!(f, "Posted: {}", d.format("%Y-%m-%d %H:%M"))?;
        }
        write!(f, "{}", self.link)
    }
}

impl Listing for ClassifiedAd {
    fn link(&self) -> &str {
        self.link.as_str()
    }

    fn title(&self) -> &str {
        self.title.as_str()
    }
}

#[cfg(test)]
mod tests {
    use crate::caguns::CagunsCrawler;
    use crate::{Crawler, Rejection};

    use super::*;
    use pretty_assertions::assert_eq;
    use scraper::html::Html;
    use std::fs;
    use url::Url;

    fn crawler() -> CagunsCrawler {
        CagunsCrawler::new(
            Url::parse("https://caguns.net").unwrap(),
            "norcal",
            "bay area",
        )
    }

    fn extract_all(file: &str) -> Vec<Result<ClassifiedAd, Rejection>> {
        let html = fs::read_to_string(file).expect("Invalid file url");
        let html = Html::parse_document(&html);
        let c = crawler();
        c.ad_nodes(&html)
            .expect("Missing container")
            .into_iter()
            .map(|node| c.extract(node))
            .collect()
    }

    #[test]
    fn test_parsing_listing_page() {
        let extracted = extract_all("tests/htmls/listing.html");

        let glock = ClassifiedAd {
            title: "Glock 19 Gen 5 w/ 3 mags".to_string(),
            link: "https://caguns.net/classifieds/glock-19-gen-5-w-3-mags.48213/".to_string(),
            price: "$500".to_string(),
            description: "Lightly used, about 300 rounds through it. Comes with original case and 3 magazines. FTF in San Jose only.".to_string(),
            region: "NorCal".to_string(),
            sub_region: "Bay Area".to_string(),
            posted_at: Some(
                DateTime::parse_from_rfc3339("2024-03-02T17:45:10-08:00")
                    .expect("Invalid date format"),
            ),
            updated_at: Some(
                DateTime::parse_from_rfc3339("2024-03-03T09:12:00-08:00")
                    .expect("Invalid date format"),
            ),
        };

        let scope = ClassifiedAd {
            title: "Vortex Razor HD Gen II 1-6x24".to_string(),
            link: "https://caguns.net/classifieds/vortex-razor-hd-gen-ii-1-6x24.48190/"
                .to_string(),
            price: String::new(),
            description: String::new(),
            region: "norcal".to_string(),
            sub_region: "bay area".to_string(),
            posted_at: Some(
                DateTime::parse_from_rfc3339("2024-03-01T08:00:00+00:00")
                    .expect("Invalid date format"),
            ),
            updated_at: None,
        };

        assert_eq!(
            extracted,
            vec![
                Ok(glock),
                Err(Rejection::RegionMismatch {
                    region: "SoCal".to_string(),
                    sub_region: "LA".to_string(),
                }),
                Ok(scope),
                Err(Rejection::RegionMismatch {
                    region: "NorCal".to_string(),
                    sub_region: "Sacramento".to_string(),
                }),
                Err(Rejection::MissingTitleOrLink),
            ]
        );
    }

    #[test]
    fn page_without_container_has_no_nodes() {
        let html = Html::parse_document(
            r#"<html><body><div class="structItem structItem--ad">stray</div></body></html>"#,
        );
        assert!(crawler().ad_nodes(&html).is_none());
    }

    #[test]
    fn empty_container_has_no_nodes() {
        let html = Html::parse_document(
            r#"<div class="structItemContainer structItemContainerCasListView"></div>"#,
        );
        assert_eq!(crawler().ad_nodes(&html).map(|n| n.len()), Some(0));
    }

    #[test]
    fn notification_block() {
        let ad = ClassifiedAd {
            title: "Glock 19".to_string(),
            link: "https://caguns.net/ad/1".to_string(),
            price: "$500".to_string(),
            description: "ignored".to_string(),
            region: "NorCal".to_string(),
            sub_region: "Bay Area".to_string(),
            posted_at: Some(
                DateTime::parse_from_rfc3339("2024-03-02T17:45:10-08:00")
                    .expect("Invalid date format"),
            ),
            updated_at: None,
        };
        assert_eq!(
            ad.to_string(),
            "Glock 19\nPrice: $500\nPosted: 2024-03-02 17:45\nhttps://caguns.net/ad/1"
        );

        let bare = ClassifiedAd {
            price: String::new(),
            posted_at: None,
            ..ad
        };
        assert_eq!(bare.to_string(), "Glock 19\nhttps://caguns.net/ad/1");
    }
}
