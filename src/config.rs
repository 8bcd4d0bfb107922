use crate::{twilio::TwilioOptions, CrawlerError, RunSettings};
use std::{env, str::FromStr};
use url::Url;

pub const DEFAULT_BASE_URL: &str = "https://caguns.net";

/// Run configuration, read from the environment (and `.env` when present).
#[derive(Debug, Clone)]
pub struct Config {
    pub base_url: Url,
    pub filter: String,
    pub region: String,
    pub sub_region: String,
    pub max_pages: u32,
    pub page_delay_ms: u64,
    pub database: String,
    pub cookie: Option<String>,
    pub user_agent: Option<String>,
    pub notify_enabled: bool,
    pub twilio: Option<TwilioOptions>,
}

impl Config {
    pub fn from_env() -> Result<Self, CrawlerError> {
        Self::from_env_with(&[])
    }

    /// Like [`Config::from_env`], with `overrides` taking precedence over the environment.
    pub fn from_env_with(overrides: &[(&str, &str)]) -> Result<Self, CrawlerError> {
        let _ = dotenvy::dotenv();
        Self::from_lookup(|key| {
            overrides
                .iter()
                .find(|(k, _)| *k == key)
                .map(|(_, v)| v.to_string())
                .or_else(|| env::var(key).ok())
        })
    }

    /// Builds the configuration from any key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, CrawlerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());
        let or = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

        let base_url = Url::parse(&or("CRAWLER_BASE_URL", DEFAULT_BASE_URL))
            .map_err(|e| CrawlerError::Config(format!("CRAWLER_BASE_URL: {e}")))?;

        let max_pages: u32 = parse(&get, "CRAWLER_MAX_PAGES", 5)?;
        if max_pages == 0 {
            return Err(CrawlerError::Config(
                "CRAWLER_MAX_PAGES must be at least 1".to_string(),
            ));
        }

        let notify_enabled = parse_bool(&get, "NOTIFY_ENABLED", true)?;
        let twilio = if notify_enabled {
            let require = |key: &str| {
                get(key).ok_or_else(|| CrawlerError::Config(format!("{key} must be set")))
            };
            Some(TwilioOptions {
                account_sid: require("TWILIO_ACCOUNT_SID")?,
                auth_token: require("TWILIO_AUTH_TOKEN")?,
                messaging_service_sid: require("TWILIO_MESSAGING_SERVICE_SID")?,
                to: require("NOTIFICATION_PHONE_NUMBER")?,
            })
        } else {
            None
        };

        Ok(Config {
            base_url,
            filter: or("CRAWLER_FILTER", "norcal"),
            region: or("CRAWLER_REGION", "norcal"),
            sub_region: or("CRAWLER_SUB_REGION", "bay area"),
            max_pages,
            page_delay_ms: parse(&get, "CRAWLER_PAGE_DELAY_MS", 3000)?,
            database: or("CRAWLER_DATABASE", "classifieds.db"),
            cookie: get("CRAWLER_COOKIE"),
            user_agent: get("CRAWLER_USER_AGENT"),
            notify_enabled,
            twilio,
        })
    }

    pub fn run_settings(&self, dry_run: bool) -> RunSettings {
        RunSettings {
            max_pages: self.max_pages,
            dry_run,
        }
    }
}

fn parse<T, G>(get: &G, key: &str, default: T) -> Result<T, CrawlerError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
    G: Fn(&str) -> Option<String>,
{
    match get(key) {
        Some(v) => v
            .trim()
            .parse()
            .map_err(|e| CrawlerError::Config(format!("{key}: {e}"))),
        None => Ok(default),
    }
}

fn parse_bool<G>(get: &G, key: &str, default: bool) -> Result<bool, CrawlerError>
where
    G: Fn(&str) -> Option<String>,
{
    match get(key).map(|v| v.trim().to_lowercase()).as_deref() {
        None => Ok(default),
        Some("1" | "true" | "yes" | "on") => Ok(true),
        Some("0" | "false" | "no" | "off") => Ok(false),
        Some(other) => Err(CrawlerError::Config(format!(
            "{key}: expected a boolean, got {other:?}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn config(vars: &[(&str, &str)]) -> Result<Config, CrawlerError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_without_notifications() {
        let c = config(&[("NOTIFY_ENABLED", "false")]).unwrap();
        assert_eq!(c.base_url.as_str(), "https://caguns.net/");
        assert_eq!(c.filter, "norcal");
        assert_eq!(c.region, "norcal");
        assert_eq!(c.sub_region, "bay area");
        assert_eq!(c.max_pages, 5);
        assert_eq!(c.page_delay_ms, 3000);
        assert_eq!(c.database, "classifieds.db");
        assert!(!c.notify_enabled);
        assert!(c.twilio.is_none());
    }

    #[test]
    fn notifications_require_twilio_credentials() {
        let err = config(&[("TWILIO_ACCOUNT_SID", "AC1")]).unwrap_err();
        assert!(matches!(err, CrawlerError::Config(ref m) if m == "TWILIO_AUTH_TOKEN must be set"));

        let c = config(&[
            ("TWILIO_ACCOUNT_SID", "AC1"),
            ("TWILIO_AUTH_TOKEN", "tok"),
            ("TWILIO_MESSAGING_SERVICE_SID", "MG1"),
            ("NOTIFICATION_PHONE_NUMBER", "+15105550100"),
        ])
        .unwrap();
        let twilio = c.twilio.unwrap();
        assert_eq!(twilio.account_sid, "AC1");
        assert_eq!(twilio.to, "+15105550100");
    }

    #[test]
    fn overrides_and_validation() {
        let c = config(&[
            ("NOTIFY_ENABLED", "no"),
            ("CRAWLER_MAX_PAGES", "2"),
            ("CRAWLER_PAGE_DELAY_MS", "0"),
            ("CRAWLER_SUB_REGION", "Peninsula"),
        ])
        .unwrap();
        assert_eq!(c.max_pages, 2);
        assert_eq!(c.page_delay_ms, 0);
        assert_eq!(c.sub_region, "Peninsula");

        assert!(config(&[("NOTIFY_ENABLED", "off"), ("CRAWLER_MAX_PAGES", "0")]).is_err());
        assert!(config(&[("NOTIFY_ENABLED", "off"), ("CRAWLER_MAX_PAGES", "lots")]).is_err());
        assert!(config(&[("NOTIFY_ENABLED", "maybe")]).is_err());
        assert!(config(&[("NOTIFY_ENABLED", "0"), ("CRAWLER_BASE_URL", "not a url")]).is_err());
    }
}
