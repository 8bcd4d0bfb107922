use crate::{CrawlerError, Notifier};
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use tracing::debug;

pub const TWILIO_API_BASE: &str = "https://api.twilio.com";

#[derive(Debug, Clone)]
pub struct TwilioOptions {
    pub account_sid: String,
    pub auth_token: String,
    pub messaging_service_sid: String,
    /// Recipient phone number in E.164 form.
    pub to: String,
}

#[derive(Debug, Deserialize)]
pub struct MessageResponse {
    pub sid: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ErrorResponse {
    code: Option<i64>,
    message: String,
}

/// SMS delivery through the Programmable Messaging API.
#[derive(Debug, Clone)]
pub struct TwilioService {
    options: TwilioOptions,
    api_base: String,
    client: Client,
}

impl TwilioService {
    pub fn new(options: TwilioOptions) -> Self {
        Self::with_api_base(options, TWILIO_API_BASE)
    }

    pub fn with_api_base(options: TwilioOptions, api_base: &str) -> Self {
        Self {
            options,
            api_base: api_base.trim_end_matches('/').to_string(),
            client: Client::new(),
        }
    }

    pub async fn send_sms(&self, body: &str) -> Result<MessageResponse, CrawlerError> {
        let url = format!(
            "{}/2010-04-01/Accounts/{}/Messages.json",
            self.api_base, self.options.account_sid
        );

        let mut form_body: HashMap<&str, &str> = HashMap::new();
        form_body.insert("MessagingServiceSid", &self.options.messaging_service_sid);
        form_body.insert("To", &self.options.to);
        form_body.insert("Body", body);

        let response = self
            .client
            .post(url)
            .basic_auth(&self.options.account_sid, Some(&self.options.auth_token))
            .form(&form_body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            let reason = match serde_json::from_str::<ErrorResponse>(&error_body) {
                Ok(ErrorResponse {
                    code: Some(code),
                    message,
                }) => format!("{message} (code {code})"),
                Ok(ErrorResponse { message, .. }) => message,
                Err(_) => error_body,
            };
            return Err(CrawlerError::Notification(format!(
                "Twilio returned {}: {}",
                status.as_u16(),
                reason
            )));
        }

        let message = response.json::<MessageResponse>().await.map_err(|e| {
            CrawlerError::Notification(format!("Failed to parse Twilio response: {e}"))
        })?;
        debug!(sid = %message.sid, status = ?message.status, "Twilio accepted message");
        Ok(message)
    }
}

#[async_trait::async_trait]
impl Notifier for TwilioService {
    async fn deliver(&self, payload: &str) -> Result<String, CrawlerError> {
        Ok(self.send_sms(payload).await?.sid)
    }
}
