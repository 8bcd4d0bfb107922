use crate::{CrawlerError, Notifier};
use itertools::Itertools;
use tracing::{error, info};

/// One header line, a blank line, then every per-ad block separated by blank lines.
pub fn batch_payload<S: AsRef<str>>(messages: &[S]) -> String {
    format!(
        "New classified ads ({}):\n\n{}",
        messages.len(),
        messages.iter().map(AsRef::<str>::as_ref).join("\n\n")
    )
}

/// Makes exactly one delivery attempt for the whole batch.
pub async fn send_batch<N, S>(notifier: &N, messages: &[S]) -> Result<String, CrawlerError>
where
    N: Notifier + ?Sized,
    S: AsRef<str>,
{
    let payload = batch_payload(messages);
    match notifier.deliver(&payload).await {
        Ok(id) => {
            info!(delivery_id = %id, ads = messages.len(), "Notification sent");
            Ok(id)
        }
        Err(e) => {
            error!(error = %e, ads = messages.len(), "Notification delivery failed");
            Err(e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::sync::Mutex;

    #[derive(Default)]
    struct Recorder {
        payloads: Mutex<Vec<String>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl Notifier for Recorder {
        async fn deliver(&self, payload: &str) -> Result<String, CrawlerError> {
            self.payloads.lock().unwrap().push(payload.to_string());
            if self.fail {
                Err(CrawlerError::Notification("down".to_string()))
            } else {
                Ok("SM123".to_string())
            }
        }
    }

    #[test]
    fn payload_keeps_order_and_separates_blocks() {
        let payload = batch_payload(&["A\nhttps://x/1", "B\nhttps://x/2", "C\nhttps://x/3"]);
        assert_eq!(
            payload,
            "New classified ads (3):\n\nA\nhttps://x/1\n\nB\nhttps://x/2\n\nC\nhttps://x/3"
        );
    }

    #[tokio::test]
    async fn delivers_once() {
        let notifier = Recorder::default();
        let id = send_batch(&notifier, &["A", "B"]).await.unwrap();

        assert_eq!(id, "SM123");
        assert_eq!(
            *notifier.payloads.lock().unwrap(),
            vec!["New classified ads (2):\n\nA\n\nB".to_string()]
        );
    }

    #[tokio::test]
    async fn failure_is_not_retried() {
        let notifier = Recorder {
            fail: true,
            ..Default::default()
        };
        assert!(send_batch(&notifier, &["A"]).await.is_err());
        assert_eq!(notifier.payloads.lock().unwrap().len(), 1);
    }
}
