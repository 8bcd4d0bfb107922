use tokio::time::Duration;
use tracing::debug;

/// Courtesy delay taken between two page fetches.
#[async_trait::async_trait]
pub trait Pacer {
    async fn pause(&self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FixedDelay(pub Duration);

impl FixedDelay {
    pub fn from_millis(ms: u64) -> Self {
        FixedDelay(Duration::from_millis(ms))
    }

    pub fn none() -> Self {
        FixedDelay(Duration::ZERO)
    }
}

#[async_trait::async_trait]
impl Pacer for FixedDelay {
    async fn pause(&self) {
        if self.0.is_zero() {
            return;
        }
        debug!("Waiting {:?} before next page", self.0);
        tokio::time::sleep(self.0).await;
    }
}
