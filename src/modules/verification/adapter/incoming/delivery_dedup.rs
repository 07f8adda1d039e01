use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

/// Remembers recently handled delivery ids so a redelivered event is acknowledged
/// without sending the email twice. A zero window disables it.
///
/// The cache is per process; instances behind a load balancer do not share it.
#[derive(Debug)]
pub struct DeliveryDeduplicator {
    window: Duration,
    seen: Mutex<HashMap<String, Instant>>,
}

impl DeliveryDeduplicator {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            seen: Mutex::new(HashMap::new()),
        }
    }

    pub fn disabled() -> Self {
        Self::new(Duration::ZERO)
    }

    pub fn is_enabled(&self) -> bool {
        !self.window.is_zero()
    }

    /// Returns `true` the first time `delivery_id` is seen within the window.
    pub async fn first_delivery(&self, delivery_id: &str) -> bool {
        if !self.is_enabled() {
            return true;
        }

        let now = Instant::now();
        let mut seen = self.seen.lock().await;
        seen.retain(|_, at| now.duration_since(*at) < self.window);

        if seen.contains_key(delivery_id) {
            return false;
        }
        seen.insert(delivery_id.to_string(), now);
        true
    }

    /// Drops `delivery_id` so the transport's next redelivery is processed again.
    pub async fn forget(&self, delivery_id: &str) {
        if self.is_enabled() {
            self.seen.lock().await.remove(delivery_id);
        }
    }
}
