use std::{collections::HashMap, sync::Arc, time::Duration};

use tokio::sync::Mutex;
use tokio::time::{sleep, Instant};

use crate::{domain::ChannelName, messaging::port::ChatSink, Result};

#[derive(Clone, Copy, Debug)]
pub struct ThrottleConfig {
    /// Minimum spacing between any two sends.
    pub global_min_interval: Duration,
    /// Minimum spacing between sends to one channel.
    pub per_channel_min_interval: Duration,
}

impl Default for ThrottleConfig {
    fn default() -> Self {
        // Roughly the rate a non-moderator chat account may post at.
        Self {
            global_min_interval: Duration::from_millis(50),
            per_channel_min_interval: Duration::from_millis(1500),
        }
    }
}

#[derive(Debug)]
struct IntervalLimiter {
    interval: Duration,
    next: Instant,
}

impl IntervalLimiter {
    fn new(interval: Duration) -> Self {
        Self {
            interval,
            next: Instant::now(),
        }
    }

    /// Reserve the next slot and return the wait required before using it.
    fn reserve(&mut self) -> Duration {
        let now = Instant::now();
        let start = if now >= self.next { now } else { self.next };
        self.next = start + self.interval;
        start.saturating_duration_since(now)
    }
}

/// ChatSink decorator that rate-limits outbound lines, globally and per channel.
pub struct ThrottledSink {
    inner: Arc<dyn ChatSink>,
    cfg: ThrottleConfig,
    global: Mutex<IntervalLimiter>,
    per_channel: Mutex<HashMap<ChannelName, Arc<Mutex<IntervalLimiter>>>>,
}

impl ThrottledSink {
    pub fn new(inner: Arc<dyn ChatSink>, cfg: ThrottleConfig) -> Self {
        Self {
            inner,
            cfg,
            global: Mutex::new(IntervalLimiter::new(cfg.global_min_interval)),
            per_channel: Mutex::new(HashMap::new()),
        }
    }

    async fn limiter_for(&self, channel: &ChannelName) -> Arc<Mutex<IntervalLimiter>> {
        let mut map = self.per_channel.lock().await;
        map.entry(channel.clone())
            .or_insert_with(|| {
                Arc::new(Mutex::new(IntervalLimiter::new(
                    self.cfg.per_channel_min_interval,
                )))
            })
            .clone()
    }

    async fn throttle(&self, channel: &ChannelName) {
        let global_wait = { self.global.lock().await.reserve() };
        let channel_wait = {
            let lim = self.limiter_for(channel).await;
            let mut guard = lim.lock().await;
            guard.reserve()
        };

        let wait = global_wait.max(channel_wait);
        if !wait.is_zero() {
            sleep(wait).await;
        }
    }
}

#[async_trait::async_trait]
impl ChatSink for ThrottledSink {
    async fn send(&self, channel: &ChannelName, text: &str) -> Result<()> {
        self.throttle(channel).await;
        self.inner.send(channel, text).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recording {
        sent: std::sync::Mutex<Vec<(String, String, Instant)>>,
    }

    #[async_trait::async_trait]
    impl ChatSink for Recording {
        async fn send(&self, channel: &ChannelName, text: &str) -> Result<()> {
            self.sent.lock().unwrap().push((
                channel.to_string(),
                text.to_string(),
                Instant::now(),
            ));
            Ok(())
        }
    }

    #[test]
    fn limiter_spaces_reservations() {
        let mut lim = IntervalLimiter::new(Duration::from_secs(10));
        assert!(lim.reserve().is_zero());
        let wait = lim.reserve();
        assert!(wait > Duration::from_secs(9));
    }

    #[tokio::test]
    async fn same_channel_sends_are_spaced() {
        let inner = Arc::new(Recording::default());
        let sink = ThrottledSink::new(
            inner.clone(),
            ThrottleConfig {
                global_min_interval: Duration::from_millis(0),
                per_channel_min_interval: Duration::from_millis(60),
            },
        );
        let chan = ChannelName::new("#Chan");
        sink.send(&chan, "one").await.unwrap();
        sink.send(&chan, "two").await.unwrap();
        sink.send(&ChannelName::new("other"), "three").await.unwrap();

        let sent = inner.sent.lock().unwrap();
        let texts: Vec<&str> = sent.iter().map(|(_, t, _)| t.as_str()).collect();
        assert_eq!(texts, vec!["one", "two", "three"]);
        assert_eq!(sent[0].0, "chan");
        assert!(sent[1].2.duration_since(sent[0].2) >= Duration::from_millis(50));
    }
}
