//! Keep-alive heartbeat

use mycel_host_api::Directory;
use mycel_util::HardwareId;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

/// Running heartbeat; the task is aborted when this is dropped
pub struct Heartbeat {
    task: JoinHandle<()>,
}

impl Heartbeat {
    /// Start sending keep-alives every `interval`, the first one after a
    /// full interval
    pub fn spawn(directory: Arc<dyn Directory>, hardware_id: HardwareId, interval: Duration) -> Self {
        let task = tokio::spawn(async move {
            let mut ticker = interval_at(Instant::now() + interval, interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

            loop {
                ticker.tick().await;
                match directory.keep_alive(&hardware_id).await {
                    Ok(()) => tracing::debug!(hardware_id = %hardware_id, "Keep-alive sent"),
                    Err(e) => tracing::warn!(hardware_id = %hardware_id, error = %e, "Keep-alive failed"),
                }
            }
        });

        tracing::debug!(interval_secs = interval.as_secs(), "Heartbeat started");
        Self { task }
    }
}

impl Drop for Heartbeat {
    fn drop(&mut self) {
        self.task.abort();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mycel_host_api::MockDirectory;

    const INTERVAL: Duration = Duration::from_secs(300);

    #[tokio::test(start_paused = true)]
    async fn test_first_beat_after_one_interval() {
        let directory = Arc::new(MockDirectory::new());
        let _heartbeat = Heartbeat::spawn(directory.clone(), HardwareId::new("aa"), INTERVAL);

        tokio::time::sleep(Duration::from_secs(299)).await;
        assert_eq!(directory.keep_alive_calls(), 0);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert_eq!(directory.keep_alive_calls(), 1);

        tokio::time::sleep(INTERVAL * 2).await;
        assert_eq!(directory.keep_alive_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_failures_do_not_stop_the_heartbeat() {
        let directory = Arc::new(MockDirectory::new());
        *directory.fail_keep_alive.lock().unwrap() = true;
        let _heartbeat = Heartbeat::spawn(directory.clone(), HardwareId::new("aa"), INTERVAL);

        tokio::time::sleep(INTERVAL * 3 + Duration::from_secs(1)).await;
        assert_eq!(directory.keep_alive_calls(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_drop_stops_the_heartbeat() {
        let directory = Arc::new(MockDirectory::new());
        let heartbeat = Heartbeat::spawn(directory.clone(), HardwareId::new("aa"), INTERVAL);

        tokio::time::sleep(INTERVAL + Duration::from_secs(1)).await;
        drop(heartbeat);
        tokio::time::sleep(INTERVAL * 4).await;

        assert_eq!(directory.keep_alive_calls(), 1);
    }
}
