//! Per-connection liveness: ping every interval, drop the connection when
//! no pong has arrived for one and a half intervals.

use crate::hub::{ConnectionId, Outbound, SuiteHub};
use std::sync::Arc;
use std::time::Duration;
use tokio::time::{MissedTickBehavior, interval, sleep_until};
use tracing::{debug, warn};

/// How long a connection may stay silent before it is dropped.
pub fn pong_timeout(heartbeat_interval: Duration) -> Duration {
    heartbeat_interval.mul_f64(1.5)
}

/// Runs until the connection is gone. Returns true if it timed out.
pub async fn run_heartbeat(hub: Arc<SuiteHub>, id: ConnectionId) -> bool {
    let period = hub.settings().heartbeat_interval;
    let timeout = pong_timeout(period);
    let mut ticker = interval(period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let Some(last_pong) = hub.last_pong(id).await else {
            return false;
        };
        let deadline = last_pong + timeout;

        tokio::select! {
            _ = ticker.tick() => {
                if !hub.push(id, Outbound::Ping).await {
                    return false;
                }
                debug!(connection = id, "Ping sent");
            }
            _ = sleep_until(deadline) => {
                // A pong may have landed while we slept.
                if hub.last_pong(id).await == Some(last_pong) {
                    warn!(connection = id, timeout_ms = timeout.as_millis() as u64, "Heartbeat timed out");
                    hub.disconnect(id).await;
                    return true;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hub::HubSettings;
    use crate::hub::tests::connect;

    fn hub(secs: u64) -> Arc<SuiteHub> {
        Arc::new(SuiteHub::new(HubSettings {
            heartbeat_interval: Duration::from_secs(secs),
            ..HubSettings::default()
        }))
    }

    #[test]
    fn timeout_is_one_and_a_half_intervals() {
        assert_eq!(pong_timeout(Duration::from_secs(30)), Duration::from_secs(45));
    }

    #[tokio::test(start_paused = true)]
    async fn silent_connection_is_dropped() {
        let hub = hub(10);
        let (id, mut rx) = connect(&hub).await;
        let task = tokio::spawn(run_heartbeat(hub.clone(), id));

        tokio::time::sleep(Duration::from_secs(14)).await;
        assert!(hub.is_connected(id).await);

        tokio::time::sleep(Duration::from_secs(2)).await;
        assert!(!hub.is_connected(id).await);
        assert!(task.await.unwrap());

        let mut frames = Vec::new();
        while let Ok(frame) = rx.try_recv() {
            frames.push(frame);
        }
        assert_eq!(frames.iter().filter(|f| **f == Outbound::Ping).count(), 2);
        assert_eq!(frames.last(), Some(&Outbound::Close));
    }

    #[tokio::test(start_paused = true)]
    async fn pongs_keep_connection_alive() {
        let hub = hub(10);
        let (id, _rx) = connect(&hub).await;
        tokio::spawn(run_heartbeat(hub.clone(), id));

        for _ in 0..6 {
            tokio::time::sleep(Duration::from_secs(10)).await;
            hub.record_pong(id).await;
        }
        assert!(hub.is_connected(id).await);
    }

    #[tokio::test(start_paused = true)]
    async fn stops_when_connection_leaves() {
        let hub = hub(10);
        let (id, _rx) = connect(&hub).await;
        let task = tokio::spawn(run_heartbeat(hub.clone(), id));
        hub.disconnect(id).await;

        tokio::time::sleep(Duration::from_secs(11)).await;
        assert!(task.is_finished());
        assert!(!task.await.unwrap());
    }
}
