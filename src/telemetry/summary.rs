//! Periodic endpoint summary flushing.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::telemetry::recorder::TelemetryRecorder;

pub struct SummaryFlusher {
    recorder: Arc<TelemetryRecorder>,
    interval: Duration,
}

impl SummaryFlusher {
    pub fn new(recorder: Arc<TelemetryRecorder>, interval: Duration) -> Self {
        Self { recorder, interval }
    }

    /// Flush every interval until shutdown, then flush once more so counts
    /// since the last tick are not lost.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(interval_secs = self.interval.as_secs(), "Summary flusher starting");

        let mut ticker = time::interval_at(time::Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.recorder.flush_summaries().await;
                }
                _ = shutdown.recv() => {
                    tracing::info!("Summary flusher received shutdown signal, final flush");
                    self.recorder.flush_summaries().await;
                    break;
                }
            }
        }
    }
}
