//! Background service that removes abandoned artifacts.
//!
//! An image that is never fetched would otherwise stay on disk forever. This
//! service periodically deletes every artifact older than the configured TTL,
//! which bounds how long any output can outlive its upload.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::{interval, MissedTickBehavior};
use tracing::{error, info};

use chromashot_storage::ArtifactStore;

use crate::metrics;

/// Stale artifact sweeper.
pub struct ArtifactSweeper {
    store: Arc<ArtifactStore>,
    ttl: Option<Duration>,
    interval: Duration,
}

impl ArtifactSweeper {
    /// Create a sweeper. A `ttl` of `None` disables it.
    pub fn new(store: Arc<ArtifactStore>, ttl: Option<Duration>, interval: Duration) -> Self {
        Self {
            store,
            ttl,
            interval,
        }
    }

    /// Start the background sweep loop.
    ///
    /// This function runs indefinitely and should be spawned as a background task.
    pub async fn run(&self) {
        let Some(ttl) = self.ttl else {
            info!("Artifact sweeping is disabled");
            return;
        };

        info!(
            "Starting artifact sweeper (ttl: {:?}, interval: {:?})",
            ttl, self.interval
        );

        let mut ticker = interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            if let Err(e) = self.sweep_once(ttl).await {
                error!("Artifact sweep error: {:#}", e);
            }
        }
    }

    /// Run a single sweep.
    pub async fn sweep_once(&self, ttl: Duration) -> anyhow::Result<usize> {
        let removed = self.store.sweep_stale(ttl).await?;
        metrics::record_artifacts_swept(removed);
        Ok(removed)
    }
}
