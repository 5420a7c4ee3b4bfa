//! Long-lived batch consumer for the notification queue.

use crate::handlers::dispatch_local;
use crate::queue::{NotificationReceiver, QueueError};
use chrono::Utc;
use faro_core::{EngineConfig, Notification};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;
use tracing::{debug, error, info, warn};

/// Upper bound on notifications processed per batch.
pub const MAX_BATCH_SIZE: usize = 10;

/// How long one collection cycle waits for the next notification before
/// closing the batch early.
const COLLECT_TIMEOUT: Duration = Duration::from_secs(1);

/// Pause after a failed loop iteration before resuming.
const ERROR_COOLDOWN: Duration = Duration::from_secs(1);

/// Drains the notification queue in bounded batches.
///
/// Each batch is forwarded once, best-effort, to the configured sink (if
/// any) and then routed notification-by-notification to the local type
/// handlers. A failure anywhere in one iteration is logged and followed by
/// a cooldown; a single bad notification never terminates the loop.
pub struct BatchConsumer {
    client: reqwest::Client,
    config: Arc<EngineConfig>,
    receiver: Arc<RwLock<Option<NotificationReceiver>>>,
    running: Arc<RwLock<bool>>,
    task_handle: Arc<RwLock<Option<JoinHandle<()>>>>,
}

impl BatchConsumer {
    pub fn new(
        receiver: NotificationReceiver,
        client: reqwest::Client,
        config: Arc<EngineConfig>,
    ) -> Self {
        Self {
            client,
            config,
            receiver: Arc::new(RwLock::new(Some(receiver))),
            running: Arc::new(RwLock::new(false)),
            task_handle: Arc::new(RwLock::new(None)),
        }
    }

    /// Start the consumer task. A second call while running is a no-op.
    pub async fn start(&self) {
        let mut running = self.running.write().await;
        if *running {
            info!("Notification batch consumer already running");
            return;
        }
        let Some(mut receiver) = self.receiver.write().await.take() else {
            warn!("Notification batch consumer cannot start, queue receiver already consumed");
            return;
        };
        *running = true;
        drop(running);

        let client = self.client.clone();
        let config = self.config.clone();
        let running = self.running.clone();

        let handle = tokio::spawn(async move {
            info!("Notification batch consumer started");
            while *running.read().await {
                if let Err(e) = Self::run_iteration(&mut receiver, &client, &config).await {
                    error!("Notification batch iteration failed: {}", e);
                    tokio::time::sleep(ERROR_COOLDOWN).await;
                }
            }
            info!("Notification batch consumer stopped");
        });

        *self.task_handle.write().await = Some(handle);
    }

    /// Stop the consumer. The in-flight batch is allowed to finish; no new
    /// batches start after this returns.
    pub async fn stop(&self) {
        let mut running = self.running.write().await;
        *running = false;
        drop(running);

        if let Some(handle) = self.task_handle.write().await.take() {
            let _ = handle.await;
        }
    }

    pub async fn is_running(&self) -> bool {
        *self.running.read().await
    }

    async fn run_iteration(
        receiver: &mut NotificationReceiver,
        client: &reqwest::Client,
        config: &EngineConfig,
    ) -> anyhow::Result<()> {
        let batch = Self::collect_batch(receiver).await?;
        if batch.is_empty() {
            return Ok(());
        }
        debug!("Processing notification batch of {}", batch.len());

        if let Some(sink_url) = &config.sink_url {
            Self::forward_batch(client, sink_url, &batch).await;
        }

        for notification in &batch {
            if let Err(e) = dispatch_local(notification) {
                error!(
                    "Local handler failed for notification {}: {}",
                    notification.id, e
                );
            }
        }
        Ok(())
    }

    /// Accumulate up to [`MAX_BATCH_SIZE`] notifications, closing the batch
    /// early when the queue stays empty for [`COLLECT_TIMEOUT`].
    async fn collect_batch(
        receiver: &mut NotificationReceiver,
    ) -> Result<Vec<Notification>, QueueError> {
        let mut batch = Vec::new();
        while batch.len() < MAX_BATCH_SIZE {
            match receiver.dequeue(COLLECT_TIMEOUT).await {
                Ok(Some(notification)) => batch.push(notification),
                Ok(None) => break,
                Err(QueueError::Closed) => {
                    // Hand back whatever was collected before the producers
                    // went away; the next iteration reports the closure.
                    if batch.is_empty() {
                        return Err(QueueError::Closed);
                    }
                    break;
                }
            }
        }
        Ok(batch)
    }

    /// One best-effort POST of the whole batch to the aggregate sink.
    /// Failures are logged and never retried; local dispatch proceeds
    /// regardless.
    async fn forward_batch(client: &reqwest::Client, sink_url: &str, batch: &[Notification]) {
        let payload = json!({
            "notifications": batch,
            "batch_size": batch.len(),
            "timestamp": Utc::now(),
        });

        match client.post(sink_url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                info!("Forwarded {} notifications to sink", batch.len());
            }
            Ok(response) => {
                warn!("Notification sink returned status {}", response.status());
            }
            Err(e) => {
                warn!("Notification sink request failed: {}", e);
            }
        }
    }
}
