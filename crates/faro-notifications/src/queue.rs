//! Unbounded FIFO queue for local notifications.

use faro_core::Notification;
use std::time::Duration;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::debug;

#[derive(Error, Debug)]
pub enum QueueError {
    #[error("Notification queue is closed")]
    Closed,
}

/// Producer half of the notification queue.
///
/// `enqueue` never blocks and never drops; the channel is unbounded because
/// callers sit on request paths that must not stall on notification volume.
#[derive(Clone)]
pub struct NotificationQueue {
    sender: mpsc::UnboundedSender<Notification>,
}

/// Consumer half, held by the batch consumer task.
pub struct NotificationReceiver {
    receiver: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationQueue {
    pub fn create_channel() -> (NotificationQueue, NotificationReceiver) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (NotificationQueue { sender }, NotificationReceiver { receiver })
    }

    pub fn enqueue(&self, notification: Notification) -> Result<(), QueueError> {
        debug!(
            "Queueing {} notification for user {}",
            notification.kind, notification.user_id
        );
        self.sender.send(notification).map_err(|_| QueueError::Closed)
    }
}

impl NotificationReceiver {
    /// Wait up to `wait` for the next notification.
    ///
    /// `Ok(None)` signals a timeout; `Err(Closed)` means every producer is
    /// gone and nothing further will arrive.
    pub async fn dequeue(&mut self, wait: Duration) -> Result<Option<Notification>, QueueError> {
        match tokio::time::timeout(wait, self.receiver.recv()).await {
            Ok(Some(notification)) => Ok(Some(notification)),
            Ok(None) => Err(QueueError::Closed),
            Err(_) => Ok(None),
        }
    }
}
