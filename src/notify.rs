use serde::Serialize;
use tokio::sync::broadcast;

use crate::model::{IntervalId, ResourceId, ResourceStatus};

const CHANNEL_CAPACITY: usize = 256;

/// Operator-facing messages. Delivery is fire-and-forget.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Notice {
    /// A drop target failed the guard check; nothing was sent to the gateway.
    GuardRejected {
        interval_id: IntervalId,
        resource_id: ResourceId,
        status: ResourceStatus,
        message: String,
    },
    /// The gateway refused a change. `reason` is passed through verbatim.
    ConfirmationFailed {
        interval_id: IntervalId,
        reason: String,
    },
    /// A change was confirmed and applied locally.
    Applied {
        interval_id: IntervalId,
        summary: String,
    },
}

pub trait NotificationSink: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Broadcast hub for chart notices. Any number of toasts/log tails may subscribe.
pub struct NotifyHub {
    sender: broadcast::Sender<Notice>,
}

impl Default for NotifyHub {
    fn default() -> Self {
        Self::new()
    }
}

impl NotifyHub {
    pub fn new() -> Self {
        Self {
            sender: broadcast::channel(CHANNEL_CAPACITY).0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notice> {
        self.sender.subscribe()
    }

    pub fn send(&self, notice: Notice) {
        // No-op if nobody is listening.
        let _ = self.sender.send(notice);
    }
}

impl NotificationSink for NotifyHub {
    fn notify(&self, notice: Notice) {
        self.send(notice);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn subscribe_and_receive() {
        let hub = NotifyHub::new();
        let mut rx = hub.subscribe();

        let notice = Notice::ConfirmationFailed {
            interval_id: "A".into(),
            reason: "room already booked".into(),
        };
        hub.notify(notice.clone());

        let received = rx.recv().await.unwrap();
        assert_eq!(received, notice);
    }

    #[test]
    fn send_without_subscribers_is_noop() {
        let hub = NotifyHub::new();
        // no subscriber, must not panic
        hub.send(Notice::Applied {
            interval_id: "A".into(),
            summary: "moved".into(),
        });
    }
}
