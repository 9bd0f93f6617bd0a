//! Realtime push hub
//!
//! One broadcast channel per connected user, fanned out to their SSE
//! subscribers. The hub is created at startup, owned by the application
//! state, and reached only through that handle.

use std::collections::HashMap;

use parking_lot::Mutex;
use serde::Serialize;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::models::Notification;

const CHANNEL_CAPACITY: usize = 64;

/// Event delivered to a user's push subscribers.
#[derive(Debug, Clone, Serialize)]
pub struct PushEvent {
    pub notification: Notification,
}

/// Per-user broadcast channels, created on first subscribe or publish.
#[derive(Default)]
pub struct NotificationHub {
    channels: Mutex<HashMap<Uuid, broadcast::Sender<PushEvent>>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Subscribe to a user's push channel.
    pub fn subscribe(&self, user_id: Uuid) -> broadcast::Receiver<PushEvent> {
        let mut channels = self.channels.lock();
        channels
            .entry(user_id)
            .or_insert_with(|| broadcast::channel(CHANNEL_CAPACITY).0)
            .subscribe()
    }

    /// Publish an event to a user's subscribers.
    ///
    /// Returns the number of receivers the event was delivered to; zero when
    /// the user has no open subscription. Channels whose receivers have all
    /// dropped are pruned on the way.
    pub fn publish(&self, user_id: Uuid, event: PushEvent) -> usize {
        let mut channels = self.channels.lock();
        match channels.get(&user_id) {
            Some(tx) => match tx.send(event) {
                Ok(n) => n,
                Err(_) => {
                    channels.remove(&user_id);
                    0
                }
            },
            None => 0,
        }
    }

    /// Number of users with an open channel.
    pub fn connected_users(&self) -> usize {
        self.channels.lock().len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn event(user_id: Uuid) -> PushEvent {
        PushEvent {
            notification: Notification {
                id: Uuid::new_v4(),
                user_id,
                cradle_id: Uuid::new_v4(),
                kind: "ANOMALY".to_string(),
                alert_key: "OVERALL".to_string(),
                title: "High Anomaly Detected".to_string(),
                message: "test".to_string(),
                is_read: false,
                created_at: Utc::now(),
            },
        }
    }

    #[tokio::test]
    async fn subscribe_then_publish_delivers() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        let mut rx = hub.subscribe(user);
        let delivered = hub.publish(user, event(user));
        assert_eq!(delivered, 1);

        let received = rx.recv().await.unwrap();
        assert_eq!(received.notification.user_id, user);
    }

    #[test]
    fn publish_without_subscribers_is_not_an_error() {
        let hub = NotificationHub::new();
        assert_eq!(hub.publish(Uuid::new_v4(), event(Uuid::new_v4())), 0);
    }

    #[test]
    fn dead_channel_is_pruned() {
        let hub = NotificationHub::new();
        let user = Uuid::new_v4();

        let rx = hub.subscribe(user);
        assert_eq!(hub.connected_users(), 1);
        drop(rx);

        hub.publish(user, event(user));
        assert_eq!(hub.connected_users(), 0);
    }

    #[test]
    fn publish_does_not_cross_users() {
        let hub = NotificationHub::new();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        let mut rx_b = hub.subscribe(b);
        assert_eq!(hub.publish(a, event(a)), 0);
        assert!(rx_b.try_recv().is_err());
    }
}
