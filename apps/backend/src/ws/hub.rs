use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, trace};
use uuid::Uuid;

use super::protocol::{Envelope, Topic};

/// A live registration on one topic. Dropping the receiver is enough for
/// the hub to prune it on the next publish; `BroadcastHub::unsubscribe`
/// removes it eagerly.
#[derive(Debug)]
pub struct Subscription {
    pub id: Uuid,
    pub topic: Topic,
    pub receiver: mpsc::UnboundedReceiver<Envelope>,
}

/// In-process fan-out over the three topics.
///
/// Delivery is best effort: no acknowledgement, no ordering across
/// subscribers, no deduplication.
#[derive(Debug, Default)]
pub struct BroadcastHub {
    topics: DashMap<Topic, DashMap<Uuid, mpsc::UnboundedSender<Envelope>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self, topic: Topic) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.topics.entry(topic).or_default().insert(id, tx);
        trace!(topic = topic.as_str(), subscription = %id, "subscribed");
        Subscription {
            id,
            topic,
            receiver: rx,
        }
    }

    pub fn unsubscribe(&self, topic: Topic, id: Uuid) {
        if let Some(subscribers) = self.topics.get(&topic) {
            subscribers.remove(&id);
        }
        trace!(topic = topic.as_str(), subscription = %id, "unsubscribed");
    }

    /// Deliver to every current subscriber of the envelope's topic.
    /// Returns how many subscribers received it.
    pub fn publish(&self, envelope: Envelope) -> usize {
        let topic = envelope.topic();
        let Some(subscribers) = self.topics.get(&topic) else {
            return 0;
        };

        let mut delivered = 0;
        let mut closed = Vec::new();
        for entry in subscribers.iter() {
            if entry.value().send(envelope.clone()).is_ok() {
                delivered += 1;
            } else {
                closed.push(*entry.key());
            }
        }
        for id in closed {
            subscribers.remove(&id);
        }

        debug!(
            topic = topic.as_str(),
            game_id = envelope.game_id(),
            delivered,
            "broadcast published"
        );
        delivered
    }

    pub fn subscriber_count(&self, topic: Topic) -> usize {
        self.topics.get(&topic).map(|s| s.len()).unwrap_or(0)
    }
}
