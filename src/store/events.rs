//! In-process broadcast of lead mutations.
//!
//! The lead list publishes every optimistic change (and its rollback) here so
//! that sibling views, such as the status counters, update without a refetch.

use std::sync::mpsc::{Receiver, Sender, channel};

use serde::Serialize;

use crate::domain::lead::Lead;
use crate::domain::types::{LeadId, StatusLabel, UserId};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ToastLevel {
    Success,
    Error,
}

#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LeadEvent {
    StatusChanged {
        lead_id: LeadId,
        old: StatusLabel,
        new: StatusLabel,
    },
    AgentChanged {
        lead_id: LeadId,
        old: Option<UserId>,
        new: Option<UserId>,
    },
    /// A new row entered the visible list.
    Added { lead: Lead },
    Removed { lead_id: LeadId, status: StatusLabel },
    /// A removed row came back after a failed delete.
    Restored { lead: Lead },
    Toast { message: String, level: ToastLevel },
}

/// Synchronous fan-out to every live subscriber.
pub struct EventBus<T> {
    subscribers: Vec<Sender<T>>,
}

impl<T> Default for EventBus<T> {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
        }
    }
}

impl<T: Clone> EventBus<T> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&mut self) -> Receiver<T> {
        let (sender, receiver) = channel();
        self.subscribers.push(sender);
        receiver
    }

    /// Delivers to all subscribers, dropping those whose receiver is gone.
    pub fn publish(&mut self, event: T) {
        self.subscribers
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.subscribers.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn publish_reaches_all_subscribers_and_prunes_dropped_ones() {
        let mut bus = EventBus::new();
        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.publish(1);
        assert_eq!(first.try_recv(), Ok(1));
        assert_eq!(second.try_recv(), Ok(1));

        drop(second);
        bus.publish(2);
        assert_eq!(first.try_recv(), Ok(2));
        assert_eq!(bus.subscriber_count(), 1);
    }
}
