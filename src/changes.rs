//! Change feed publishing.
//!
//! Every committed mutation is broadcast as a [`ChangeEvent`] so connected
//! views and background workers can react to it. On the wire an event is a
//! two-frame ZeroMQ message: the topic followed by the JSON body.

use std::sync::{Mutex, mpsc};
use std::thread;

use thiserror::Error;

use crate::domain::change::ChangeEvent;

#[derive(Debug, Error)]
pub enum ChangeFeedError {
    #[error("zmq error: {0}")]
    Zmq(#[from] zmq::Error),

    #[error("failed to encode change event: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("change feed is closed")]
    Closed,
}

pub trait ChangePublisher: Send + Sync {
    fn publish(&self, event: &ChangeEvent) -> Result<(), ChangeFeedError>;
}

/// Publishes and logs failures; a broken feed never fails the mutation.
pub fn broadcast(publisher: &dyn ChangePublisher, event: ChangeEvent) {
    if let Err(err) = publisher.publish(&event) {
        log::error!("Failed to publish {} change: {err}", event.topic());
    }
}

/// Splits a received multipart message back into an event.
pub fn decode_frames(frames: &[Vec<u8>]) -> Result<ChangeEvent, ChangeFeedError> {
    let payload = frames.last().ok_or(ChangeFeedError::Closed)?;
    Ok(serde_json::from_slice(payload)?)
}

/// PUB socket owned by a background thread.
pub struct ZmqChangePublisher {
    sender: mpsc::Sender<(String, Vec<u8>)>,
}

impl ZmqChangePublisher {
    /// Binds the PUB socket on `endpoint` and starts the sender thread.
    pub fn start(endpoint: &str) -> Result<Self, ChangeFeedError> {
        let context = zmq::Context::new();
        let socket = context.socket(zmq::PUB)?;
        socket.bind(endpoint)?;

        let (sender, receiver) = mpsc::channel::<(String, Vec<u8>)>();

        thread::spawn(move || {
            for (topic, payload) in receiver {
                if let Err(err) = socket.send_multipart([topic.into_bytes(), payload], 0) {
                    log::error!("Failed to send change event: {err}");
                }
            }
            log::info!("Change feed sender stopped");
        });

        Ok(Self { sender })
    }
}

impl ChangePublisher for ZmqChangePublisher {
    fn publish(&self, event: &ChangeEvent) -> Result<(), ChangeFeedError> {
        let payload = serde_json::to_vec(event)?;
        self.sender
            .send((event.topic(), payload))
            .map_err(|_| ChangeFeedError::Closed)
    }
}

#[derive(Debug, Default)]
pub struct NoopChangePublisher;

impl ChangePublisher for NoopChangePublisher {
    fn publish(&self, _event: &ChangeEvent) -> Result<(), ChangeFeedError> {
        Ok(())
    }
}

/// Keeps published events in memory.
#[derive(Debug, Default)]
pub struct MemoryChangePublisher {
    events: Mutex<Vec<ChangeEvent>>,
}

impl MemoryChangePublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<ChangeEvent> {
        self.events
            .lock()
            .map(|events| events.clone())
            .unwrap_or_default()
    }

    pub fn topics(&self) -> Vec<String> {
        self.events().iter().map(ChangeEvent::topic).collect()
    }
}

impl ChangePublisher for MemoryChangePublisher {
    fn publish(&self, event: &ChangeEvent) -> Result<(), ChangeFeedError> {
        self.events
            .lock()
            .map_err(|_| ChangeFeedError::Closed)?
            .push(event.clone());
        Ok(())
    }
}
