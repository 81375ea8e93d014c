// Zenoh command subscriber and telemetry publisher

use std::collections::VecDeque;

use tracing::{debug, info};
use zenoh::Session;
use zenoh::handlers::FifoChannelHandler;
use zenoh::pubsub::{Publisher, Subscriber};
use zenoh::sample::Sample;

use super::{CommandSource, Result, TransportError};
use crate::messages::{BankActuation, StatusSnapshot};

fn zenoh_err(e: impl std::fmt::Display) -> TransportError {
    TransportError::PubSub(e.to_string())
}

/// Command bytes received on a zenoh topic
///
/// A payload may carry several bytes; they are handed out one at a time.
pub struct PubSubSource {
    topic: &'static str,
    subscriber: Subscriber<FifoChannelHandler<Sample>>,
    pending: VecDeque<u8>,
}

impl PubSubSource {
    pub async fn declare(session: &Session, topic: &'static str) -> Result<Self> {
        let subscriber = session.declare_subscriber(topic).await.map_err(zenoh_err)?;
        info!("Subscribed to: {}", topic);
        Ok(Self {
            topic,
            subscriber,
            pending: VecDeque::new(),
        })
    }
}

impl CommandSource for PubSubSource {
    fn poll_byte(&mut self) -> Result<Option<u8>> {
        if self.pending.is_empty() {
            match self.subscriber.try_recv() {
                Ok(Some(sample)) => {
                    let payload = sample.payload().to_bytes();
                    debug!("Received {} command byte(s)", payload.len());
                    self.pending.extend(payload.iter().copied());
                }
                Ok(None) => return Ok(None),
                Err(_) => return Err(TransportError::Closed),
            }
        }
        Ok(self.pending.pop_front())
    }

    fn describe(&self) -> String {
        format!("zenoh {}", self.topic)
    }
}

/// Publishes status snapshots and bank actuation as JSON
pub struct TelemetryPublisher {
    status: Publisher<'static>,
    banks: Publisher<'static>,
}

impl TelemetryPublisher {
    pub async fn declare(
        session: &Session,
        status_topic: &'static str,
        banks_topic: &'static str,
    ) -> Result<Self> {
        let status = session.declare_publisher(status_topic).await.map_err(zenoh_err)?;
        let banks = session.declare_publisher(banks_topic).await.map_err(zenoh_err)?;
        info!("Publishing to: {}, {}", status_topic, banks_topic);
        Ok(Self { status, banks })
    }

    pub async fn publish_status(&self, snapshot: &StatusSnapshot) -> Result<()> {
        let json = serde_json::to_string(snapshot)?;
        self.status.put(json).await.map_err(zenoh_err)
    }

    pub async fn publish_banks(&self, actuation: &BankActuation) -> Result<()> {
        let json = serde_json::to_string(actuation)?;
        self.banks.put(json).await.map_err(zenoh_err)
    }
}
