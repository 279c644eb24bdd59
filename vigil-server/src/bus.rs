//! Message bus
//!
//! Producers (the scheduler and the HTTP handlers) push frames onto a bounded
//! queue; a single subscriber task hands them to the session broadcaster in
//! the order they were accepted.

use std::sync::Arc;

use thiserror::Error;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info};
use vigil_core::domain::tracked::TrackedJob;
use vigil_core::dto::frame::OutboundFrame;

use crate::broadcaster::SessionBroadcaster;

/// A frame the bus could not accept
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    #[error("message bus is full, {0} frame rejected")]
    Saturated(&'static str),

    #[error("message bus is closed, {0} frame rejected")]
    Closed(&'static str),
}

/// Creates a bus and the receiving end its subscriber drains
pub fn channel(capacity: usize) -> (MessageBus, Receiver<OutboundFrame>) {
    let (sender, receiver) = mpsc::channel(capacity);
    (MessageBus { sender }, receiver)
}

/// Producer handle of the bus
#[derive(Debug, Clone)]
pub struct MessageBus {
    sender: Sender<OutboundFrame>,
}

impl MessageBus {
    /// Publishes the current state of a job
    pub fn send_update(&self, job: &TrackedJob) -> Result<(), BusError> {
        self.offer(OutboundFrame::JobUpdate(job.publishable()))
    }

    pub fn job_removed(&self, name: &str) -> Result<(), BusError> {
        self.offer(OutboundFrame::JobDeleted(name.to_string()))
    }

    pub fn iteration_update(&self, label: &str) -> Result<(), BusError> {
        self.offer(OutboundFrame::IterationUpdate(label.to_string()))
    }

    pub fn status_update(&self, label: &str) -> Result<(), BusError> {
        self.offer(OutboundFrame::StatusUpdate(label.to_string()))
    }

    fn offer(&self, frame: OutboundFrame) -> Result<(), BusError> {
        let kind = frame.kind();
        match self.sender.try_send(frame) {
            Ok(()) => Ok(()),
            Err(TrySendError::Full(_)) => {
                error!("Message bus is saturated, rejected {} frame", kind);
                Err(BusError::Saturated(kind))
            }
            Err(TrySendError::Closed(_)) => {
                error!("Message bus is closed, rejected {} frame", kind);
                Err(BusError::Closed(kind))
            }
        }
    }
}

/// Consumer task forwarding frames to every session
pub struct BusSubscriber {
    receiver: Receiver<OutboundFrame>,
    broadcaster: Arc<SessionBroadcaster>,
}

impl BusSubscriber {
    pub fn new(receiver: Receiver<OutboundFrame>, broadcaster: Arc<SessionBroadcaster>) -> Self {
        Self {
            receiver,
            broadcaster,
        }
    }

    /// Runs until shutdown or until every producer is gone
    pub async fn run(mut self, shutdown: CancellationToken) {
        info!("Bus subscriber started");

        loop {
            tokio::select! {
                _ = shutdown.cancelled() => {
                    info!("Bus subscriber shutting down");
                    break;
                }
                frame = self.receiver.recv() => {
                    let Some(frame) = frame else {
                        info!("All bus producers dropped, subscriber stopping");
                        break;
                    };
                    let delivered = self.broadcaster.broadcast(&frame);
                    debug!("Delivered {} frame to {} session(s)", frame.kind(), delivered);
                }
            }
        }
    }
}
