//! Session broadcaster
//!
//! Keeps one bounded outbound queue per connected dashboard session. The
//! transport drains each queue onto its socket; the broadcaster only decides
//! what goes into the queues. A session that falls so far behind that its
//! queue fills up is dropped instead of buffering without limit.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};
use tracing::{debug, error, warn};
use uuid::Uuid;
use vigil_core::dto::frame::{HeartbeatMessage, OutboundFrame};

use crate::registry::JobRegistry;

pub type SessionId = Uuid;

/// Inbound text asking for a heartbeat answer
pub const HEARTBEAT_REQUEST: &str = "heartbeat";

/// Inbound text asking for a fresh snapshot
pub const SNAPSHOT_REQUEST: &str = "snapshot";

/// Room left in a session queue on top of the connect snapshot
pub const DEFAULT_QUEUE_HEADROOM: usize = 256;

/// Source of the server time reported in heartbeats
pub trait Clock: Send + Sync {
    /// Epoch milliseconds
    fn now_millis(&self) -> i64;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_millis(&self) -> i64 {
        chrono::Utc::now().timestamp_millis()
    }
}

type Sessions = HashMap<SessionId, Sender<String>>;

pub struct SessionBroadcaster {
    sessions: RwLock<Sessions>,
    registry: Arc<JobRegistry>,
    clock: Arc<dyn Clock>,
    start_up_time: i64,
    queue_headroom: usize,
}

impl SessionBroadcaster {
    pub fn new(registry: Arc<JobRegistry>, clock: Arc<dyn Clock>, start_up_time: i64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            registry,
            clock,
            start_up_time,
            queue_headroom: DEFAULT_QUEUE_HEADROOM,
        }
    }

    /// Sets how many frames a session may fall behind once its snapshot is queued
    pub fn with_queue_headroom(mut self, headroom: usize) -> Self {
        self.queue_headroom = headroom.max(1);
        self
    }

    /// Registers a new session
    ///
    /// The session's queue already holds one `jobUpdate` frame per tracked
    /// job, in display order, before any live frame can reach it. The queue
    /// is sized from that snapshot so it always fits.
    pub fn connect(&self) -> (SessionId, Receiver<String>) {
        let id = Uuid::new_v4();

        let mut sessions = self.write();
        let snapshot = self.registry.snapshot();
        let (sender, receiver) = mpsc::channel(snapshot.len() + self.queue_headroom);
        for job in snapshot {
            if let Some(text) = serialize(&OutboundFrame::JobUpdate(job)) {
                // Capacity covers the whole snapshot and nothing else is queued yet
                let _ = sender.try_send(text);
            }
        }
        sessions.insert(id, sender);
        debug!(session_id = %id, sessions = sessions.len(), "Session registered");

        (id, receiver)
    }

    pub fn disconnect(&self, id: SessionId) {
        if self.write().remove(&id).is_some() {
            debug!(session_id = %id, "Session unregistered");
        }
    }

    pub fn session_count(&self) -> usize {
        self.read().len()
    }

    /// Sends a frame to every session, returning how many accepted it
    ///
    /// Sessions whose socket already went away are skipped; they are removed
    /// when their connection handler disconnects. Sessions whose queue is
    /// full are removed here, which closes their queue and ends their
    /// connection once the writer has drained it.
    pub fn broadcast(&self, frame: &OutboundFrame) -> usize {
        let Some(text) = serialize(frame) else {
            return 0;
        };

        let mut delivered = 0;
        let mut lagging = Vec::new();
        for (id, sender) in self.read().iter() {
            match sender.try_send(text.clone()) {
                Ok(()) => delivered += 1,
                Err(TrySendError::Full(_)) => lagging.push(*id),
                Err(TrySendError::Closed(_)) => {}
            }
        }

        for id in lagging {
            warn!(session_id = %id, "Session queue full, dropping session");
            self.disconnect(id);
        }

        delivered
    }

    /// Reacts to a text frame received from a session
    pub fn handle_inbound(&self, id: SessionId, text: &str) {
        let Some(sender) = self.read().get(&id).cloned() else {
            debug!(session_id = %id, "Inbound message from unknown session");
            return;
        };

        let queued = match text {
            HEARTBEAT_REQUEST => {
                let frame = OutboundFrame::Heartbeat(HeartbeatMessage {
                    server_time: self.clock.now_millis(),
                    start_up_time: self.start_up_time,
                });
                match serialize(&frame) {
                    Some(text) => sender.try_send(text),
                    None => Ok(()),
                }
            }
            SNAPSHOT_REQUEST => self.send_snapshot(&sender),
            other => {
                debug!(session_id = %id, "Ignoring inbound message '{}'", other);
                Ok(())
            }
        };

        if let Err(TrySendError::Full(_)) = queued {
            warn!(session_id = %id, "Session queue full, dropping session");
            self.disconnect(id);
        }
    }

    fn send_snapshot(&self, sender: &Sender<String>) -> Result<(), TrySendError<String>> {
        for job in self.registry.snapshot() {
            if let Some(text) = serialize(&OutboundFrame::JobUpdate(job)) {
                sender.try_send(text)?;
            }
        }
        Ok(())
    }

    fn read(&self) -> RwLockReadGuard<'_, Sessions> {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Sessions> {
        self.sessions.write().unwrap_or_else(PoisonError::into_inner)
    }
}

fn serialize(frame: &OutboundFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(text) => Some(text),
        Err(e) => {
            error!("Failed to serialize {} frame: {}", frame.kind(), e);
            None
        }
    }
}
