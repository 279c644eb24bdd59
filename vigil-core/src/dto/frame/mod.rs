//! Outbound wire frames
//!
//! Every message pushed to a dashboard session is one `OutboundFrame`,
//! serialized as `{"type": "<variant>", "value": <payload>}`.

use serde::{Deserialize, Serialize};

use crate::dto::job::PublishableJob;

/// A discriminated outbound message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum OutboundFrame {
    JobUpdate(PublishableJob),
    JobDeleted(String),
    IterationUpdate(String),
    StatusUpdate(String),
    Heartbeat(HeartbeatMessage),
}

impl OutboundFrame {
    /// Wire name of the frame, handy for logging
    pub fn kind(&self) -> &'static str {
        match self {
            OutboundFrame::JobUpdate(_) => "jobUpdate",
            OutboundFrame::JobDeleted(_) => "jobDeleted",
            OutboundFrame::IterationUpdate(_) => "iterationUpdate",
            OutboundFrame::StatusUpdate(_) => "statusUpdate",
            OutboundFrame::Heartbeat(_) => "heartbeat",
        }
    }
}

/// Answer to a client heartbeat probe, both times in epoch milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatMessage {
    pub server_time: i64,
    pub start_up_time: i64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_job_deleted_wire_format() {
        let frame = OutboundFrame::JobDeleted("vigil".to_string());
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(value, json!({"type": "jobDeleted", "value": "vigil"}));
    }

    #[test]
    fn test_heartbeat_wire_format() {
        let frame = OutboundFrame::Heartbeat(HeartbeatMessage {
            server_time: 23432,
            start_up_time: 34543,
        });
        let value = serde_json::to_value(&frame).unwrap();
        assert_eq!(
            value,
            json!({"type": "heartbeat", "value": {"serverTime": 23432, "startUpTime": 34543}})
        );
        assert_eq!(frame.kind(), "heartbeat");
    }

    #[test]
    fn test_label_frames_round_trip() {
        let frame = OutboundFrame::IterationUpdate("Sprint 42".to_string());
        let text = serde_json::to_string(&frame).unwrap();
        let parsed: OutboundFrame = serde_json::from_str(&text).unwrap();
        assert_eq!(parsed, frame);
    }
}
