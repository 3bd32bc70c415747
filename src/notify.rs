//! Change notices for the live-update channel.
//!
//! The resolver publishes nothing. Callers that mutate jobs, machines or
//! material orders announce the change through a [`ChangePublisher`] so
//! connected clients can re-query. Transport, framing on the wire,
//! reconnection and backoff are the publisher implementation's business;
//! this module only fixes the message shape `{"type": ..., "data": ...}`.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

use crate::models::{Machine, MachineStatus};

/// What kind of record changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    Job,
    Machine,
    MaterialOrder,
}

/// A single change notice.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChangeNotice {
    #[serde(rename = "type")]
    pub kind: ChangeKind,
    pub data: Value,
}

/// Publishing failures.
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("failed to encode change notice: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("change channel closed: {0}")]
    Closed(String),
}

/// Sink for change notices (websocket hub, message bus, test recorder).
#[async_trait]
pub trait ChangePublisher: Send + Sync {
    async fn publish(&self, notice: ChangeNotice) -> Result<(), PublishError>;
}

impl ChangeNotice {
    /// Creates a notice with an arbitrary payload.
    pub fn new(kind: ChangeKind, data: Value) -> Self {
        Self { kind, data }
    }

    /// A full machine record changed.
    pub fn machine(machine: &Machine) -> Result<Self, PublishError> {
        Ok(Self::new(ChangeKind::Machine, serde_json::to_value(machine)?))
    }

    /// Only a machine's status changed.
    pub fn machine_status(machine_id: &str, status: MachineStatus) -> Self {
        Self::new(
            ChangeKind::Machine,
            serde_json::json!({ "id": machine_id, "status": status }),
        )
    }

    /// Encodes the notice as one JSON message.
    pub fn to_json(&self) -> Result<String, PublishError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decodes one JSON message.
    pub fn from_json(text: &str) -> Result<Self, PublishError> {
        Ok(serde_json::from_str(text)?)
    }
}
