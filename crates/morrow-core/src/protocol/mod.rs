//! Recovery protocols: multi-day plans assigned after a post-event
//! check-in, and the append-only log of action sessions within them.

pub mod assigner;
pub mod catalog;
pub mod progression;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::{EventIntensity, EventType};

/// Lifecycle status of a recovery protocol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProtocolStatus {
    Active,
    Completed,
    Abandoned,
}

impl ProtocolStatus {
    pub fn name(&self) -> &'static str {
        match self {
            ProtocolStatus::Active => "active",
            ProtocolStatus::Completed => "completed",
            ProtocolStatus::Abandoned => "abandoned",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "active" => Some(ProtocolStatus::Active),
            "completed" => Some(ProtocolStatus::Completed),
            "abandoned" => Some(ProtocolStatus::Abandoned),
            _ => None,
        }
    }
}

/// A stateful multi-day recovery plan.
///
/// At most one of these is `Active` per user at any time; the assigner
/// enforces that when creating a new one. Protocols are never deleted,
/// only closed out and kept as history.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecoveryProtocol {
    pub id: Uuid,
    pub user_id: Uuid,
    pub event_type: EventType,
    pub intensity: EventIntensity,
    /// Fixed at assignment time; the catalog is not the source of this.
    pub total_days: u32,
    /// 1-indexed, monotonically non-decreasing.
    pub current_day: u32,
    pub status: ProtocolStatus,
    /// The check-in that triggered this protocol (referenced, not owned).
    pub origin_checkin_id: Uuid,
    pub created_at: DateTime<Utc>,
}

impl RecoveryProtocol {
    pub fn is_active(&self) -> bool {
        self.status == ProtocolStatus::Active
    }

    /// Whether progression had reached the final day.
    pub fn on_final_day(&self) -> bool {
        self.current_day >= self.total_days
    }
}

/// One completed or skipped action instance within a protocol day.
/// Append-only; never mutated after creation. Retried writes are
/// deduplicated by the storage layer on (protocol_id, day, action_id).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionSession {
    pub protocol_id: Uuid,
    pub day: u32,
    pub action_id: String,
    pub completed: bool,
    pub recorded_at: DateTime<Utc>,
}
