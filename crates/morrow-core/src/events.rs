use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::{EventIntensity, EventType, Trigger};
use crate::protocol::catalog::ActionCategory;
use crate::protocol::ProtocolStatus;

/// Every state change in the engine produces an Event.
/// The UI layer polls for events and renders them; the engine never
/// pushes anything across the boundary itself.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum Event {
    CheckInRecorded {
        checkin_id: Uuid,
        trigger: Trigger,
        at: DateTime<Utc>,
    },
    /// Midday back-tight signal short-circuited the script and routed
    /// straight to an action category.
    PriorityRouted {
        checkin_id: Uuid,
        category: ActionCategory,
        at: DateTime<Utc>,
    },
    ProtocolAssigned {
        protocol_id: Uuid,
        event_type: EventType,
        intensity: EventIntensity,
        total_days: u32,
        at: DateTime<Utc>,
    },
    /// A previously active protocol was closed out to make room for a
    /// new one.
    ProtocolSuperseded {
        protocol_id: Uuid,
        final_status: ProtocolStatus,
        at: DateTime<Utc>,
    },
    ActionCompleted {
        protocol_id: Uuid,
        day: u32,
        action_id: String,
        at: DateTime<Utc>,
    },
    ActionSkipped {
        protocol_id: Uuid,
        day: u32,
        action_id: String,
        at: DateTime<Utc>,
    },
    /// The day's actions were exhausted and the protocol moved on.
    DayAdvanced {
        protocol_id: Uuid,
        from_day: u32,
        to_day: u32,
        at: DateTime<Utc>,
    },
    ProtocolCompleted {
        protocol_id: Uuid,
        at: DateTime<Utc>,
    },
    BriefGenerated {
        brief_id: Uuid,
        insight_tier: u32,
        at: DateTime<Utc>,
    },
    BriefRead {
        brief_id: Uuid,
        at: DateTime<Utc>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn event_serializes_with_type_tag() {
        let event = Event::ActionCompleted {
            protocol_id: Uuid::nil(),
            day: 1,
            action_id: "hydrate-500".to_string(),
            at: Utc::now(),
        };
        let json = serde_json::to_string(&event).unwrap();
        assert!(json.contains(r#""type":"ActionCompleted""#));
        assert!(json.contains(r#""action_id":"hydrate-500""#));
    }
}
