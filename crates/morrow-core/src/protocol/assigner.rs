//! Protocol assigner: decides whether a post-event check-in earns a
//! recovery protocol, and enforces the single-active invariant.
//!
//! The assigner is pure: it takes the fresh check-in and whatever
//! protocol is currently active, and returns what the caller should
//! persist within one logical transaction.

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::checkin::{CheckIn, EventIntensity, EventType, Trigger};
use crate::events::Event;
use crate::protocol::{ProtocolStatus, RecoveryProtocol};

/// Result of running the assigner over a check-in.
#[derive(Debug, Clone)]
pub enum AssignOutcome {
    /// A new protocol was instantiated; persist it (and the superseded
    /// one, if any) together.
    Assigned(Assignment),
    /// No protocol warranted: the check-in was light, or not a
    /// post-event check-in at all.
    NotNeeded,
}

/// A new protocol plus the prior active one it displaced.
#[derive(Debug, Clone)]
pub struct Assignment {
    pub protocol: RecoveryProtocol,
    /// Prior active protocol with its final status already applied.
    pub superseded: Option<RecoveryProtocol>,
    pub events: Vec<Event>,
}

/// Run the assignment decision for a freshly created check-in.
///
/// Medium intensity yields a 2-day protocol, heavy a 3-day one; this is
/// the only place total_days comes from. The classifier always collects
/// an event type for medium/heavy events; a record missing one falls
/// back to `HeavyNight`.
pub fn assign(
    checkin: &CheckIn,
    active: Option<RecoveryProtocol>,
    now: DateTime<Utc>,
) -> AssignOutcome {
    if checkin.trigger() != Trigger::PostEvent {
        return AssignOutcome::NotNeeded;
    }
    let intensity = match checkin.intensity() {
        Some(i) if i.warrants_protocol() => i,
        _ => return AssignOutcome::NotNeeded,
    };

    let event_type = checkin.event_type().unwrap_or(EventType::HeavyNight);
    let total_days = match intensity {
        EventIntensity::Heavy => 3,
        _ => 2,
    };

    let protocol = RecoveryProtocol {
        id: Uuid::new_v4(),
        user_id: checkin.user_id,
        event_type,
        intensity,
        total_days,
        current_day: 1,
        status: ProtocolStatus::Active,
        origin_checkin_id: checkin.id,
        created_at: now,
    };

    let mut events = Vec::new();
    let superseded = active.filter(|p| p.is_active()).map(|mut prior| {
        // Close out the displaced protocol: completed if it had reached
        // its final day, abandoned otherwise.
        prior.status = if prior.on_final_day() {
            ProtocolStatus::Completed
        } else {
            ProtocolStatus::Abandoned
        };
        events.push(Event::ProtocolSuperseded {
            protocol_id: prior.id,
            final_status: prior.status,
            at: now,
        });
        prior
    });

    events.push(Event::ProtocolAssigned {
        protocol_id: protocol.id,
        event_type,
        intensity,
        total_days,
        at: now,
    });

    AssignOutcome::Assigned(Assignment {
        protocol,
        superseded,
        events,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::CheckInPayload;

    fn post_event(intensity: EventIntensity, event_type: Option<EventType>) -> CheckIn {
        CheckIn {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            payload: CheckInPayload::PostEvent {
                intensity,
                event_type,
            },
        }
    }

    #[test]
    fn heavy_event_gets_three_day_protocol() {
        let checkin = post_event(EventIntensity::Heavy, Some(EventType::HeavyNight));
        match assign(&checkin, None, Utc::now()) {
            AssignOutcome::Assigned(assignment) => {
                let p = assignment.protocol;
                assert_eq!(p.total_days, 3);
                assert_eq!(p.current_day, 1);
                assert_eq!(p.status, ProtocolStatus::Active);
                assert_eq!(p.event_type, EventType::HeavyNight);
                assert_eq!(p.origin_checkin_id, checkin.id);
                assert!(assignment.superseded.is_none());
            }
            AssignOutcome::NotNeeded => panic!("expected assignment"),
        }
    }

    #[test]
    fn medium_event_gets_two_day_protocol() {
        let checkin = post_event(EventIntensity::Medium, Some(EventType::RichMeal));
        match assign(&checkin, None, Utc::now()) {
            AssignOutcome::Assigned(assignment) => {
                assert_eq!(assignment.protocol.total_days, 2);
            }
            AssignOutcome::NotNeeded => panic!("expected assignment"),
        }
    }

    #[test]
    fn light_event_creates_nothing() {
        let checkin = post_event(EventIntensity::Light, None);
        assert!(matches!(
            assign(&checkin, None, Utc::now()),
            AssignOutcome::NotNeeded
        ));
    }

    #[test]
    fn non_post_event_checkin_creates_nothing() {
        let checkin = CheckIn {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            recorded_at: Utc::now(),
            payload: CheckInPayload::Midday {
                feeling: crate::checkin::MiddayFeeling::Sluggish,
            },
        };
        assert!(matches!(
            assign(&checkin, None, Utc::now()),
            AssignOutcome::NotNeeded
        ));
    }

    #[test]
    fn missing_event_type_falls_back_to_heavy_night() {
        let checkin = post_event(EventIntensity::Heavy, None);
        match assign(&checkin, None, Utc::now()) {
            AssignOutcome::Assigned(assignment) => {
                assert_eq!(assignment.protocol.event_type, EventType::HeavyNight);
            }
            AssignOutcome::NotNeeded => panic!("expected assignment"),
        }
    }

    #[test]
    fn prior_active_protocol_is_superseded() {
        // Exactly one active protocol remains; the displaced one ends
        // as completed or abandoned.
        let checkin = post_event(EventIntensity::Heavy, Some(EventType::Celebration));
        let prior = RecoveryProtocol {
            id: Uuid::new_v4(),
            user_id: checkin.user_id,
            event_type: EventType::RichMeal,
            intensity: EventIntensity::Medium,
            total_days: 2,
            current_day: 1,
            status: ProtocolStatus::Active,
            origin_checkin_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        match assign(&checkin, Some(prior.clone()), Utc::now()) {
            AssignOutcome::Assigned(assignment) => {
                let superseded = assignment.superseded.unwrap();
                assert_eq!(superseded.id, prior.id);
                assert_eq!(superseded.status, ProtocolStatus::Abandoned);
                assert!(assignment.protocol.is_active());
            }
            AssignOutcome::NotNeeded => panic!("expected assignment"),
        }
    }

    #[test]
    fn prior_protocol_on_final_day_is_marked_completed() {
        let checkin = post_event(EventIntensity::Medium, Some(EventType::Travel));
        let prior = RecoveryProtocol {
            id: Uuid::new_v4(),
            user_id: checkin.user_id,
            event_type: EventType::HeavyNight,
            intensity: EventIntensity::Heavy,
            total_days: 3,
            current_day: 3,
            status: ProtocolStatus::Active,
            origin_checkin_id: Uuid::new_v4(),
            created_at: Utc::now(),
        };
        match assign(&checkin, Some(prior), Utc::now()) {
            AssignOutcome::Assigned(assignment) => {
                assert_eq!(
                    assignment.superseded.unwrap().status,
                    ProtocolStatus::Completed
                );
            }
            AssignOutcome::NotNeeded => panic!("expected assignment"),
        }
    }
}
