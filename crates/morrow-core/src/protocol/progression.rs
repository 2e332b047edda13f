//! Protocol progression: the per-day action state machine.
//!
//! Action state within the active day is derived, never stored: the
//! catalog day gives the order, the append-only session log says which
//! actions are already terminal, and the first action without a session
//! is `current`. Exactly one action is `current` until the day is
//! exhausted.
//!
//! Day advancement is driven by exhausting a day's actions, never by
//! calendar-date rollover. "Day N" on a calendar is a presentation
//! label only.
//!
//! ## Entitlement gate
//!
//! Days beyond day 1 are visible but locked for unpaid users: the day
//! view renders read-only (everything `upcoming`) and every mutating
//! transition returns `EntitlementRequired` before touching anything.
//! Unlocking is an external purchase event; it changes which
//! transitions are accepted, not any stored state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::EngineError;
use crate::events::Event;
use crate::profile::Entitlement;
use crate::protocol::catalog::{ActionTemplate, ProtocolCatalog};
use crate::protocol::{ActionSession, ProtocolStatus, RecoveryProtocol};

/// Derived state of one action within the active day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionState {
    Upcoming,
    Current,
    Completed,
    Skipped,
}

/// One action with its derived state, for rendering.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActionView {
    pub template: ActionTemplate,
    pub state: ActionState,
}

/// The active day as the UI should render it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DayView {
    pub day: u32,
    pub total_days: u32,
    /// Locked days render a paywall affordance; all actions upcoming.
    pub locked: bool,
    pub actions: Vec<ActionView>,
}

/// Result of a completed or skipped transition.
#[derive(Debug, Clone)]
pub struct Transition {
    /// The session to append. Storage deduplicates on
    /// (protocol_id, day, action_id) for idempotent retries.
    pub session: ActionSession,
    pub day_advanced: bool,
    pub protocol_completed: bool,
    pub events: Vec<Event>,
}

/// Progression engine over a read-only catalog.
pub struct ProtocolProgression<'a> {
    catalog: &'a ProtocolCatalog,
}

impl<'a> ProtocolProgression<'a> {
    pub fn new(catalog: &'a ProtocolCatalog) -> Self {
        Self { catalog }
    }

    fn locked(protocol: &RecoveryProtocol, entitlement: Entitlement) -> bool {
        protocol.current_day > 1 && !entitlement.is_paid()
    }

    /// Session lookup for one action of the active day.
    fn session_for<'s>(
        protocol: &RecoveryProtocol,
        sessions: &'s [ActionSession],
        action_id: &str,
    ) -> Option<&'s ActionSession> {
        sessions.iter().find(|s| {
            s.protocol_id == protocol.id && s.day == protocol.current_day && s.action_id == action_id
        })
    }

    /// Render the active day.
    ///
    /// # Errors
    /// `Configuration` if the catalog has no content for the protocol's
    /// event type at its current day.
    pub fn day_view(
        &self,
        protocol: &RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
    ) -> Result<DayView, EngineError> {
        let templates = self
            .catalog
            .day(protocol.event_type, protocol.current_day)?;
        let locked = Self::locked(protocol, entitlement);

        let mut current_seen = false;
        let actions = templates
            .actions
            .iter()
            .map(|template| {
                let state = if locked {
                    ActionState::Upcoming
                } else if let Some(session) = Self::session_for(protocol, sessions, &template.id) {
                    if session.completed {
                        ActionState::Completed
                    } else {
                        ActionState::Skipped
                    }
                } else if !current_seen {
                    current_seen = true;
                    ActionState::Current
                } else {
                    ActionState::Upcoming
                };
                ActionView {
                    template: template.clone(),
                    state,
                }
            })
            .collect();

        Ok(DayView {
            day: protocol.current_day,
            total_days: protocol.total_days,
            locked,
            actions,
        })
    }

    /// Begin a timed session on the current action. No state change and
    /// no log entry; timing belongs to the UI layer.
    ///
    /// # Errors
    /// Same legality rules as [`complete`](Self::complete).
    pub fn start(
        &self,
        protocol: &RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
        action_id: &str,
    ) -> Result<(), EngineError> {
        self.check_current(protocol, sessions, entitlement, action_id)
            .map(|_| ())
    }

    /// Mark the current action completed and advance.
    pub fn complete(
        &self,
        protocol: &mut RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
        action_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transition(protocol, sessions, entitlement, action_id, true, now)
    }

    /// Mark the current action skipped and advance. Skipping is a
    /// first-class, non-penalized transition; it never blocks
    /// progression.
    pub fn skip(
        &self,
        protocol: &mut RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
        action_id: &str,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        self.transition(protocol, sessions, entitlement, action_id, false, now)
    }

    /// Validate that `action_id` is the current action of the active
    /// day. Returns how many of the day's actions are already terminal.
    fn check_current(
        &self,
        protocol: &RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
        action_id: &str,
    ) -> Result<usize, EngineError> {
        if !protocol.is_active() {
            return Err(EngineError::InvalidTransition(format!(
                "protocol {} is {}",
                protocol.id,
                protocol.status.name()
            )));
        }
        if Self::locked(protocol, entitlement) {
            return Err(EngineError::EntitlementRequired);
        }

        let templates = self
            .catalog
            .day(protocol.event_type, protocol.current_day)?;
        let current = templates
            .actions
            .iter()
            .find(|t| Self::session_for(protocol, sessions, &t.id).is_none());
        match current {
            Some(t) if t.id == action_id => {
                let terminal = templates
                    .actions
                    .iter()
                    .filter(|t| Self::session_for(protocol, sessions, &t.id).is_some())
                    .count();
                Ok(terminal)
            }
            Some(t) => Err(EngineError::InvalidTransition(format!(
                "action '{}' is not current (current is '{}')",
                action_id, t.id
            ))),
            None => Err(EngineError::InvalidTransition(format!(
                "day {} already exhausted",
                protocol.current_day
            ))),
        }
    }

    fn transition(
        &self,
        protocol: &mut RecoveryProtocol,
        sessions: &[ActionSession],
        entitlement: Entitlement,
        action_id: &str,
        completed: bool,
        now: DateTime<Utc>,
    ) -> Result<Transition, EngineError> {
        let terminal_before = self.check_current(protocol, sessions, entitlement, action_id)?;
        let day = protocol.current_day;
        let day_len = self.catalog.day(protocol.event_type, day)?.actions.len();

        let session = ActionSession {
            protocol_id: protocol.id,
            day,
            action_id: action_id.to_string(),
            completed,
            recorded_at: now,
        };

        let mut events = vec![if completed {
            Event::ActionCompleted {
                protocol_id: protocol.id,
                day,
                action_id: action_id.to_string(),
                at: now,
            }
        } else {
            Event::ActionSkipped {
                protocol_id: protocol.id,
                day,
                action_id: action_id.to_string(),
                at: now,
            }
        }];

        // Day exhausted once this session lands?
        let exhausted = terminal_before + 1 == day_len;
        let mut day_advanced = false;
        let mut protocol_completed = false;
        if exhausted {
            if protocol.current_day < protocol.total_days {
                protocol.current_day += 1;
                day_advanced = true;
                events.push(Event::DayAdvanced {
                    protocol_id: protocol.id,
                    from_day: day,
                    to_day: protocol.current_day,
                    at: now,
                });
            } else {
                protocol.status = ProtocolStatus::Completed;
                protocol_completed = true;
                events.push(Event::ProtocolCompleted {
                    protocol_id: protocol.id,
                    at: now,
                });
            }
        }

        Ok(Transition {
            session,
            day_advanced,
            protocol_completed,
            events,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::checkin::{EventIntensity, EventType};
    use proptest::prelude::*;
    use uuid::Uuid;

    fn protocol(event_type: EventType, total_days: u32) -> RecoveryProtocol {
        RecoveryProtocol {
            id: Uuid::new_v4(),
            user_id: Uuid::new_v4(),
            event_type,
            intensity: EventIntensity::Heavy,
            total_days,
            current_day: 1,
            status: ProtocolStatus::Active,
            origin_checkin_id: Uuid::new_v4(),
            created_at: Utc::now(),
        }
    }

    fn current_action_id(view: &DayView) -> Option<String> {
        view.actions
            .iter()
            .find(|a| a.state == ActionState::Current)
            .map(|a| a.template.id.clone())
    }

    #[test]
    fn first_action_is_current() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let p = protocol(EventType::HeavyNight, 3);
        let view = progression.day_view(&p, &[], Entitlement::Plus).unwrap();
        assert_eq!(view.actions[0].state, ActionState::Current);
        assert!(view.actions[1..]
            .iter()
            .all(|a| a.state == ActionState::Upcoming));
    }

    #[test]
    fn complete_advances_current() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions: Vec<ActionSession> = Vec::new();

        let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
        let first = current_action_id(&view).unwrap();
        let t = progression
            .complete(&mut p, &sessions, Entitlement::Plus, &first, Utc::now())
            .unwrap();
        assert!(!t.day_advanced);
        sessions.push(t.session);

        let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
        assert_eq!(view.actions[0].state, ActionState::Completed);
        assert_eq!(view.actions[1].state, ActionState::Current);
    }

    #[test]
    fn skip_is_not_penalized() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions: Vec<ActionSession> = Vec::new();

        let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
        let first = current_action_id(&view).unwrap();
        let t = progression
            .skip(&mut p, &sessions, Entitlement::Plus, &first, Utc::now())
            .unwrap();
        assert!(!t.session.completed);
        sessions.push(t.session);

        // Skipping advanced current exactly like completing would.
        let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
        assert_eq!(view.actions[0].state, ActionState::Skipped);
        assert_eq!(view.actions[1].state, ActionState::Current);
    }

    fn exhaust_day(
        progression: &ProtocolProgression,
        p: &mut RecoveryProtocol,
        sessions: &mut Vec<ActionSession>,
        entitlement: Entitlement,
    ) {
        loop {
            let view = progression.day_view(p, sessions, entitlement).unwrap();
            let Some(current) = current_action_id(&view) else {
                break;
            };
            let day_before = p.current_day;
            let t = progression
                .complete(p, sessions, entitlement, &current, Utc::now())
                .unwrap();
            sessions.push(t.session);
            if t.day_advanced || t.protocol_completed {
                assert_ne!(
                    (day_before, p.status),
                    (p.current_day, ProtocolStatus::Active)
                );
                break;
            }
        }
    }

    #[test]
    fn exhausting_day_one_advances_to_day_two() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions = Vec::new();
        exhaust_day(&progression, &mut p, &mut sessions, Entitlement::Plus);
        assert_eq!(p.current_day, 2);
        assert!(p.is_active());
    }

    #[test]
    fn locked_day_rejects_mutation_without_state_change() {
        // A rejected locked transition must leave nothing behind.
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions = Vec::new();
        exhaust_day(&progression, &mut p, &mut sessions, Entitlement::Plus);
        assert_eq!(p.current_day, 2);

        let day2_first = catalog.day(EventType::HeavyNight, 2).unwrap().actions[0]
            .id
            .clone();
        let before_sessions = sessions.len();
        let err = progression
            .complete(&mut p, &sessions, Entitlement::Free, &day2_first, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::EntitlementRequired));
        assert_eq!(p.current_day, 2);
        assert_eq!(sessions.len(), before_sessions);

        // The same action still becomes current once entitlement exists.
        let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
        assert_eq!(current_action_id(&view).unwrap(), day2_first);
    }

    #[test]
    fn locked_day_view_is_read_only() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions = Vec::new();
        exhaust_day(&progression, &mut p, &mut sessions, Entitlement::Plus);

        let view = progression.day_view(&p, &sessions, Entitlement::Free).unwrap();
        assert!(view.locked);
        assert!(view
            .actions
            .iter()
            .all(|a| a.state == ActionState::Upcoming));

        // start() is also refused on a locked day.
        let id = view.actions[0].template.id.clone();
        let err = progression
            .start(&p, &sessions, Entitlement::Free, &id)
            .unwrap_err();
        assert!(matches!(err, EngineError::EntitlementRequired));
    }

    #[test]
    fn day_one_is_never_locked() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let p = protocol(EventType::HeavyNight, 3);
        let view = progression.day_view(&p, &[], Entitlement::Free).unwrap();
        assert!(!view.locked);
        assert_eq!(view.actions[0].state, ActionState::Current);
    }

    #[test]
    fn completing_final_day_completes_protocol() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let mut sessions = Vec::new();
        for _ in 0..3 {
            exhaust_day(&progression, &mut p, &mut sessions, Entitlement::Plus);
        }
        assert_eq!(p.status, ProtocolStatus::Completed);
        assert_eq!(p.current_day, 3);
    }

    #[test]
    fn completing_non_current_action_is_invalid() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 3);
        let second = catalog.day(EventType::HeavyNight, 1).unwrap().actions[1]
            .id
            .clone();
        let err = progression
            .complete(&mut p, &[], Entitlement::Plus, &second, Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        assert_eq!(p.current_day, 1);
    }

    #[test]
    fn completed_protocol_rejects_transitions() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let mut p = protocol(EventType::HeavyNight, 1);
        let mut sessions = Vec::new();
        exhaust_day(&progression, &mut p, &mut sessions, Entitlement::Plus);
        assert_eq!(p.status, ProtocolStatus::Completed);

        let err = progression
            .complete(&mut p, &sessions, Entitlement::Plus, "hydrate-500", Utc::now())
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }

    #[test]
    fn start_on_current_action_is_legal_and_logs_nothing() {
        let catalog = ProtocolCatalog::builtin();
        let progression = ProtocolProgression::new(&catalog);
        let p = protocol(EventType::HeavyNight, 3);
        let first = catalog.day(EventType::HeavyNight, 1).unwrap().actions[0]
            .id
            .clone();
        progression
            .start(&p, &[], Entitlement::Plus, &first)
            .unwrap();
        // Still current afterwards; start changes nothing.
        let view = progression.day_view(&p, &[], Entitlement::Plus).unwrap();
        assert_eq!(current_action_id(&view).unwrap(), first);
    }

    proptest! {
        /// Driving a protocol with any mix of complete/skip, the
        /// unlocked day view always shows exactly one current action
        /// until the protocol completes.
        #[test]
        fn exactly_one_current_at_all_times(choices in prop::collection::vec(any::<bool>(), 32)) {
            let catalog = ProtocolCatalog::builtin();
            let progression = ProtocolProgression::new(&catalog);
            let mut p = protocol(EventType::HeavyNight, 3);
            let mut sessions: Vec<ActionSession> = Vec::new();

            for complete in choices {
                if !p.is_active() {
                    break;
                }
                let view = progression.day_view(&p, &sessions, Entitlement::Plus).unwrap();
                let currents = view
                    .actions
                    .iter()
                    .filter(|a| a.state == ActionState::Current)
                    .count();
                prop_assert_eq!(currents, 1);

                let id = current_action_id(&view).unwrap();
                let t = if complete {
                    progression.complete(&mut p, &sessions, Entitlement::Plus, &id, Utc::now()).unwrap()
                } else {
                    progression.skip(&mut p, &sessions, Entitlement::Plus, &id, Utc::now()).unwrap()
                };
                sessions.push(t.session);
            }
        }
    }
}
