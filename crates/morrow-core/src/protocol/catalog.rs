//! Protocol catalog: hand-authored recovery content.
//!
//! A pure lookup table keyed by event type, yielding ordered protocol
//! days, each an ordered list of action templates. Consumers treat it
//! as read-only and must tolerate uneven action counts between event
//! types. Lookups for a day that does not exist fail explicitly --
//! silently defaulting would misrepresent the user's recovery plan.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::checkin::EventType;
use crate::error::EngineError;

/// Coarse grouping of actions, used for priority routing and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionCategory {
    Hydration,
    Mobility,
    SpinalDecompression,
    Breathing,
    Nutrition,
    Walk,
    WindDown,
}

/// Template for one action within a protocol day. Immutable content;
/// display text and rationale live behind keys resolved by the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionTemplate {
    pub id: String,
    pub category: ActionCategory,
    pub title_key: String,
    /// Suggested duration in minutes. The UI runs the timer; the engine
    /// only records completion.
    pub duration_min: u32,
    pub rationale_key: String,
}

/// One day's slice of a protocol template, 1-indexed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProtocolDay {
    pub day: u32,
    pub actions: Vec<ActionTemplate>,
}

/// The full catalog: event type -> ordered protocol days.
#[derive(Debug, Clone)]
pub struct ProtocolCatalog {
    entries: HashMap<EventType, Vec<ProtocolDay>>,
}

fn action(
    id: &str,
    category: ActionCategory,
    duration_min: u32,
) -> ActionTemplate {
    ActionTemplate {
        id: id.to_string(),
        category,
        title_key: format!("action.{id}.title"),
        duration_min,
        rationale_key: format!("action.{id}.rationale"),
    }
}

fn day(day: u32, actions: Vec<ActionTemplate>) -> ProtocolDay {
    ProtocolDay { day, actions }
}

impl ProtocolCatalog {
    /// The built-in hand-authored catalog. Covers every [`EventType`];
    /// day counts and action counts deliberately vary per category.
    pub fn builtin() -> Self {
        use ActionCategory::*;
        let mut entries = HashMap::new();

        entries.insert(
            EventType::HeavyNight,
            vec![
                day(1, vec![
                    action("hydrate-500", Hydration, 2),
                    action("electrolytes", Hydration, 3),
                    action("light-walk", Walk, 15),
                    action("early-wind-down", WindDown, 10),
                ]),
                day(2, vec![
                    action("hydrate-500", Hydration, 2),
                    action("gentle-mobility", Mobility, 10),
                    action("protein-meal", Nutrition, 5),
                ]),
                day(3, vec![
                    action("morning-walk", Walk, 20),
                    action("box-breathing", Breathing, 5),
                ]),
            ],
        );

        entries.insert(
            EventType::RichMeal,
            vec![
                day(1, vec![
                    action("hydrate-500", Hydration, 2),
                    action("post-meal-walk", Walk, 20),
                    action("light-dinner", Nutrition, 5),
                ]),
                day(2, vec![
                    action("fiber-breakfast", Nutrition, 5),
                    action("morning-walk", Walk, 20),
                ]),
                day(3, vec![
                    action("gentle-mobility", Mobility, 10),
                    action("hydrate-500", Hydration, 2),
                ]),
            ],
        );

        entries.insert(
            EventType::LongDesk,
            vec![
                day(1, vec![
                    action("spinal-decompress", SpinalDecompression, 5),
                    action("hip-openers", Mobility, 8),
                    action("eye-break-walk", Walk, 10),
                ]),
                day(2, vec![
                    action("spinal-decompress", SpinalDecompression, 5),
                    action("thoracic-mobility", Mobility, 10),
                ]),
                day(3, vec![
                    action("full-mobility-flow", Mobility, 15),
                ]),
            ],
        );

        entries.insert(
            EventType::StressDay,
            vec![
                day(1, vec![
                    action("box-breathing", Breathing, 5),
                    action("evening-walk", Walk, 15),
                    action("early-wind-down", WindDown, 10),
                ]),
                day(2, vec![
                    action("box-breathing", Breathing, 5),
                    action("gentle-mobility", Mobility, 10),
                ]),
                day(3, vec![
                    action("long-exhale", Breathing, 8),
                    action("morning-walk", Walk, 20),
                ]),
            ],
        );

        entries.insert(
            EventType::Travel,
            vec![
                day(1, vec![
                    action("hydrate-500", Hydration, 2),
                    action("spinal-decompress", SpinalDecompression, 5),
                    action("leg-stretch", Mobility, 8),
                ]),
                day(2, vec![
                    action("morning-walk", Walk, 20),
                    action("early-wind-down", WindDown, 10),
                ]),
                day(3, vec![
                    action("gentle-mobility", Mobility, 10),
                ]),
            ],
        );

        entries.insert(
            EventType::Celebration,
            vec![
                day(1, vec![
                    action("hydrate-500", Hydration, 2),
                    action("electrolytes", Hydration, 3),
                    action("light-dinner", Nutrition, 5),
                    action("early-wind-down", WindDown, 10),
                ]),
                day(2, vec![
                    action("morning-walk", Walk, 20),
                    action("protein-meal", Nutrition, 5),
                ]),
                day(3, vec![
                    action("gentle-mobility", Mobility, 10),
                    action("box-breathing", Breathing, 5),
                ]),
            ],
        );

        entries.insert(
            EventType::PoorSleep,
            vec![
                day(1, vec![
                    action("morning-light-walk", Walk, 10),
                    action("no-caffeine-after-noon", Nutrition, 1),
                    action("early-wind-down", WindDown, 15),
                ]),
                day(2, vec![
                    action("box-breathing", Breathing, 5),
                    action("early-wind-down", WindDown, 15),
                ]),
                day(3, vec![
                    action("morning-light-walk", Walk, 10),
                ]),
            ],
        );

        Self { entries }
    }

    /// Ordered protocol days for an event type.
    ///
    /// # Errors
    /// `Configuration` when no content exists for the event type. Every
    /// value of the fixed enumeration must be present in the shipped
    /// catalog, so a miss is a content/deployment defect.
    pub fn days_for(&self, event_type: EventType) -> Result<&[ProtocolDay], EngineError> {
        self.entries
            .get(&event_type)
            .map(|v| v.as_slice())
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "no catalog content for event type '{}'",
                    event_type.name()
                ))
            })
    }

    /// One day's templates (1-indexed).
    ///
    /// # Errors
    /// `Configuration` when the event type or day index has no content.
    pub fn day(&self, event_type: EventType, day: u32) -> Result<&ProtocolDay, EngineError> {
        self.days_for(event_type)?
            .iter()
            .find(|d| d.day == day)
            .ok_or_else(|| {
                EngineError::Configuration(format!(
                    "no catalog day {} for event type '{}'",
                    day,
                    event_type.name()
                ))
            })
    }
}

impl Default for ProtocolCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}
