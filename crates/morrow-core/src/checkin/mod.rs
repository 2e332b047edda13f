//! Check-in records and answer vocabulary.
//!
//! A check-in is one structured self-report for a trigger moment
//! (morning, post-event, midday). The record is immutable once created;
//! the classifier in [`classifier`] is the only thing that builds one.

pub mod classifier;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The moment that prompted a check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Trigger {
    Morning,
    PostEvent,
    Midday,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    Poor,
    Fair,
    Good,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BodyFeeling {
    Fresh,
    Stiff,
    Sore,
    Heavy,
}

impl BodyFeeling {
    /// Whether this feeling opens the condition-gated back-pain branch.
    pub fn suggests_back_pain(&self) -> bool {
        matches!(self, BodyFeeling::Stiff | BodyFeeling::Sore)
    }
}

/// Back pain self-score on the 0/3/6/9 scale.
///
/// Only ever recorded when the profile declares `back_pain` and the
/// same check-in's body feeling is stiff or sore; otherwise absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackPainScore {
    None,
    Mild,
    Moderate,
    Severe,
}

impl BackPainScore {
    /// Numeric value on the 0/3/6/9 scale.
    pub fn value(&self) -> u8 {
        match self {
            BackPainScore::None => 0,
            BackPainScore::Mild => 3,
            BackPainScore::Moderate => 6,
            BackPainScore::Severe => 9,
        }
    }

    pub fn from_value(value: u8) -> Option<Self> {
        match value {
            0 => Some(BackPainScore::None),
            3 => Some(BackPainScore::Mild),
            6 => Some(BackPainScore::Moderate),
            9 => Some(BackPainScore::Severe),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventIntensity {
    Light,
    Medium,
    Heavy,
}

impl EventIntensity {
    /// Medium and heavy events warrant an event-type follow-up and a
    /// recovery protocol; light events end the script immediately.
    pub fn warrants_protocol(&self) -> bool {
        matches!(self, EventIntensity::Medium | EventIntensity::Heavy)
    }

    pub fn name(&self) -> &'static str {
        match self {
            EventIntensity::Light => "light",
            EventIntensity::Medium => "medium",
            EventIntensity::Heavy => "heavy",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "light" => Some(EventIntensity::Light),
            "medium" => Some(EventIntensity::Medium),
            "heavy" => Some(EventIntensity::Heavy),
            _ => None,
        }
    }
}

/// Normalized event category for a post-event check-in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    HeavyNight,
    RichMeal,
    LongDesk,
    StressDay,
    Travel,
    Celebration,
    PoorSleep,
}

impl EventType {
    /// Every category, in the order the 2x3(+1) picker shows them.
    pub const ALL: [EventType; 7] = [
        EventType::HeavyNight,
        EventType::RichMeal,
        EventType::LongDesk,
        EventType::StressDay,
        EventType::Travel,
        EventType::Celebration,
        EventType::PoorSleep,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            EventType::HeavyNight => "heavy_night",
            EventType::RichMeal => "rich_meal",
            EventType::LongDesk => "long_desk",
            EventType::StressDay => "stress_day",
            EventType::Travel => "travel",
            EventType::Celebration => "celebration",
            EventType::PoorSleep => "poor_sleep",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.name() == name)
    }
}

/// Answer to the single midday question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MiddayFeeling {
    Focused,
    Sluggish,
    Stressed,
    /// The priority-route option: a tight back at midday always wins
    /// over normal sequencing.
    BackTight,
}

/// Trigger-specific payload of a check-in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "trigger", rename_all = "snake_case")]
pub enum CheckInPayload {
    Morning {
        sleep_quality: SleepQuality,
        body_feeling: BodyFeeling,
        /// Absent (not zero) unless the back-pain branch was taken.
        #[serde(skip_serializing_if = "Option::is_none")]
        back_pain_score: Option<BackPainScore>,
    },
    PostEvent {
        intensity: EventIntensity,
        /// Absent for light events; downstream code must not assume a
        /// protocol exists for them.
        #[serde(skip_serializing_if = "Option::is_none")]
        event_type: Option<EventType>,
    },
    Midday {
        feeling: MiddayFeeling,
    },
}

impl CheckInPayload {
    pub fn trigger(&self) -> Trigger {
        match self {
            CheckInPayload::Morning { .. } => Trigger::Morning,
            CheckInPayload::PostEvent { .. } => Trigger::PostEvent,
            CheckInPayload::Midday { .. } => Trigger::Midday,
        }
    }
}

/// One immutable, timestamped self-report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckIn {
    pub id: Uuid,
    pub user_id: Uuid,
    pub recorded_at: DateTime<Utc>,
    pub payload: CheckInPayload,
}

impl CheckIn {
    pub fn trigger(&self) -> Trigger {
        self.payload.trigger()
    }

    /// Post-event intensity, if this is a post-event check-in.
    pub fn intensity(&self) -> Option<EventIntensity> {
        match &self.payload {
            CheckInPayload::PostEvent { intensity, .. } => Some(*intensity),
            _ => None,
        }
    }

    /// Post-event category, if one was collected.
    pub fn event_type(&self) -> Option<EventType> {
        match &self.payload {
            CheckInPayload::PostEvent { event_type, .. } => *event_type,
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn back_pain_score_scale() {
        assert_eq!(BackPainScore::None.value(), 0);
        assert_eq!(BackPainScore::Mild.value(), 3);
        assert_eq!(BackPainScore::Moderate.value(), 6);
        assert_eq!(BackPainScore::Severe.value(), 9);
        assert_eq!(BackPainScore::from_value(6), Some(BackPainScore::Moderate));
        assert_eq!(BackPainScore::from_value(5), None);
    }

    #[test]
    fn payload_serializes_with_trigger_tag() {
        let payload = CheckInPayload::PostEvent {
            intensity: EventIntensity::Heavy,
            event_type: Some(EventType::HeavyNight),
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(json.contains(r#""trigger":"post_event""#));
        assert!(json.contains(r#""event_type":"heavy_night""#));
    }

    #[test]
    fn absent_fields_stay_absent_in_json() {
        let payload = CheckInPayload::Morning {
            sleep_quality: SleepQuality::Good,
            body_feeling: BodyFeeling::Fresh,
            back_pain_score: None,
        };
        let json = serde_json::to_string(&payload).unwrap();
        assert!(!json.contains("back_pain_score"));
    }

    #[test]
    fn event_type_name_round_trip() {
        for t in EventType::ALL {
            assert_eq!(EventType::from_name(t.name()), Some(t));
        }
    }
}
