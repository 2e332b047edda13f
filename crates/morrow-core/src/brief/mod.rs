//! Weekly briefs: the forward risk calendar, week-over-week trend, and
//! insight tier.

pub mod aggregator;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::events::Event;

/// Risk classification for one forward calendar day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    Low,
    Medium,
    High,
}

/// One entry of the 7-day forward risk calendar.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RiskCalendarDay {
    pub date: NaiveDate,
    pub risk_level: RiskLevel,
    /// Human-readable explanation key; absent when there is nothing
    /// worth saying (or not enough history to say it).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub explanation_key: Option<String>,
}

/// Direction of the week-over-week comparison.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

/// Week-over-week scalar comparison. Purely derived; no hidden state.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WeekComparison {
    pub current_week: u32,
    pub previous_week: u32,
    pub trend: Trend,
}

impl WeekComparison {
    pub fn new(current_week: u32, previous_week: u32) -> Self {
        let trend = match current_week.cmp(&previous_week) {
            std::cmp::Ordering::Greater => Trend::Up,
            std::cmp::Ordering::Less => Trend::Down,
            std::cmp::Ordering::Equal => Trend::Stable,
        };
        Self {
            current_week,
            previous_week,
            trend,
        }
    }
}

/// A recurring pattern surfaced from the rolling window.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PatternInsight {
    pub key: String,
    /// Weekday the pattern clusters on (Mon=0 .. Sun=6), when relevant.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub weekday: Option<u8>,
    pub occurrences: u32,
}

/// The weekly per-user artifact. Superseded by the next week's brief,
/// never deleted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Brief {
    pub id: Uuid,
    pub user_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub headline_key: String,
    /// Starts at 1, advances only with sustained engagement, never
    /// regresses.
    pub insight_tier: u32,
    /// Exactly 7 entries, chronological, starting from "today".
    pub calendar: Vec<RiskCalendarDay>,
    pub insights: Vec<PatternInsight>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comparison: Option<WeekComparison>,
    pub is_read: bool,
}

impl Brief {
    /// The single allowed is_read transition: false -> true.
    ///
    /// Returns the `BriefRead` event when this call performed the
    /// transition; reading an already-read brief is a no-op.
    pub fn mark_read(&mut self, at: DateTime<Utc>) -> Option<Event> {
        if self.is_read {
            None
        } else {
            self.is_read = true;
            Some(Event::BriefRead {
                brief_id: self.id,
                at,
            })
        }
    }

    /// The event announcing this brief to the UI layer.
    pub fn generated_event(&self) -> Event {
        Event::BriefGenerated {
            brief_id: self.id,
            insight_tier: self.insight_tier,
            at: self.generated_at,
        }
    }
}
