//! Brief aggregator: turns a rolling window of check-ins and action
//! sessions into the weekly brief.
//!
//! The structural contract is fixed (7 chronological calendar days, one
//! risk level each, derived trend); the scoring thresholds are policy,
//! tunable via [`AggregatorPolicy`]. Insufficient history is not an
//! error: it produces an all-low calendar with no comparison, which the
//! UI renders as "not enough data yet".

use chrono::{DateTime, Datelike, Duration, NaiveDate, Utc, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::brief::{
    Brief, PatternInsight, RiskCalendarDay, RiskLevel, WeekComparison,
};
use crate::checkin::{CheckIn, EventIntensity};
use crate::protocol::ActionSession;

/// Tunable aggregation policy. Thresholds are a product decision, not a
/// structural contract; defaults match the shipped configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregatorPolicy {
    /// Rolling history window, in days.
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    /// Medium/heavy post-event check-ins on a weekday within the window
    /// needed to classify that weekday High.
    #[serde(default = "default_high_threshold")]
    pub weekday_high_threshold: u32,
    /// Same count needed for Medium.
    #[serde(default = "default_medium_threshold")]
    pub weekday_medium_threshold: u32,
    /// Check-ins required in the window before patterns are reported.
    #[serde(default = "default_min_history")]
    pub min_history_checkins: u32,
    /// Completed-and-viewed weekly cycles per insight tier step.
    #[serde(default = "default_tier_advance_weeks")]
    pub tier_advance_weeks: u32,
}

fn default_window_days() -> u32 {
    28
}
fn default_high_threshold() -> u32 {
    3
}
fn default_medium_threshold() -> u32 {
    1
}
fn default_min_history() -> u32 {
    7
}
fn default_tier_advance_weeks() -> u32 {
    4
}

impl Default for AggregatorPolicy {
    fn default() -> Self {
        Self {
            window_days: default_window_days(),
            weekday_high_threshold: default_high_threshold(),
            weekday_medium_threshold: default_medium_threshold(),
            min_history_checkins: default_min_history(),
            tier_advance_weeks: default_tier_advance_weeks(),
        }
    }
}

/// Inputs gathered by the caller for one aggregation cycle.
#[derive(Debug, Clone, Default)]
pub struct BriefInputs<'a> {
    /// Check-ins within (at least) the policy window.
    pub checkins: &'a [CheckIn],
    /// Action sessions within (at least) the last two weeks.
    pub sessions: &'a [ActionSession],
    /// The previous brief, for tier monotonicity.
    pub prior_tier: Option<u32>,
    /// Weeks with a generated AND viewed brief -- not weeks since
    /// signup.
    pub completed_viewed_weeks: u32,
}

/// Weekly brief builder.
pub struct BriefAggregator {
    policy: AggregatorPolicy,
}

impl BriefAggregator {
    pub fn new() -> Self {
        Self {
            policy: AggregatorPolicy::default(),
        }
    }

    pub fn with_policy(policy: AggregatorPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> &AggregatorPolicy {
        &self.policy
    }

    /// Build one brief from a snapshot of history.
    ///
    /// `today` anchors the forward calendar; the first entry is always
    /// `today` and the remaining six follow chronologically.
    pub fn aggregate(
        &self,
        user_id: Uuid,
        inputs: &BriefInputs,
        today: NaiveDate,
        now: DateTime<Utc>,
    ) -> Brief {
        let window_start = today - Duration::days(self.policy.window_days as i64);
        let in_window: Vec<&CheckIn> = inputs
            .checkins
            .iter()
            .filter(|c| {
                let date = c.recorded_at.date_naive();
                date >= window_start && date <= today
            })
            .collect();

        let sparse = (in_window.len() as u32) < self.policy.min_history_checkins;

        // Medium/heavy post-event check-ins bucketed by weekday.
        let mut weekday_counts = [0u32; 7];
        for checkin in &in_window {
            if matches!(
                checkin.intensity(),
                Some(EventIntensity::Medium | EventIntensity::Heavy)
            ) {
                let idx = checkin.recorded_at.weekday().num_days_from_monday() as usize;
                weekday_counts[idx] += 1;
            }
        }

        let calendar: Vec<RiskCalendarDay> = (0..7)
            .map(|offset| {
                let date = today + Duration::days(offset);
                if sparse {
                    return RiskCalendarDay {
                        date,
                        risk_level: RiskLevel::Low,
                        explanation_key: None,
                    };
                }
                let count = weekday_counts[date.weekday().num_days_from_monday() as usize];
                let (risk_level, explanation_key) = if count >= self.policy.weekday_high_threshold {
                    (RiskLevel::High, Some("risk.recurring_heavy".to_string()))
                } else if count >= self.policy.weekday_medium_threshold {
                    (RiskLevel::Medium, Some("risk.occasional_heavy".to_string()))
                } else {
                    (RiskLevel::Low, None)
                };
                RiskCalendarDay {
                    date,
                    risk_level,
                    explanation_key,
                }
            })
            .collect();

        let insights = if sparse {
            Vec::new()
        } else {
            weekday_counts
                .iter()
                .enumerate()
                .filter(|(_, &count)| count >= self.policy.weekday_high_threshold)
                .map(|(weekday, &count)| PatternInsight {
                    key: "pattern.weekday_heavy".to_string(),
                    weekday: Some(weekday as u8),
                    occurrences: count,
                })
                .collect()
        };

        let comparison = if sparse {
            None
        } else {
            let current = self.week_score(inputs, today - Duration::days(6), today);
            let previous =
                self.week_score(inputs, today - Duration::days(13), today - Duration::days(7));
            Some(WeekComparison::new(current, previous))
        };

        let insight_tier = self.insight_tier(inputs.completed_viewed_weeks, inputs.prior_tier);

        let headline_key = match (&comparison, sparse) {
            (_, true) => "brief.headline.not_enough_data",
            (Some(c), _) => match c.trend {
                crate::brief::Trend::Up => "brief.headline.momentum",
                crate::brief::Trend::Down => "brief.headline.reset",
                crate::brief::Trend::Stable => "brief.headline.steady",
            },
            (None, _) => "brief.headline.steady",
        }
        .to_string();

        Brief {
            id: Uuid::new_v4(),
            user_id,
            generated_at: now,
            headline_key,
            insight_tier,
            calendar,
            insights,
            comparison,
            is_read: false,
        }
    }

    /// Scalar engagement/risk score for one inclusive date span:
    /// completed actions count for one point each, medium post-event
    /// check-ins one, heavy two.
    fn week_score(&self, inputs: &BriefInputs, from: NaiveDate, to: NaiveDate) -> u32 {
        let in_span = |at: DateTime<Utc>| {
            let date = at.date_naive();
            date >= from && date <= to
        };
        let session_points = inputs
            .sessions
            .iter()
            .filter(|s| s.completed && in_span(s.recorded_at))
            .count() as u32;
        let checkin_points: u32 = inputs
            .checkins
            .iter()
            .filter(|c| in_span(c.recorded_at))
            .map(|c| match c.intensity() {
                Some(EventIntensity::Heavy) => 2,
                Some(EventIntensity::Medium) => 1,
                _ => 0,
            })
            .sum();
        session_points + checkin_points
    }

    /// Insight tier from completed-and-viewed weekly cycles. Monotonic:
    /// never drops below the prior brief's tier.
    fn insight_tier(&self, completed_viewed_weeks: u32, prior_tier: Option<u32>) -> u32 {
        let computed = 1 + completed_viewed_weeks / self.policy.tier_advance_weeks.max(1);
        computed.max(prior_tier.unwrap_or(1))
    }

    /// Whether to show the Monday-morning intercept before the next
    /// check-in. All three conditions must hold; any one failing means
    /// the user proceeds straight to their check-in.
    ///
    /// The weeks threshold is the one the latest brief's tier was
    /// reached at. A tier-N brief exists once the counter passed
    /// `tier_advance_weeks * (N - 1)`, so that is what the counter is
    /// checked against; comparing against tier N's own multiple would
    /// ask for a week count no generated brief can be paired with.
    pub fn monday_intercept(
        &self,
        today: NaiveDate,
        completed_viewed_weeks: u32,
        latest: Option<&Brief>,
    ) -> bool {
        let Some(latest) = latest else {
            return false;
        };
        let threshold =
            self.policy.tier_advance_weeks * latest.insight_tier.saturating_sub(1).max(1);
        today.weekday() == Weekday::Mon
            && completed_viewed_weeks >= threshold
            && !latest.is_read
    }
}

impl Default for BriefAggregator {
    fn default() -> Self {
        Self::new()
    }
}
