//! User profile snapshot: declared conditions and entitlement.
//!
//! The engine never reads ambient global state. Every operation that
//! depends on who the user is takes a `Profile` snapshot as an argument;
//! the caller is responsible for loading and persisting it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A declared chronic condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Condition {
    Gout,
    Cholesterol,
    BackPain,
    /// "I'm not sure" -- mutually exclusive with every other tag.
    Unsure,
}

impl Condition {
    /// All selectable tags, in display order.
    pub const ALL: [Condition; 4] = [
        Condition::Gout,
        Condition::Cholesterol,
        Condition::BackPain,
        Condition::Unsure,
    ];

    /// Short name used in storage and on the CLI.
    pub fn name(&self) -> &'static str {
        match self {
            Condition::Gout => "gout",
            Condition::Cholesterol => "cholesterol",
            Condition::BackPain => "back_pain",
            Condition::Unsure => "unsure",
        }
    }

    /// Parse a short name back into a tag.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "gout" => Some(Condition::Gout),
            "cholesterol" => Some(Condition::Cholesterol),
            "back_pain" => Some(Condition::BackPain),
            "unsure" => Some(Condition::Unsure),
            _ => None,
        }
    }
}

/// The set of conditions a user has declared.
///
/// Invariant: `Unsure` never coexists with any other tag. Toggling
/// `Unsure` collapses the set to `{Unsure}`; toggling anything else
/// removes `Unsure`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConditionSet {
    tags: Vec<Condition>,
}

impl ConditionSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Toggle a tag in or out of the set.
    ///
    /// `Unsure` is mutually exclusive: selecting it clears all others,
    /// and selecting any other tag removes `Unsure`.
    pub fn toggle(&mut self, tag: Condition) {
        if tag == Condition::Unsure {
            self.tags = vec![Condition::Unsure];
            return;
        }
        self.tags.retain(|t| *t != Condition::Unsure);
        if let Some(pos) = self.tags.iter().position(|t| *t == tag) {
            self.tags.remove(pos);
        } else {
            self.tags.push(tag);
        }
    }

    pub fn contains(&self, tag: Condition) -> bool {
        self.tags.contains(&tag)
    }

    pub fn is_empty(&self) -> bool {
        self.tags.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Condition> {
        self.tags.iter()
    }
}

/// Paid-access status, gating protocol days beyond the first.
///
/// Unlocking is an external event (a purchase); it changes nothing in
/// the engine's state, only which transitions it accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Entitlement {
    Free,
    Plus,
}

impl Entitlement {
    pub fn is_paid(&self) -> bool {
        matches!(self, Entitlement::Plus)
    }
}

impl Default for Entitlement {
    fn default() -> Self {
        Entitlement::Free
    }
}

/// A snapshot of one user profile, passed into core operations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Profile {
    pub id: Uuid,
    pub conditions: ConditionSet,
    pub entitlement: Entitlement,
    pub created_at: DateTime<Utc>,
}

impl Profile {
    /// Create a fresh profile with no declared conditions.
    pub fn new(id: Uuid) -> Self {
        Self {
            id,
            conditions: ConditionSet::new(),
            entitlement: Entitlement::Free,
            created_at: Utc::now(),
        }
    }
}
