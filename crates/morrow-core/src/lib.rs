//! # Morrow Core Library
//!
//! This library provides the personalization and protocol engine for
//! Morrow, a recovery companion. It implements a CLI-first philosophy
//! where all operations are available via a standalone CLI binary, with
//! any GUI being a thin layer over the same core library.
//!
//! ## Architecture
//!
//! - **Check-in classifier**: per-trigger question scripts turning raw
//!   answers into immutable check-in records, with conditional
//!   branching and a midday priority route
//! - **Protocol engine**: assignment of multi-day recovery protocols
//!   from post-event check-ins, and an action-by-action progression
//!   state machine behind an entitlement gate
//! - **Brief aggregator**: rolling-window analysis producing the weekly
//!   forward risk calendar, trend comparison, and insight tier
//! - **Storage**: SQLite state and TOML configuration
//!
//! ## Key Components
//!
//! - [`ClassifierSession`]: check-in question script state machine
//! - [`ProtocolProgression`]: per-day action state machine
//! - [`BriefAggregator`]: weekly brief builder
//! - [`Database`]: persistence for all engine state

pub mod brief;
pub mod checkin;
pub mod error;
pub mod events;
pub mod profile;
pub mod protocol;
pub mod storage;

pub use brief::aggregator::{AggregatorPolicy, BriefAggregator, BriefInputs};
pub use brief::{Brief, PatternInsight, RiskCalendarDay, RiskLevel, Trend, WeekComparison};
pub use checkin::classifier::{Answer, ClassifierSession, Question, StepOutcome};
pub use checkin::{
    BackPainScore, BodyFeeling, CheckIn, CheckInPayload, EventIntensity, EventType, MiddayFeeling,
    SleepQuality, Trigger,
};
pub use error::{ConfigError, CoreError, DatabaseError, EngineError, Result};
pub use events::Event;
pub use profile::{Condition, ConditionSet, Entitlement, Profile};
pub use protocol::assigner::{assign, AssignOutcome, Assignment};
pub use protocol::catalog::{ActionCategory, ActionTemplate, ProtocolCatalog, ProtocolDay};
pub use protocol::progression::{ActionState, ActionView, DayView, ProtocolProgression, Transition};
pub use protocol::{ActionSession, ProtocolStatus, RecoveryProtocol};
pub use storage::{Config, Database};
