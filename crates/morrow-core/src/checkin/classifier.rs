//! Check-in classifier: per-trigger question scripts.
//!
//! Each trigger has a fixed script of questions. The session is a small
//! caller-driven state machine: feed it one answer at a time and it
//! tells you whether to ask another question, finish, or short-circuit
//! with a priority route. Branch conditions live here as data-driven
//! decisions, not in UI event handlers.
//!
//! Every answer is a committed, auto-advancing transition. There is no
//! confirm step and no way to revise a prior answer within a session;
//! the record is submitted atomically when the script is satisfied.

use chrono::Utc;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::checkin::{
    BackPainScore, BodyFeeling, CheckIn, CheckInPayload, EventIntensity, EventType, MiddayFeeling,
    SleepQuality, Trigger,
};
use crate::error::EngineError;
use crate::events::Event;
use crate::profile::{Condition, Profile};
use crate::protocol::catalog::ActionCategory;

/// A question the script may ask next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Question {
    SleepQuality,
    BodyFeeling,
    BackPainScore,
    EventIntensity,
    EventType,
    MiddayFeeling,
}

impl Question {
    pub fn key(&self) -> &'static str {
        match self {
            Question::SleepQuality => "sleep_quality",
            Question::BodyFeeling => "body_feeling",
            Question::BackPainScore => "back_pain_score",
            Question::EventIntensity => "event_intensity",
            Question::EventType => "event_type",
            Question::MiddayFeeling => "midday_feeling",
        }
    }
}

/// One committed answer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "question", content = "value", rename_all = "snake_case")]
pub enum Answer {
    SleepQuality(SleepQuality),
    BodyFeeling(BodyFeeling),
    BackPainScore(BackPainScore),
    EventIntensity(EventIntensity),
    EventType(EventType),
    MiddayFeeling(MiddayFeeling),
}

impl Answer {
    fn question(&self) -> Question {
        match self {
            Answer::SleepQuality(_) => Question::SleepQuality,
            Answer::BodyFeeling(_) => Question::BodyFeeling,
            Answer::BackPainScore(_) => Question::BackPainScore,
            Answer::EventIntensity(_) => Question::EventIntensity,
            Answer::EventType(_) => Question::EventType,
            Answer::MiddayFeeling(_) => Question::MiddayFeeling,
        }
    }
}

/// What the caller should do after committing an answer.
#[derive(Debug, Clone)]
pub enum StepOutcome {
    /// Ask the next question.
    Next(Question),
    /// Script satisfied; the record is submitted atomically, together
    /// with the events the submission produced.
    Finished {
        checkin: CheckIn,
        events: Vec<Event>,
    },
    /// Midday back-tight short circuit: finish immediately and route to
    /// the given action category, bypassing any remaining flow.
    PriorityRoute {
        checkin: CheckIn,
        category: ActionCategory,
        events: Vec<Event>,
    },
}

/// Answers accumulated so far.
#[derive(Debug, Clone, Default)]
struct PartialAnswers {
    sleep_quality: Option<SleepQuality>,
    body_feeling: Option<BodyFeeling>,
    back_pain_score: Option<BackPainScore>,
    intensity: Option<EventIntensity>,
    event_type: Option<EventType>,
    midday: Option<MiddayFeeling>,
}

/// One in-flight classification session.
///
/// Holds a snapshot of the profile's conditions taken at start; editing
/// conditions mid-session does not change the branch decisions.
#[derive(Debug, Clone)]
pub struct ClassifierSession {
    user_id: Uuid,
    trigger: Trigger,
    has_back_pain_condition: bool,
    answers: PartialAnswers,
    pending: Option<Question>,
}

impl ClassifierSession {
    /// Start a session for the given trigger.
    pub fn start(trigger: Trigger, profile: &Profile) -> Self {
        let first = match trigger {
            Trigger::Morning => Question::SleepQuality,
            Trigger::PostEvent => Question::EventIntensity,
            Trigger::Midday => Question::MiddayFeeling,
        };
        Self {
            user_id: profile.id,
            trigger,
            has_back_pain_condition: profile.conditions.contains(Condition::BackPain),
            answers: PartialAnswers::default(),
            pending: Some(first),
        }
    }

    pub fn trigger(&self) -> Trigger {
        self.trigger
    }

    /// The question currently awaiting an answer, if any.
    pub fn pending(&self) -> Option<Question> {
        self.pending
    }

    /// Commit one answer and advance the script.
    ///
    /// # Errors
    /// `InvalidTransition` if the answer does not match the pending
    /// question (callers must always ask what `pending()` says), or if
    /// the session already finished.
    pub fn answer(&mut self, answer: Answer) -> Result<StepOutcome, EngineError> {
        let pending = self.pending.ok_or_else(|| {
            EngineError::InvalidTransition("classification session already finished".to_string())
        })?;
        if answer.question() != pending {
            return Err(EngineError::InvalidTransition(format!(
                "expected answer to '{}', got answer to '{}'",
                pending.key(),
                answer.question().key()
            )));
        }

        match answer {
            Answer::SleepQuality(v) => self.answers.sleep_quality = Some(v),
            Answer::BodyFeeling(v) => self.answers.body_feeling = Some(v),
            Answer::BackPainScore(v) => self.answers.back_pain_score = Some(v),
            Answer::EventIntensity(v) => self.answers.intensity = Some(v),
            Answer::EventType(v) => self.answers.event_type = Some(v),
            Answer::MiddayFeeling(v) => self.answers.midday = Some(v),
        }

        Ok(self.advance(pending))
    }

    /// Decision table: given the question just answered, pick the next
    /// step.
    fn advance(&mut self, answered: Question) -> StepOutcome {
        match (self.trigger, answered) {
            (Trigger::Morning, Question::SleepQuality) => {
                self.ask(Question::BodyFeeling)
            }
            (Trigger::Morning, Question::BodyFeeling) => {
                // Condition-gated branch: only when the profile declares
                // back_pain and the body feeling points at it. A profile
                // with no conditions skips this as a normal negative
                // branch, not an error.
                let feeling = self.answers.body_feeling.expect("just recorded");
                if self.has_back_pain_condition && feeling.suggests_back_pain() {
                    self.ask(Question::BackPainScore)
                } else {
                    self.submit()
                }
            }
            // Single tap on the score finishes the check-in.
            (Trigger::Morning, Question::BackPainScore) => self.submit(),
            (Trigger::PostEvent, Question::EventIntensity) => {
                let intensity = self.answers.intensity.expect("just recorded");
                if intensity.warrants_protocol() {
                    self.ask(Question::EventType)
                } else {
                    // Light events never collect an event type.
                    self.submit()
                }
            }
            (Trigger::PostEvent, Question::EventType) => self.submit(),
            (Trigger::Midday, Question::MiddayFeeling) => {
                let feeling = self.answers.midday.expect("just recorded");
                let checkin = self.finish_record();
                let mut events = vec![Self::recorded_event(&checkin)];
                if feeling == MiddayFeeling::BackTight {
                    let category = ActionCategory::SpinalDecompression;
                    events.push(Event::PriorityRouted {
                        checkin_id: checkin.id,
                        category,
                        at: checkin.recorded_at,
                    });
                    StepOutcome::PriorityRoute {
                        checkin,
                        category,
                        events,
                    }
                } else {
                    StepOutcome::Finished { checkin, events }
                }
            }
            // The pending/answered pairing is checked in answer(); any
            // other combination cannot occur.
            _ => unreachable!("question not part of this trigger's script"),
        }
    }

    fn ask(&mut self, question: Question) -> StepOutcome {
        self.pending = Some(question);
        StepOutcome::Next(question)
    }

    fn recorded_event(checkin: &CheckIn) -> Event {
        Event::CheckInRecorded {
            checkin_id: checkin.id,
            trigger: checkin.trigger(),
            at: checkin.recorded_at,
        }
    }

    fn submit(&mut self) -> StepOutcome {
        let checkin = self.finish_record();
        let events = vec![Self::recorded_event(&checkin)];
        StepOutcome::Finished { checkin, events }
    }

    fn finish_record(&mut self) -> CheckIn {
        self.pending = None;
        let payload = match self.trigger {
            Trigger::Morning => CheckInPayload::Morning {
                sleep_quality: self.answers.sleep_quality.expect("script order"),
                body_feeling: self.answers.body_feeling.expect("script order"),
                back_pain_score: self.answers.back_pain_score,
            },
            Trigger::PostEvent => CheckInPayload::PostEvent {
                intensity: self.answers.intensity.expect("script order"),
                event_type: self.answers.event_type,
            },
            Trigger::Midday => CheckInPayload::Midday {
                feeling: self.answers.midday.expect("script order"),
            },
        };
        CheckIn {
            id: Uuid::new_v4(),
            user_id: self.user_id,
            recorded_at: Utc::now(),
            payload,
        }
    }

    /// Attempt to submit before the script is satisfied.
    ///
    /// Exists so callers that buffer answers can fail loudly instead of
    /// persisting a partial record.
    ///
    /// # Errors
    /// `ClassificationIncomplete` naming the question still pending.
    pub fn finish(&mut self) -> Result<CheckIn, EngineError> {
        match self.pending {
            Some(q) => Err(EngineError::ClassificationIncomplete(q.key().to_string())),
            None => Ok(self.finish_record()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::profile::Profile;

    fn profile_with(conditions: &[Condition]) -> Profile {
        let mut profile = Profile::new(Uuid::new_v4());
        for c in conditions {
            profile.conditions.toggle(*c);
        }
        profile
    }

    #[test]
    fn morning_with_back_pain_asks_score() {
        // back_pain declared, fair sleep, stiff body -> score question
        // appears; selecting 6 lands in the record.
        let profile = profile_with(&[Condition::BackPain]);
        let mut session = ClassifierSession::start(Trigger::Morning, &profile);

        let step = session
            .answer(Answer::SleepQuality(SleepQuality::Fair))
            .unwrap();
        assert!(matches!(step, StepOutcome::Next(Question::BodyFeeling)));

        let step = session.answer(Answer::BodyFeeling(BodyFeeling::Stiff)).unwrap();
        assert!(matches!(step, StepOutcome::Next(Question::BackPainScore)));

        let step = session
            .answer(Answer::BackPainScore(BackPainScore::Moderate))
            .unwrap();
        match step {
            StepOutcome::Finished { checkin, .. } => match checkin.payload {
                CheckInPayload::Morning { back_pain_score, .. } => {
                    assert_eq!(back_pain_score.map(|s| s.value()), Some(6));
                }
                _ => panic!("expected morning payload"),
            },
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn morning_without_condition_skips_score() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Morning, &profile);
        session.answer(Answer::SleepQuality(SleepQuality::Poor)).unwrap();
        let step = session.answer(Answer::BodyFeeling(BodyFeeling::Stiff)).unwrap();
        match step {
            StepOutcome::Finished { checkin, .. } => match checkin.payload {
                CheckInPayload::Morning { back_pain_score, .. } => {
                    assert_eq!(back_pain_score, None);
                }
                _ => panic!("expected morning payload"),
            },
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn morning_fresh_body_skips_score_even_with_condition() {
        let profile = profile_with(&[Condition::BackPain]);
        let mut session = ClassifierSession::start(Trigger::Morning, &profile);
        session.answer(Answer::SleepQuality(SleepQuality::Good)).unwrap();
        let step = session.answer(Answer::BodyFeeling(BodyFeeling::Fresh)).unwrap();
        match step {
            StepOutcome::Finished { checkin, .. } => match checkin.payload {
                CheckInPayload::Morning { back_pain_score, .. } => {
                    assert_eq!(back_pain_score, None);
                }
                _ => panic!("expected morning payload"),
            },
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn post_event_light_finishes_without_event_type() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::PostEvent, &profile);
        let step = session
            .answer(Answer::EventIntensity(EventIntensity::Light))
            .unwrap();
        match step {
            StepOutcome::Finished { checkin, .. } => {
                assert_eq!(checkin.event_type(), None);
                assert_eq!(checkin.intensity(), Some(EventIntensity::Light));
            }
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn post_event_heavy_asks_event_type() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::PostEvent, &profile);
        let step = session
            .answer(Answer::EventIntensity(EventIntensity::Heavy))
            .unwrap();
        assert!(matches!(step, StepOutcome::Next(Question::EventType)));

        let step = session.answer(Answer::EventType(EventType::HeavyNight)).unwrap();
        match step {
            StepOutcome::Finished { checkin, .. } => {
                assert_eq!(checkin.event_type(), Some(EventType::HeavyNight));
            }
            _ => panic!("expected Finished"),
        }
    }

    #[test]
    fn midday_back_tight_priority_routes() {
        // The back-tight option terminates the script immediately with
        // a route to spinal decompression.
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Midday, &profile);
        let step = session
            .answer(Answer::MiddayFeeling(MiddayFeeling::BackTight))
            .unwrap();
        match step {
            StepOutcome::PriorityRoute {
                category, checkin, ..
            } => {
                assert_eq!(category, ActionCategory::SpinalDecompression);
                assert_eq!(checkin.trigger(), Trigger::Midday);
            }
            _ => panic!("expected PriorityRoute"),
        }
        assert_eq!(session.pending(), None);
    }

    #[test]
    fn submission_carries_its_own_events() {
        // The outcome's event list is the one source the UI layer reads;
        // a priority route reports both the record and the route.
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Midday, &profile);
        let step = session
            .answer(Answer::MiddayFeeling(MiddayFeeling::BackTight))
            .unwrap();
        let StepOutcome::PriorityRoute {
            checkin, events, ..
        } = step
        else {
            panic!("expected PriorityRoute");
        };
        assert_eq!(events.len(), 2);
        assert!(matches!(
            events[0],
            Event::CheckInRecorded { checkin_id, .. } if checkin_id == checkin.id
        ));
        assert!(matches!(
            events[1],
            Event::PriorityRouted {
                category: ActionCategory::SpinalDecompression,
                ..
            }
        ));

        let mut session = ClassifierSession::start(Trigger::Midday, &profile);
        let step = session
            .answer(Answer::MiddayFeeling(MiddayFeeling::Focused))
            .unwrap();
        let StepOutcome::Finished { checkin, events } = step else {
            panic!("expected Finished");
        };
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            Event::CheckInRecorded { checkin_id, .. } if checkin_id == checkin.id
        ));
    }

    #[test]
    fn midday_other_answers_finish_normally() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Midday, &profile);
        let step = session
            .answer(Answer::MiddayFeeling(MiddayFeeling::Sluggish))
            .unwrap();
        assert!(matches!(step, StepOutcome::Finished { .. }));
    }

    #[test]
    fn wrong_answer_is_invalid_transition() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Morning, &profile);
        let err = session
            .answer(Answer::EventIntensity(EventIntensity::Heavy))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
        // The pending question is unchanged.
        assert_eq!(session.pending(), Some(Question::SleepQuality));
    }

    #[test]
    fn premature_finish_is_blocked() {
        let profile = profile_with(&[Condition::BackPain]);
        let mut session = ClassifierSession::start(Trigger::Morning, &profile);
        session.answer(Answer::SleepQuality(SleepQuality::Fair)).unwrap();
        let err = session.finish().unwrap_err();
        match err {
            EngineError::ClassificationIncomplete(missing) => {
                assert_eq!(missing, "body_feeling");
            }
            _ => panic!("expected ClassificationIncomplete"),
        }
    }

    #[test]
    fn answering_after_finish_is_invalid() {
        let profile = profile_with(&[]);
        let mut session = ClassifierSession::start(Trigger::Midday, &profile);
        session
            .answer(Answer::MiddayFeeling(MiddayFeeling::Focused))
            .unwrap();
        let err = session
            .answer(Answer::MiddayFeeling(MiddayFeeling::Stressed))
            .unwrap_err();
        assert!(matches!(err, EngineError::InvalidTransition(_)));
    }
}
