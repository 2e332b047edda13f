use chrono::Utc;
use clap::Subcommand;
use morrow_core::{
    assign, Answer, AssignOutcome, BackPainScore, BodyFeeling, ClassifierSession, Database,
    EventIntensity, EventType, MiddayFeeling, Question, SleepQuality, StepOutcome, Trigger,
};

use super::common::load_or_create_profile;

#[derive(Subcommand)]
pub enum CheckinAction {
    /// Morning check-in
    Morning {
        /// Sleep quality: poor, fair, good
        sleep: String,
        /// Body feeling: fresh, stiff, sore, heavy
        body: String,
        /// Back pain score (0, 3, 6, 9); required only when the
        /// back-pain question is asked
        #[arg(long)]
        back_pain: Option<u8>,
    },
    /// Post-event check-in
    PostEvent {
        /// Intensity: light, medium, heavy
        intensity: String,
        /// Event type (heavy_night, rich_meal, long_desk, stress_day,
        /// travel, celebration, poor_sleep); required for medium/heavy
        #[arg(long)]
        event: Option<String>,
    },
    /// Midday check-in
    Midday {
        /// Feeling: focused, sluggish, stressed, back_tight
        feeling: String,
    },
}

fn parse_sleep(s: &str) -> Result<SleepQuality, String> {
    match s {
        "poor" => Ok(SleepQuality::Poor),
        "fair" => Ok(SleepQuality::Fair),
        "good" => Ok(SleepQuality::Good),
        other => Err(format!("unknown sleep quality '{other}'")),
    }
}

fn parse_body(s: &str) -> Result<BodyFeeling, String> {
    match s {
        "fresh" => Ok(BodyFeeling::Fresh),
        "stiff" => Ok(BodyFeeling::Stiff),
        "sore" => Ok(BodyFeeling::Sore),
        "heavy" => Ok(BodyFeeling::Heavy),
        other => Err(format!("unknown body feeling '{other}'")),
    }
}

fn parse_midday(s: &str) -> Result<MiddayFeeling, String> {
    match s {
        "focused" => Ok(MiddayFeeling::Focused),
        "sluggish" => Ok(MiddayFeeling::Sluggish),
        "stressed" => Ok(MiddayFeeling::Stressed),
        "back_tight" => Ok(MiddayFeeling::BackTight),
        other => Err(format!("unknown midday feeling '{other}'")),
    }
}

pub fn run(action: CheckinAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut db = Database::open()?;
    let profile = load_or_create_profile(&db)?;

    let (trigger, answers) = match &action {
        CheckinAction::Morning {
            sleep,
            body,
            back_pain,
        } => {
            let mut answers = vec![
                Answer::SleepQuality(parse_sleep(sleep)?),
                Answer::BodyFeeling(parse_body(body)?),
            ];
            if let Some(score) = back_pain {
                let score = BackPainScore::from_value(*score)
                    .ok_or_else(|| format!("back pain score must be 0, 3, 6 or 9, got {score}"))?;
                answers.push(Answer::BackPainScore(score));
            }
            (Trigger::Morning, answers)
        }
        CheckinAction::PostEvent { intensity, event } => {
            let intensity = EventIntensity::from_name(intensity)
                .ok_or_else(|| format!("unknown intensity '{intensity}'"))?;
            let mut answers = vec![Answer::EventIntensity(intensity)];
            if let Some(event) = event {
                let event = EventType::from_name(event)
                    .ok_or_else(|| format!("unknown event type '{event}'"))?;
                answers.push(Answer::EventType(event));
            }
            (Trigger::PostEvent, answers)
        }
        CheckinAction::Midday { feeling } => (
            Trigger::Midday,
            vec![Answer::MiddayFeeling(parse_midday(feeling)?)],
        ),
    };

    // Drive the script with the provided answers; the session decides
    // which questions actually get asked.
    let mut session = ClassifierSession::start(trigger, &profile);
    let mut answers = answers.into_iter();
    let (checkin, mut events) = loop {
        let pending = session.pending().expect("session still has a question");
        let answer = answers.next().ok_or_else(|| missing_answer(pending))?;
        match session.answer(answer)? {
            StepOutcome::Next(_) => continue,
            StepOutcome::Finished { checkin, events } => break (checkin, events),
            StepOutcome::PriorityRoute {
                checkin, events, ..
            } => break (checkin, events),
        }
    };

    db.insert_checkin(&checkin)?;

    // A post-event check-in may instantiate a recovery protocol.
    if let AssignOutcome::Assigned(assignment) =
        assign(&checkin, db.active_protocol(profile.id)?, Utc::now())
    {
        db.apply_assignment(&assignment)?;
        events.extend(assignment.events);
    }

    println!("{}", serde_json::to_string_pretty(&events)?);
    Ok(())
}

fn missing_answer(pending: Question) -> String {
    match pending {
        Question::BackPainScore => {
            "this check-in asks for a back pain score; pass --back-pain <0|3|6|9>".to_string()
        }
        Question::EventType => {
            "medium/heavy events ask for an event type; pass --event <type>".to_string()
        }
        other => format!("missing answer for question '{}'", other.key()),
    }
}
