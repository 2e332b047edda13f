use chrono::{Duration, Utc};
use clap::Subcommand;
use morrow_core::{BriefAggregator, BriefInputs, Config, Database};

use super::common::load_or_create_profile;

#[derive(Subcommand)]
pub enum BriefAction {
    /// Show the latest brief
    Show,
    /// Generate this week's brief
    Generate,
    /// Mark the latest brief as read
    Read,
    /// Whether the Monday-morning intercept should be shown
    Intercept,
}

pub fn run(action: BriefAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let profile = load_or_create_profile(&db)?;
    let config = Config::load()?;
    let aggregator = BriefAggregator::with_policy(config.aggregator);

    match action {
        BriefAction::Show => {
            let Some(brief) = db.latest_brief(profile.id)? else {
                return Err("no brief generated yet".into());
            };
            println!("{}", serde_json::to_string_pretty(&brief)?);
        }
        BriefAction::Generate => {
            let now = Utc::now();
            let window = Duration::days(aggregator.policy().window_days as i64);
            let checkins = db.checkins_since(profile.id, now - window)?;
            let sessions = db.sessions_since(profile.id, now - Duration::days(14))?;
            let prior = db.latest_brief(profile.id)?;
            let inputs = BriefInputs {
                checkins: &checkins,
                sessions: &sessions,
                prior_tier: prior.map(|b| b.insight_tier),
                completed_viewed_weeks: db.completed_viewed_weeks(profile.id)?,
            };
            let brief = aggregator.aggregate(profile.id, &inputs, now.date_naive(), now);
            db.insert_brief(&brief)?;
            println!("{}", serde_json::to_string_pretty(&brief.generated_event())?);
        }
        BriefAction::Read => {
            let Some(mut brief) = db.latest_brief(profile.id)? else {
                return Err("no brief generated yet".into());
            };
            match brief.mark_read(Utc::now()) {
                Some(event) => {
                    db.mark_brief_read(brief.id)?;
                    println!("{}", serde_json::to_string_pretty(&event)?);
                }
                None => println!("already read"),
            }
        }
        BriefAction::Intercept => {
            let latest = db.latest_brief(profile.id)?;
            let weeks = db.completed_viewed_weeks(profile.id)?;
            let show =
                aggregator.monday_intercept(Utc::now().date_naive(), weeks, latest.as_ref());
            println!("{show}");
        }
    }
    Ok(())
}
