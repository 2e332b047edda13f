use chrono::Utc;
use clap::Subcommand;
use morrow_core::{Database, ProtocolCatalog, ProtocolProgression};

use super::common::load_or_create_profile;

#[derive(Subcommand)]
pub enum ProtocolAction {
    /// Show the active protocol's current day
    Show,
    /// Complete the current action
    Complete { action_id: String },
    /// Skip the current action
    Skip { action_id: String },
}

pub fn run(action: ProtocolAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let profile = load_or_create_profile(&db)?;
    let catalog = ProtocolCatalog::builtin();
    let progression = ProtocolProgression::new(&catalog);

    let Some(mut protocol) = db.active_protocol(profile.id)? else {
        return Err("no active recovery protocol".into());
    };
    let sessions = db.sessions_for(protocol.id)?;

    match action {
        ProtocolAction::Show => {
            let view = progression.day_view(&protocol, &sessions, profile.entitlement)?;
            println!("{}", serde_json::to_string_pretty(&view)?);
        }
        ProtocolAction::Complete { action_id } => {
            let transition = progression.complete(
                &mut protocol,
                &sessions,
                profile.entitlement,
                &action_id,
                Utc::now(),
            )?;
            db.insert_session(&transition.session)?;
            db.update_protocol(&protocol)?;
            println!("{}", serde_json::to_string_pretty(&transition.events)?);
        }
        ProtocolAction::Skip { action_id } => {
            let transition = progression.skip(
                &mut protocol,
                &sessions,
                profile.entitlement,
                &action_id,
                Utc::now(),
            )?;
            db.insert_session(&transition.session)?;
            db.update_protocol(&protocol)?;
            println!("{}", serde_json::to_string_pretty(&transition.events)?);
        }
    }
    Ok(())
}
