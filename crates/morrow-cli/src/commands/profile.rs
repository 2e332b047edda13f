use clap::Subcommand;
use morrow_core::{Database, Entitlement};

use super::common::load_or_create_profile;

#[derive(Subcommand)]
pub enum ProfileAction {
    /// Show the local profile
    Show,
    /// Set the entitlement tier (free, plus)
    Entitlement { tier: String },
}

pub fn run(action: ProfileAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut profile = load_or_create_profile(&db)?;

    match action {
        ProfileAction::Show => {
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
        ProfileAction::Entitlement { tier } => {
            profile.entitlement = match tier.as_str() {
                "free" => Entitlement::Free,
                "plus" => Entitlement::Plus,
                other => return Err(format!("unknown entitlement tier '{other}'").into()),
            };
            db.upsert_profile(&profile)?;
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }
    Ok(())
}
