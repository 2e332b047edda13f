use clap::Subcommand;
use morrow_core::{Condition, Database};

use super::common::load_or_create_profile;

#[derive(Subcommand)]
pub enum ConditionsAction {
    /// Show declared conditions
    Show,
    /// Toggle a condition tag (gout, cholesterol, back_pain, unsure)
    Toggle { tag: String },
}

pub fn run(action: ConditionsAction) -> Result<(), Box<dyn std::error::Error>> {
    let db = Database::open()?;
    let mut profile = load_or_create_profile(&db)?;

    match action {
        ConditionsAction::Show => {
            println!("{}", serde_json::to_string_pretty(&profile.conditions)?);
        }
        ConditionsAction::Toggle { tag } => {
            let tag = Condition::from_name(&tag)
                .ok_or_else(|| format!("unknown condition tag '{tag}'"))?;
            profile.conditions.toggle(tag);
            db.upsert_profile(&profile)?;
            println!("{}", serde_json::to_string_pretty(&profile.conditions)?);
        }
    }
    Ok(())
}
