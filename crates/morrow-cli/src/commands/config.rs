use clap::Subcommand;
use morrow_core::Config;

#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show the current configuration
    Show,
    /// Set an aggregator policy value
    Set { key: String, value: u32 },
}

pub fn run(action: ConfigAction) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = Config::load()?;

    match action {
        ConfigAction::Show => {
            println!("{}", toml::to_string_pretty(&config)?);
        }
        ConfigAction::Set { key, value } => {
            let policy = &mut config.aggregator;
            match key.as_str() {
                "window_days" => policy.window_days = value,
                "weekday_high_threshold" => policy.weekday_high_threshold = value,
                "weekday_medium_threshold" => policy.weekday_medium_threshold = value,
                "min_history_checkins" => policy.min_history_checkins = value,
                "tier_advance_weeks" => policy.tier_advance_weeks = value,
                other => return Err(format!("unknown config key '{other}'").into()),
            }
            config.save()?;
            println!("{}", toml::to_string_pretty(&config)?);
        }
    }
    Ok(())
}
