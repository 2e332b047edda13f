use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;

mod commands;

#[derive(Parser)]
#[command(name = "morrow-cli", version, about = "Morrow CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Declared condition management
    Conditions {
        #[command(subcommand)]
        action: commands::conditions::ConditionsAction,
    },
    /// Record a check-in
    Checkin {
        #[command(subcommand)]
        action: commands::checkin::CheckinAction,
    },
    /// Active recovery protocol
    Protocol {
        #[command(subcommand)]
        action: commands::protocol::ProtocolAction,
    },
    /// Weekly brief
    Brief {
        #[command(subcommand)]
        action: commands::brief::BriefAction,
    },
    /// Profile and entitlement
    Profile {
        #[command(subcommand)]
        action: commands::profile::ProfileAction,
    },
    /// Configuration management
    Config {
        #[command(subcommand)]
        action: commands::config::ConfigAction,
    },
    /// Generate shell completions
    Completions { shell: Shell },
}

fn main() {
    let cli = Cli::parse();
    let result = match cli.command {
        Commands::Conditions { action } => commands::conditions::run(action),
        Commands::Checkin { action } => commands::checkin::run(action),
        Commands::Protocol { action } => commands::protocol::run(action),
        Commands::Brief { action } => commands::brief::run(action),
        Commands::Profile { action } => commands::profile::run(action),
        Commands::Config { action } => commands::config::run(action),
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            clap_complete::generate(shell, &mut cmd, "morrow-cli", &mut std::io::stdout());
            Ok(())
        }
    };

    if let Err(e) = result {
        eprintln!("error: {e}");
        std::process::exit(1);
    }
}
