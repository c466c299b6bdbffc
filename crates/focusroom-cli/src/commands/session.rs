use clap::Subcommand;
use focusroom_core::TimerMode;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum SessionAction {
    /// List recorded sessions, oldest first
    List {
        /// Only the N most recent, newest first
        #[arg(long)]
        recent: Option<usize>,
    },
    /// Record a session manually
    Log {
        /// Duration in minutes
        minutes: u32,
        /// Preset id to attribute the session to
        #[arg(long, default_value = "classic")]
        preset: String,
    },
    /// Delete a session
    Delete {
        /// Session id
        id: String,
    },
}

pub fn run(action: SessionAction) -> CliResult {
    let ctx = Context::open()?;
    let mut ledger = ctx.ledger();

    match action {
        SessionAction::List { recent } => match recent {
            Some(n) => print_json(&ledger.recent(n)?)?,
            None => print_json(&ledger.sessions()?)?,
        },
        SessionAction::Log { minutes, preset } => {
            let outcome = ledger.record_session(minutes, TimerMode::Work, &preset)?;
            for failure in &outcome.failures {
                eprintln!("warning: {failure}");
            }
            print_json(&outcome.record)?;
            eprintln!("streak: {} day(s)", outcome.streak_days);
        }
        SessionAction::Delete { id } => {
            ledger.delete_session(&id)?;
            println!("deleted session {id}");
        }
    }
    Ok(())
}
