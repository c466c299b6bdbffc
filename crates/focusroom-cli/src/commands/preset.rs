use clap::Subcommand;
use focusroom_core::Durations;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum PresetAction {
    /// List built-in and user presets
    List,
    /// Add a user preset
    Add {
        /// Display name
        name: String,
        /// Work minutes
        #[arg(long)]
        work: u32,
        /// Short break minutes
        #[arg(long)]
        short_break: u32,
        /// Long break minutes
        #[arg(long)]
        long_break: u32,
        /// Preset id (generated if omitted)
        #[arg(long)]
        id: Option<String>,
    },
    /// Remove a user preset
    Remove {
        /// Preset id
        id: String,
    },
}

pub fn run(action: PresetAction) -> CliResult {
    let ctx = Context::open()?;
    let mut ledger = ctx.ledger();

    match action {
        PresetAction::List => {
            let book = ledger.preset_book();
            print_json(&book.all())?;
        }
        PresetAction::Add {
            name,
            work,
            short_break,
            long_break,
            id,
        } => {
            let durations = Durations::new(work, short_break, long_break);
            let preset = ledger.add_preset(id.as_deref(), &name, durations)?;
            print_json(&preset)?;
        }
        PresetAction::Remove { id } => {
            let removed = ledger.remove_preset(&id)?;
            println!("removed preset {}", removed.id);
        }
    }
    Ok(())
}
