use clap::Subcommand;
use focusroom_core::Config;

use crate::common::{print_json, CliResult};

/// Keys: `timer.tick_interval_ms` (100..=1000), `timer.default_preset`,
/// `timer.long_break_interval`, `timer.auto_start_next`,
/// `notifications.enabled`, `account.user_id`, `storage.backend`
/// (sqlite or memory) and `storage.path`.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Print one value, e.g. `config get timer.default_preset`
    Get { key: String },
    /// Validate and save one value; "null" clears `account.user_id` or
    /// `storage.path`
    Set { key: String, value: String },
    /// Print the whole configuration as JSON
    List,
    /// Overwrite the config file with defaults (signs the user out)
    Reset,
    /// Print where config.toml lives (honours FOCUSROOM_ENV=dev)
    Path,
}

pub fn run(action: ConfigAction) -> CliResult {
    if let ConfigAction::Reset = action {
        Config::default().save()?;
        println!("config reset");
        return Ok(());
    }
    if let ConfigAction::Path = action {
        println!("{}", Config::path()?.display());
        return Ok(());
    }

    let mut config = Config::load()?;
    match action {
        ConfigAction::Get { key } => {
            let value = config.get(&key).ok_or_else(|| format!("unknown key: {key}"))?;
            println!("{value}");
        }
        ConfigAction::Set { key, value } => {
            config.set(&key, &value)?;
            config.save()?;
            tracing::debug!(%key, %value, "config updated");
            println!("ok");
        }
        ConfigAction::List => print_json(&config)?,
        ConfigAction::Reset | ConfigAction::Path => {}
    }
    Ok(())
}
