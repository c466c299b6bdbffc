use clap::Subcommand;
use serde::Serialize;

use focusroom_core::ledger::Dashboard;
use focusroom_core::todo::TodoCounts;
use focusroom_core::StatsRange;

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum StatsAction {
    /// Minutes logged today
    Today,
    /// Minutes per day for the last seven days
    Week,
    /// Totals for a range: week, month or all
    Range {
        #[arg(default_value = "week")]
        range: String,
    },
    /// Today, goal progress, streak, week and recent sessions
    Dashboard,
    /// Set the daily goal in minutes
    Goal {
        minutes: u32,
    },
}

#[derive(Serialize)]
struct DashboardView {
    #[serde(flatten)]
    dashboard: Dashboard,
    todos: TodoCounts,
}

pub fn run(action: StatsAction) -> CliResult {
    let ctx = Context::open()?;
    let mut ledger = ctx.ledger();

    match action {
        StatsAction::Today => {
            let minutes = ledger.today_minutes()?;
            print_json(&serde_json::json!({ "today_minutes": minutes }))?;
        }
        StatsAction::Week => {
            print_json(&ledger.weekly()?)?;
        }
        StatsAction::Range { range } => {
            let range: StatsRange = range.parse()?;
            print_json(&ledger.summary(range)?)?;
        }
        StatsAction::Dashboard => {
            let view = DashboardView {
                dashboard: ledger.dashboard()?,
                todos: ctx.todos().counts()?,
            };
            print_json(&view)?;
        }
        StatsAction::Goal { minutes } => {
            ledger.set_daily_goal(minutes)?;
            println!("daily goal set to {minutes} minutes");
        }
    }
    Ok(())
}
