use chrono::NaiveDate;
use clap::Subcommand;
use focusroom_core::todo::{Category, Priority, TodoDraft, TodoPatch, TodoQuery};

use crate::common::{print_json, CliResult, Context};

#[derive(Subcommand)]
pub enum TodoAction {
    /// Create a todo
    Add {
        title: String,
        #[arg(long, default_value = "")]
        description: String,
        /// study, work, personal or other
        #[arg(long, default_value = "study")]
        category: Category,
        /// low, medium or high
        #[arg(long, default_value = "medium")]
        priority: Priority,
        /// Due date (YYYY-MM-DD)
        #[arg(long)]
        due: Option<NaiveDate>,
        /// Estimated pomodoros
        #[arg(long, default_value_t = 1)]
        estimate: u32,
    },
    /// List todos
    List {
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Only pending todos
        #[arg(long, conflicts_with = "done")]
        pending: bool,
        /// Only completed todos
        #[arg(long)]
        done: bool,
    },
    /// Toggle a todo's completed flag
    Toggle { id: String },
    /// Update fields of a todo
    Update {
        id: String,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        description: Option<String>,
        #[arg(long)]
        category: Option<Category>,
        #[arg(long)]
        priority: Option<Priority>,
        /// Due date (YYYY-MM-DD)
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,
        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
        #[arg(long)]
        estimate: Option<u32>,
    },
    /// Count one finished pomodoro toward a todo
    Pomodoro { id: String },
    /// Delete a todo
    Delete { id: String },
    /// Pending and completed counts
    Counts,
}

pub fn run(action: TodoAction) -> CliResult {
    let ctx = Context::open()?;
    let todos = ctx.todos();

    match action {
        TodoAction::Add {
            title,
            description,
            category,
            priority,
            due,
            estimate,
        } => {
            let draft = TodoDraft {
                description,
                category,
                priority,
                due_date: due,
                pomodoros_estimated: estimate,
                ..TodoDraft::new(title)
            };
            print_json(&todos.create(draft)?)?;
        }
        TodoAction::List {
            category,
            priority,
            pending,
            done,
        } => {
            let query = TodoQuery {
                category,
                priority,
                completed: match (pending, done) {
                    (true, _) => Some(false),
                    (_, true) => Some(true),
                    _ => None,
                },
            };
            print_json(&todos.list(&query)?)?;
        }
        TodoAction::Toggle { id } => print_json(&todos.toggle(&id)?)?,
        TodoAction::Update {
            id,
            title,
            description,
            category,
            priority,
            due,
            clear_due,
            estimate,
        } => {
            let patch = TodoPatch {
                title,
                description,
                category,
                priority,
                due_date: if clear_due { Some(None) } else { due.map(Some) },
                pomodoros_estimated: estimate,
            };
            print_json(&todos.update(&id, patch)?)?;
        }
        TodoAction::Pomodoro { id } => print_json(&todos.add_pomodoro(&id)?)?,
        TodoAction::Delete { id } => {
            todos.delete(&id)?;
            println!("deleted todo {id}");
        }
        TodoAction::Counts => print_json(&todos.counts()?)?,
    }
    Ok(())
}
