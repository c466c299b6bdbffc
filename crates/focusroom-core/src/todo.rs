//! Per-user todo list stored in the `todos` collection.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::clock::Clock;
use crate::error::{CoreError, Result, ValidationError};
use crate::identity::{self, Identity};
use crate::storage::{
    Document, DocumentStore, DocumentStoreExt, Filter, Subscription, TODOS,
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    #[default]
    Study,
    Work,
    Personal,
    Other,
}

impl Category {
    pub fn as_str(self) -> &'static str {
        match self {
            Category::Study => "study",
            Category::Work => "work",
            Category::Personal => "personal",
            Category::Other => "other",
        }
    }
}

impl FromStr for Category {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "study" => Ok(Category::Study),
            "work" => Ok(Category::Work),
            "personal" => Ok(Category::Personal),
            "other" => Ok(Category::Other),
            other => Err(ValidationError::InvalidValue {
                field: "category".into(),
                value: other.into(),
            }),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Low => "low",
            Priority::Medium => "medium",
            Priority::High => "high",
        }
    }
}

impl FromStr for Priority {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Priority::Low),
            "medium" => Ok(Priority::Medium),
            "high" => Ok(Priority::High),
            other => Err(ValidationError::InvalidValue {
                field: "priority".into(),
                value: other.into(),
            }),
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn default_estimate() -> u32 {
    1
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Todo {
    pub id: String,
    pub user_id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: Category,
    #[serde(default)]
    pub priority: Priority,
    #[serde(default)]
    pub due_date: Option<NaiveDate>,
    #[serde(default)]
    pub completed: bool,
    #[serde(default = "default_estimate")]
    pub pomodoros_estimated: u32,
    #[serde(default)]
    pub pomodoros_completed: u32,
    pub created_at: DateTime<Utc>,
}

/// Fields for a new todo. Only the title is required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TodoDraft {
    pub title: String,
    pub description: String,
    pub category: Category,
    pub priority: Priority,
    pub due_date: Option<NaiveDate>,
    pub pomodoros_estimated: u32,
}

impl TodoDraft {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            category: Category::default(),
            priority: Priority::default(),
            due_date: None,
            pomodoros_estimated: default_estimate(),
        }
    }
}

/// Partial update. `None` leaves a field unchanged; `due_date: Some(None)`
/// clears the due date.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TodoPatch {
    pub title: Option<String>,
    pub description: Option<String>,
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub due_date: Option<Option<NaiveDate>>,
    pub pomodoros_estimated: Option<u32>,
}

/// Narrows [`TodoList::list`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TodoQuery {
    pub category: Option<Category>,
    pub priority: Option<Priority>,
    pub completed: Option<bool>,
}

impl TodoQuery {
    fn matches(&self, todo: &Todo) -> bool {
        self.category.map_or(true, |c| todo.category == c)
            && self.priority.map_or(true, |p| todo.priority == p)
            && self.completed.map_or(true, |c| todo.completed == c)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct TodoCounts {
    pub pending: usize,
    pub completed: usize,
}

fn validate_title(title: &str) -> Result<String, ValidationError> {
    let title = title.trim();
    if title.is_empty() {
        return Err(ValidationError::EmptyField("title".into()));
    }
    Ok(title.to_string())
}

fn validate_estimate(n: u32) -> Result<u32, ValidationError> {
    if n == 0 {
        return Err(ValidationError::OutOfRange {
            field: "pomodorosEstimated".into(),
            min: 1,
            max: u32::MAX,
            value: n,
        });
    }
    Ok(n)
}

pub struct TodoList<S> {
    store: S,
    clock: Arc<dyn Clock>,
    identity: Option<Identity>,
}

impl<S: DocumentStore> TodoList<S> {
    pub fn new(store: S, clock: Arc<dyn Clock>, identity: Option<Identity>) -> Self {
        Self {
            store,
            clock,
            identity,
        }
    }

    fn user_id(&self) -> Result<&str> {
        Ok(identity::require(self.identity.as_ref())?.user_id())
    }

    pub fn create(&self, draft: TodoDraft) -> Result<Todo> {
        let user_id = self.user_id()?;
        let todo = Todo {
            id: format!("todo_{}", Uuid::new_v4().simple()),
            user_id: user_id.to_string(),
            title: validate_title(&draft.title)?,
            description: draft.description.trim().to_string(),
            category: draft.category,
            priority: draft.priority,
            due_date: draft.due_date,
            completed: false,
            pomodoros_estimated: validate_estimate(draft.pomodoros_estimated)?,
            pomodoros_completed: 0,
            created_at: self.clock.now(),
        };
        self.store.put_as(TODOS, &todo.id, &todo)?;
        tracing::debug!(todo = %todo.id, "todo created");
        Ok(todo)
    }

    /// The user's todos matching `query`, oldest first.
    pub fn list(&self, query: &TodoQuery) -> Result<Vec<Todo>> {
        let user_id = self.user_id()?;
        let mut todos: Vec<Todo> = self.store.query_as(TODOS, &Filter::eq("userId", user_id))?;
        todos.retain(|t| query.matches(t));
        todos.sort_by_key(|t| t.created_at);
        Ok(todos)
    }

    /// A todo owned by the user.
    ///
    /// # Errors
    /// `NotFound` when the id is unknown or belongs to someone else.
    pub fn get(&self, id: &str) -> Result<Todo> {
        let user_id = self.user_id()?;
        self.store
            .get_as::<Todo>(TODOS, id)?
            .filter(|t| t.user_id == user_id)
            .ok_or_else(|| not_found(id))
    }

    pub fn toggle(&self, id: &str) -> Result<Todo> {
        self.modify(id, |t| {
            t.completed = !t.completed;
            Ok(())
        })
    }

    pub fn update(&self, id: &str, patch: TodoPatch) -> Result<Todo> {
        self.modify(id, |t| {
            if let Some(title) = patch.title {
                t.title = validate_title(&title)?;
            }
            if let Some(description) = patch.description {
                t.description = description.trim().to_string();
            }
            if let Some(category) = patch.category {
                t.category = category;
            }
            if let Some(priority) = patch.priority {
                t.priority = priority;
            }
            if let Some(due) = patch.due_date {
                t.due_date = due;
            }
            if let Some(n) = patch.pomodoros_estimated {
                t.pomodoros_estimated = validate_estimate(n)?;
            }
            Ok(())
        })
    }

    /// Count one finished work session toward a todo.
    pub fn add_pomodoro(&self, id: &str) -> Result<Todo> {
        self.modify(id, |t| {
            t.pomodoros_completed = t.pomodoros_completed.saturating_add(1);
            Ok(())
        })
    }

    pub fn delete(&self, id: &str) -> Result<()> {
        self.get(id)?;
        if !self.store.delete(TODOS, id)? {
            return Err(not_found(id));
        }
        tracing::debug!(todo = id, "todo deleted");
        Ok(())
    }

    pub fn counts(&self) -> Result<TodoCounts> {
        let todos = self.list(&TodoQuery::default())?;
        let completed = todos.iter().filter(|t| t.completed).count();
        Ok(TodoCounts {
            pending: todos.len() - completed,
            completed,
        })
    }

    /// Watch the user's todos, oldest first.
    pub fn subscribe<F>(&self, callback: F) -> Result<Subscription>
    where
        F: Fn(Vec<Todo>) + Send + Sync + 'static,
    {
        let user_id = self.user_id()?;
        let sub = self.store.subscribe(
            TODOS,
            Filter::eq("userId", user_id),
            Arc::new(move |docs: &[Document]| {
                let mut todos: Vec<Todo> = docs
                    .iter()
                    .filter_map(|d| serde_json::from_value(d.clone()).ok())
                    .collect();
                todos.sort_by_key(|t| t.created_at);
                callback(todos);
            }),
        )?;
        Ok(sub)
    }

    fn modify<F>(&self, id: &str, edit: F) -> Result<Todo>
    where
        F: FnOnce(&mut Todo) -> Result<(), ValidationError>,
    {
        let mut todo = self.get(id)?;
        edit(&mut todo)?;
        self.store.put_as(TODOS, &todo.id, &todo)?;
        Ok(todo)
    }
}

fn not_found(id: &str) -> CoreError {
    CoreError::NotFound {
        collection: TODOS.into(),
        id: id.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::storage::MemoryStore;
    use chrono::TimeZone;

    fn list_for(store: &MemoryStore, clock: &ManualClock, user: &str) -> TodoList<MemoryStore> {
        TodoList::new(store.clone(), Arc::new(clock.clone()), Identity::new(user))
    }

    fn setup() -> (TodoList<MemoryStore>, MemoryStore, ManualClock) {
        let store = MemoryStore::new();
        let clock = ManualClock::new(Utc.with_ymd_and_hms(2024, 6, 10, 9, 0, 0).unwrap());
        (list_for(&store, &clock, "alice"), store, clock)
    }

    #[test]
    fn create_applies_defaults() {
        let (todos, store, clock) = setup();
        let t = todos.create(TodoDraft::new("  Read chapter 3 ")).unwrap();
        assert_eq!(t.title, "Read chapter 3");
        assert_eq!(t.category, Category::Study);
        assert_eq!(t.priority, Priority::Medium);
        assert_eq!(t.pomodoros_estimated, 1);
        assert!(!t.completed);
        assert_eq!(t.created_at, clock.now());
        assert_eq!(store.len(TODOS), 1);
    }

    #[test]
    fn blank_title_rejected() {
        let (todos, store, _) = setup();
        assert!(matches!(
            todos.create(TodoDraft::new("   ")),
            Err(CoreError::Validation(ValidationError::EmptyField(_)))
        ));
        assert_eq!(store.len(TODOS), 0);
    }

    #[test]
    fn list_filters_and_orders() {
        let (todos, _, clock) = setup();
        let mut draft = TodoDraft::new("Report");
        draft.category = Category::Work;
        draft.priority = Priority::High;
        todos.create(draft).unwrap();
        clock.advance_secs(60);
        let flash = todos.create(TodoDraft::new("Flashcards")).unwrap();
        todos.toggle(&flash.id).unwrap();

        let all = todos.list(&TodoQuery::default()).unwrap();
        assert_eq!(all.iter().map(|t| t.title.as_str()).collect::<Vec<_>>(), ["Report", "Flashcards"]);

        let work = todos
            .list(&TodoQuery {
                category: Some(Category::Work),
                ..TodoQuery::default()
            })
            .unwrap();
        assert_eq!(work.len(), 1);

        let done = todos
            .list(&TodoQuery {
                completed: Some(true),
                ..TodoQuery::default()
            })
            .unwrap();
        assert_eq!(done[0].id, flash.id);
        assert_eq!(todos.counts().unwrap(), TodoCounts { pending: 1, completed: 1 });
    }

    #[test]
    fn toggle_flips_back() {
        let (todos, _, _) = setup();
        let t = todos.create(TodoDraft::new("x")).unwrap();
        assert!(todos.toggle(&t.id).unwrap().completed);
        assert!(!todos.toggle(&t.id).unwrap().completed);
    }

    #[test]
    fn update_patches_selected_fields() {
        let (todos, _, _) = setup();
        let mut draft = TodoDraft::new("Essay");
        draft.due_date = NaiveDate::from_ymd_opt(2024, 6, 20);
        let t = todos.create(draft).unwrap();

        let updated = todos
            .update(
                &t.id,
                TodoPatch {
                    priority: Some(Priority::Low),
                    due_date: Some(None),
                    pomodoros_estimated: Some(4),
                    ..TodoPatch::default()
                },
            )
            .unwrap();
        assert_eq!(updated.title, "Essay");
        assert_eq!(updated.priority, Priority::Low);
        assert_eq!(updated.due_date, None);
        assert_eq!(updated.pomodoros_estimated, 4);

        let bad = todos.update(
            &t.id,
            TodoPatch {
                title: Some(String::new()),
                ..TodoPatch::default()
            },
        );
        assert!(bad.is_err());
        assert_eq!(todos.get(&t.id).unwrap(), updated);
    }

    #[test]
    fn other_users_todos_are_not_found() {
        let (alice, store, clock) = setup();
        let t = alice.create(TodoDraft::new("mine")).unwrap();
        let bob = list_for(&store, &clock, "bob");
        assert!(matches!(bob.delete(&t.id), Err(CoreError::NotFound { .. })));
        assert!(matches!(bob.toggle(&t.id), Err(CoreError::NotFound { .. })));
        assert!(bob.list(&TodoQuery::default()).unwrap().is_empty());

        alice.delete(&t.id).unwrap();
        assert!(matches!(alice.delete(&t.id), Err(CoreError::NotFound { .. })));
    }

    #[test]
    fn pomodoros_accumulate() {
        let (todos, _, _) = setup();
        let t = todos.create(TodoDraft::new("x")).unwrap();
        todos.add_pomodoro(&t.id).unwrap();
        assert_eq!(todos.add_pomodoro(&t.id).unwrap().pomodoros_completed, 2);
    }

    #[test]
    fn signed_out_is_rejected() {
        let store = MemoryStore::new();
        let todos = TodoList::new(store, Arc::new(ManualClock::new(Utc::now())), None);
        assert!(matches!(
            todos.create(TodoDraft::new("x")),
            Err(CoreError::Unauthenticated)
        ));
    }

    #[test]
    fn parse_labels() {
        assert_eq!("personal".parse::<Category>().unwrap(), Category::Personal);
        assert_eq!("high".parse::<Priority>().unwrap(), Priority::High);
        assert!("urgent".parse::<Priority>().is_err());
    }
}
