use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use serde::{de, Deserialize, Deserializer, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::user::UserSummary;
use crate::progress;

/// Represents the priority of a task.
/// Corresponds to the `task_priority` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, sqlx::Type)]
#[sqlx(type_name = "task_priority")]
pub enum TaskPriority {
    Low,
    #[default]
    Medium,
    High,
}

/// Lifecycle state of a task, normally derived from checklist progress.
/// Corresponds to the `task_status` SQL enum.
#[derive(Debug, Default, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Hash, sqlx::Type)]
#[sqlx(type_name = "task_status")]
pub enum TaskStatus {
    #[default]
    Pending,
    #[serde(rename = "In Progress")]
    #[sqlx(rename = "In Progress")]
    InProgress,
    Completed,
}

impl TaskStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TaskStatus::Pending => "Pending",
            TaskStatus::InProgress => "In Progress",
            TaskStatus::Completed => "Completed",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single checklist entry; the unit of progress tracking.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ChecklistItem {
    pub fn new(text: impl Into<String>, completed: bool) -> Self {
        Self {
            text: text.into(),
            completed,
        }
    }
}

/// A task record as held by the stores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Task {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Vec<Uuid>,
    pub created_by: Uuid,
    pub attachments: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Payload for `POST /api/tasks`.
#[derive(Debug, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateTaskInput {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: String,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    /// Explicit status; goes through the status override after checklist derivation.
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    #[validate(required(message = "Due date is required"))]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub assigned_to: Vec<Uuid>,
    #[serde(default)]
    pub attachments: Vec<String>,
    #[serde(default)]
    #[validate(custom = "validate_checklist")]
    pub todo_checklist: Vec<ChecklistItem>,
}

/// Payload for `PATCH /api/tasks/{id}`. Absent fields are left untouched.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateTaskInput {
    #[validate(length(min = 3, max = 200, message = "Title must be between 3 and 200 characters"))]
    pub title: Option<String>,
    #[validate(length(max = 500, message = "Description cannot be more than 500 characters"))]
    pub description: Option<String>,
    pub priority: Option<TaskPriority>,
    pub status: Option<TaskStatus>,
    #[serde(default, deserialize_with = "deserialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Option<Vec<Uuid>>,
    pub attachments: Option<Vec<String>>,
    #[validate(custom = "validate_checklist")]
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

/// Payload for `PATCH /api/tasks/status/{id}`.
#[derive(Debug, Default, Deserialize)]
pub struct StatusUpdateInput {
    pub status: Option<TaskStatus>,
}

/// Payload for `PATCH /api/tasks/checklist/{id}`.
#[derive(Debug, Default, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ChecklistUpdateInput {
    #[validate(custom = "validate_checklist")]
    pub todo_checklist: Option<Vec<ChecklistItem>>,
}

/// Task as returned by the API: user references populated, checklist counters attached.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub priority: TaskPriority,
    pub status: TaskStatus,
    pub due_date: Option<DateTime<Utc>>,
    pub assigned_to: Vec<UserSummary>,
    pub created_by: Option<UserSummary>,
    pub attachments: Vec<String>,
    pub todo_checklist: Vec<ChecklistItem>,
    pub progress: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub todo_count: usize,
    pub completed_todos: usize,
}

impl Task {
    /// Creates a task from validated input. Progress and status are derived from the
    /// checklist, then an explicit status (if any) is applied on top.
    pub fn new(input: CreateTaskInput, created_by: Uuid) -> Self {
        let now = Utc::now();
        let mut task = Self {
            id: Uuid::new_v4(),
            title: input.title,
            description: input.description,
            priority: input.priority.unwrap_or_default(),
            status: TaskStatus::Pending,
            due_date: input.due_date,
            assigned_to: dedup_ids(input.assigned_to),
            created_by,
            attachments: input.attachments,
            todo_checklist: input.todo_checklist,
            progress: 0,
            created_at: now,
            updated_at: now,
        };
        task.recompute_progress();
        progress::apply_status_override(&mut task, input.status);
        task
    }

    /// Applies a partial update. A new checklist re-derives progress and status;
    /// an explicit status is applied last through the override path.
    pub fn apply_update(&mut self, input: UpdateTaskInput) {
        if let Some(title) = input.title {
            self.title = title;
        }
        if let Some(description) = input.description {
            self.description = Some(description);
        }
        if let Some(priority) = input.priority {
            self.priority = priority;
        }
        if let Some(due_date) = input.due_date {
            self.due_date = Some(due_date);
        }
        if let Some(assigned_to) = input.assigned_to {
            self.assigned_to = dedup_ids(assigned_to);
        }
        if let Some(attachments) = input.attachments {
            self.attachments = attachments;
        }
        if let Some(checklist) = input.todo_checklist {
            self.todo_checklist = checklist;
            self.recompute_progress();
        }
        progress::apply_status_override(self, input.status);
        self.updated_at = Utc::now();
    }

    /// Re-derives `progress` and `status` from the current checklist.
    pub fn recompute_progress(&mut self) {
        let derived = progress::derive_from_checklist(&self.todo_checklist);
        self.progress = derived.progress;
        self.status = derived.status;
    }

    pub fn is_assigned_to(&self, user_id: Uuid) -> bool {
        self.assigned_to.contains(&user_id)
    }

    pub fn completed_todos(&self) -> usize {
        self.todo_checklist.iter().filter(|item| item.completed).count()
    }

    /// Ids of every user this task references, for bulk lookups.
    pub fn referenced_users(&self) -> impl Iterator<Item = Uuid> + '_ {
        self.assigned_to
            .iter()
            .copied()
            .chain(std::iter::once(self.created_by))
    }
}

impl TaskView {
    /// Builds the response view. Ids missing from `users` (deleted accounts) are dropped.
    pub fn new(task: Task, users: &HashMap<Uuid, UserSummary>) -> Self {
        let todo_count = task.todo_checklist.len();
        let completed_todos = task.completed_todos();
        Self {
            id: task.id,
            title: task.title,
            description: task.description,
            priority: task.priority,
            status: task.status,
            due_date: task.due_date,
            assigned_to: task
                .assigned_to
                .iter()
                .filter_map(|id| users.get(id).cloned())
                .collect(),
            created_by: users.get(&task.created_by).cloned(),
            attachments: task.attachments,
            todo_checklist: task.todo_checklist,
            progress: task.progress,
            created_at: task.created_at,
            updated_at: task.updated_at,
            todo_count,
            completed_todos,
        }
    }
}

fn dedup_ids(ids: Vec<Uuid>) -> Vec<Uuid> {
    let mut seen = Vec::with_capacity(ids.len());
    for id in ids {
        if !seen.contains(&id) {
            seen.push(id);
        }
    }
    seen
}

fn validate_checklist(items: &[ChecklistItem]) -> Result<(), ValidationError> {
    if items.iter().any(|item| item.text.trim().is_empty()) {
        let mut err = ValidationError::new("checklist_text");
        err.message = Some("Todo item text is required".into());
        return Err(err);
    }
    Ok(())
}

/// Accepts either a full RFC 3339 timestamp or a bare `YYYY-MM-DD` date (midnight UTC).
pub fn parse_due_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if let Ok(ts) = DateTime::parse_from_rfc3339(raw) {
        return Some(ts.with_timezone(&Utc));
    }
    NaiveDate::parse_from_str(raw, "%Y-%m-%d")
        .ok()
        .and_then(|date| date.and_hms_opt(0, 0, 0))
        .map(|naive| Utc.from_utc_datetime(&naive))
}

fn deserialize_due_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    raw.map(|value| {
        parse_due_date(&value).ok_or_else(|| {
            de::Error::custom(format!(
                "invalid dueDate `{value}`, expected YYYY-MM-DD or an RFC 3339 timestamp"
            ))
        })
    })
    .transpose()
}
