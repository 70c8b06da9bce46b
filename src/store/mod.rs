//! Persistence ports.
//!
//! Handlers only see the `UserStore` and `TaskStore` traits. `postgres::PgStore` is the
//! production implementation; `memory::MemoryStore` backs tests and database-less runs.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::error::AppError;
use crate::models::{NewUser, Task, TaskStatus, User, UserChanges, UserSummary};

pub use memory::MemoryStore;
pub use postgres::PgStore;

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    5
}

/// `?page=&limit=` pagination parameters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Validate)]
pub struct Page {
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: i64,
    #[serde(default = "default_limit")]
    #[validate(range(min = 1, max = 100, message = "limit must be between 1 and 100"))]
    pub limit: i64,
}

impl Default for Page {
    fn default() -> Self {
        Self {
            page: default_page(),
            limit: default_limit(),
        }
    }
}

impl Page {
    pub fn new(page: i64, limit: i64) -> Self {
        Self { page, limit }
    }

    /// Rows to skip; saturates instead of overflowing for huge page numbers.
    pub fn offset(&self) -> i64 {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }
}

/// Task selection shared by listing, counting and reporting queries.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TaskFilter {
    /// Only tasks whose `assigned_to` contains this user.
    pub assignee: Option<Uuid>,
    pub status: Option<TaskStatus>,
    /// Only tasks due strictly before this instant that are not `Completed`.
    pub overdue_at: Option<DateTime<Utc>>,
}

impl TaskFilter {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn assigned_to(user_id: Uuid) -> Self {
        Self {
            assignee: Some(user_id),
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: Option<TaskStatus>) -> Self {
        self.status = status;
        self
    }

    pub fn overdue_at(mut self, now: DateTime<Utc>) -> Self {
        self.overdue_at = Some(now);
        self
    }

    pub fn matches(&self, task: &Task) -> bool {
        if let Some(user_id) = self.assignee {
            if !task.is_assigned_to(user_id) {
                return false;
            }
        }
        if let Some(status) = self.status {
            if task.status != status {
                return false;
            }
        }
        if let Some(now) = self.overdue_at {
            let overdue = task.due_date.map_or(false, |due| due < now);
            if !overdue || task.status == TaskStatus::Completed {
                return false;
            }
        }
        true
    }
}

/// Number of tasks per status.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusCounts {
    #[serde(rename = "Pending")]
    pub pending: i64,
    #[serde(rename = "In Progress")]
    pub in_progress: i64,
    #[serde(rename = "Completed")]
    pub completed: i64,
}

impl StatusCounts {
    pub fn add(&mut self, status: TaskStatus, count: i64) {
        match status {
            TaskStatus::Pending => self.pending += count,
            TaskStatus::InProgress => self.in_progress += count,
            TaskStatus::Completed => self.completed += count,
        }
    }

    pub fn total(&self) -> i64 {
        self.pending + self.in_progress + self.completed
    }
}

#[async_trait]
pub trait UserStore: Send + Sync {
    /// Inserts a user. Fails with `Conflict` when the email is taken.
    async fn create(&self, new_user: NewUser) -> Result<User, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError>;

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError>;

    /// Summaries for the given ids; unknown ids are skipped.
    async fn summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError>;

    /// Members only, in insertion order.
    async fn list_members(&self, page: Page) -> Result<Vec<User>, AppError>;

    async fn count_members(&self) -> Result<i64, AppError>;

    /// Applies `changes`; `None` when the user does not exist.
    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError>;

    /// Removes the user and returns the deleted record.
    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError>;
}

#[async_trait]
pub trait TaskStore: Send + Sync {
    async fn create(&self, task: Task) -> Result<Task, AppError>;

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError>;

    /// Matching tasks, newest first.
    async fn list(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, AppError>;

    async fn count(&self, filter: TaskFilter) -> Result<i64, AppError>;

    /// Per-status counts over the filter, in one pass.
    async fn status_counts(&self, filter: TaskFilter) -> Result<StatusCounts, AppError>;

    /// Writes every mutable field of `task`; `None` when the task no longer exists.
    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError>;

    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}
