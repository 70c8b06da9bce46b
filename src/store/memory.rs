//! In-memory store implementation.
//!
//! Records live in insertion-ordered vectors behind `tokio::sync::RwLock`s. Used by the
//! test suite and when the server starts without `DATABASE_URL`.

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{Page, StatusCounts, TaskFilter, TaskStore, UserStore};
use crate::error::AppError;
use crate::models::{NewUser, Role, Task, User, UserChanges, UserSummary};

#[derive(Debug, Default)]
pub struct MemoryStore {
    users: RwLock<Vec<User>>,
    tasks: RwLock<Vec<Task>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn paginate<T>(items: impl Iterator<Item = T>, page: Page) -> Vec<T> {
    items
        .skip(page.offset().max(0) as usize)
        .take(page.limit.max(0) as usize)
        .collect()
}

#[async_trait]
impl UserStore for MemoryStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(AppError::Conflict("Email already registered".into()));
        }
        let user = new_user.into_user();
        users.push(user.clone());
        Ok(user)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().find(|u| u.email == email).cloned())
    }

    async fn summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        let users = self.users.read().await;
        Ok(users
            .iter()
            .filter(|u| ids.contains(&u.id))
            .map(User::summary)
            .collect())
    }

    async fn list_members(&self, page: Page) -> Result<Vec<User>, AppError> {
        let users = self.users.read().await;
        Ok(paginate(
            users.iter().filter(|u| u.role == Role::Member).cloned(),
            page,
        ))
    }

    async fn count_members(&self) -> Result<i64, AppError> {
        let users = self.users.read().await;
        Ok(users.iter().filter(|u| u.role == Role::Member).count() as i64)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        if let Some(email) = &changes.email {
            if users.iter().any(|u| &u.email == email && u.id != id) {
                return Err(AppError::Conflict("Email already registered".into()));
            }
        }
        Ok(users.iter_mut().find(|u| u.id == id).map(|user| {
            changes.apply(user);
            user.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let mut users = self.users.write().await;
        Ok(users
            .iter()
            .position(|u| u.id == id)
            .map(|index| users.remove(index)))
    }
}

#[async_trait]
impl TaskStore for MemoryStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let mut tasks = self.tasks.write().await;
        tasks.push(task.clone());
        Ok(task)
    }

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().find(|t| t.id == id).cloned())
    }

    async fn list(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, AppError> {
        let tasks = self.tasks.read().await;
        // Newest first; later inserts win timestamp ties.
        let mut matching: Vec<&Task> = tasks.iter().rev().filter(|t| filter.matches(t)).collect();
        matching.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(paginate(matching.into_iter().cloned(), page))
    }

    async fn count(&self, filter: TaskFilter) -> Result<i64, AppError> {
        let tasks = self.tasks.read().await;
        Ok(tasks.iter().filter(|t| filter.matches(t)).count() as i64)
    }

    async fn status_counts(&self, filter: TaskFilter) -> Result<StatusCounts, AppError> {
        let tasks = self.tasks.read().await;
        let mut counts = StatusCounts::default();
        for task in tasks.iter().filter(|t| filter.matches(t)) {
            counts.add(task.status, 1);
        }
        Ok(counts)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let mut tasks = self.tasks.write().await;
        Ok(tasks.iter_mut().find(|t| t.id == task.id).map(|stored| {
            *stored = Task {
                created_at: stored.created_at,
                created_by: stored.created_by,
                updated_at: Utc::now(),
                ..task.clone()
            };
            stored.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut tasks = self.tasks.write().await;
        let before = tasks.len();
        tasks.retain(|t| t.id != id);
        Ok(tasks.len() != before)
    }
}
