//! Read-only aggregates for the dashboards and the member listing.

use chrono::{DateTime, Utc};
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Task, TaskPriority, TaskStatus, User};
use crate::store::{Page, TaskFilter, TaskStore, UserStore};

/// Number of tasks listed under `recentTasks`.
pub const RECENT_TASKS: i64 = 5;

/// Which tasks an aggregate covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    All,
    AssignedTo(Uuid),
}

impl Scope {
    pub fn filter(self) -> TaskFilter {
        match self {
            Scope::All => TaskFilter::all(),
            Scope::AssignedTo(user_id) => TaskFilter::assigned_to(user_id),
        }
    }
}

/// Compact projection used in `recentTasks`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentTask {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub title: String,
    pub status: TaskStatus,
    /// `YYYY-MM-DD`
    pub due_date: Option<String>,
    pub priority: TaskPriority,
}

impl From<Task> for RecentTask {
    fn from(task: Task) -> Self {
        Self {
            id: task.id,
            created_at: task.created_at,
            title: task.title,
            status: task.status,
            due_date: task.due_date.map(|due| due.format("%Y-%m-%d").to_string()),
            priority: task.priority,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardSummary {
    pub total_tasks: i64,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
    pub overdue_tasks: i64,
    pub recent_tasks: Vec<RecentTask>,
}

/// Builds the dashboard for `scope`.
///
/// Status counts come from one grouped query; the overdue count and the recent list
/// are separate reads, so the three parts are not a single snapshot.
pub async fn summary(
    tasks: &dyn TaskStore,
    scope: Scope,
    now: DateTime<Utc>,
) -> Result<DashboardSummary, AppError> {
    let filter = scope.filter();
    let (counts, overdue_tasks, recent) = futures::try_join!(
        tasks.status_counts(filter),
        tasks.count(filter.overdue_at(now)),
        tasks.list(filter, Page::new(1, RECENT_TASKS)),
    )?;

    Ok(DashboardSummary {
        total_tasks: counts.total(),
        pending_tasks: counts.pending,
        in_progress_tasks: counts.in_progress,
        completed_tasks: counts.completed,
        overdue_tasks,
        recent_tasks: recent.into_iter().map(RecentTask::from).collect(),
    })
}

/// A member plus the status breakdown of the tasks assigned to them.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberWorkload {
    #[serde(flatten)]
    pub user: User,
    pub pending_tasks: i64,
    pub in_progress_tasks: i64,
    pub completed_tasks: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemberPage {
    pub users: Vec<MemberWorkload>,
    pub page: i64,
    pub limit: i64,
    pub total_users: i64,
}

/// One page of members (insertion order) with their task counts.
pub async fn users_with_workload(
    users: &dyn UserStore,
    tasks: &dyn TaskStore,
    page: Page,
) -> Result<MemberPage, AppError> {
    let (members, total_users) =
        futures::try_join!(users.list_members(page), users.count_members())?;

    let counts = try_join_all(
        members
            .iter()
            .map(|member| tasks.status_counts(TaskFilter::assigned_to(member.id))),
    )
    .await?;

    let users = members
        .into_iter()
        .zip(counts)
        .map(|(user, counts)| MemberWorkload {
            user,
            pending_tasks: counts.pending,
            in_progress_tasks: counts.in_progress,
            completed_tasks: counts.completed,
        })
        .collect();

    Ok(MemberPage {
        users,
        page: page.page,
        limit: page.limit,
        total_users,
    })
}
