use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::{PgPool, PgPoolOptions};
use sqlx::types::Json;
use sqlx::{FromRow, Postgres, QueryBuilder};
use uuid::Uuid;

use super::{Page, StatusCounts, TaskFilter, TaskStore, UserStore};
use crate::config::Config;
use crate::error::AppError;
use crate::models::{
    ChecklistItem, NewUser, Task, TaskPriority, TaskStatus, User, UserChanges, UserSummary,
};

const USER_COLUMNS: &str =
    "id, name, email, password_hash, role, image_url, created_at, updated_at";

const TASK_COLUMNS: &str = "id, title, description, priority, status, due_date, assigned_to, \
     created_by, attachments, todo_checklist, progress, created_at, updated_at";

/// Postgres-backed implementation of both store traits.
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

/// Row shape of the `tasks` table; the checklist is stored as JSONB.
#[derive(Debug, FromRow)]
struct TaskRow {
    id: Uuid,
    title: String,
    description: Option<String>,
    priority: TaskPriority,
    status: TaskStatus,
    due_date: Option<DateTime<Utc>>,
    assigned_to: Vec<Uuid>,
    created_by: Uuid,
    attachments: Vec<String>,
    todo_checklist: Json<Vec<ChecklistItem>>,
    progress: i32,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<TaskRow> for Task {
    fn from(row: TaskRow) -> Self {
        Task {
            id: row.id,
            title: row.title,
            description: row.description,
            priority: row.priority,
            status: row.status,
            due_date: row.due_date,
            assigned_to: row.assigned_to,
            created_by: row.created_by,
            attachments: row.attachments,
            todo_checklist: row.todo_checklist.0,
            progress: row.progress,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Opens the pool and applies the embedded migrations.
    pub async fn connect(database_url: &str, config: &Config) -> Result<Self, AppError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.database_max_connections)
            .connect(database_url)
            .await?;

        sqlx::migrate!("./migrations")
            .run(&pool)
            .await
            .map_err(|e| AppError::Database(format!("Failed to run migrations: {}", e)))?;
        log::info!("Database migrations applied");

        Ok(Self::new(pool))
    }
}

/// Appends the `WHERE` clause for `filter`.
fn push_task_filter(builder: &mut QueryBuilder<'_, Postgres>, filter: &TaskFilter) {
    builder.push(" WHERE TRUE");
    if let Some(user_id) = filter.assignee {
        builder
            .push(" AND ")
            .push_bind(user_id)
            .push(" = ANY(assigned_to)");
    }
    if let Some(status) = filter.status {
        builder.push(" AND status = ").push_bind(status);
    }
    if let Some(now) = filter.overdue_at {
        builder
            .push(" AND due_date < ")
            .push_bind(now)
            .push(" AND status <> 'Completed'");
    }
}

fn email_conflict(error: sqlx::Error) -> AppError {
    match AppError::from(error) {
        AppError::Conflict(_) => AppError::Conflict("Email already registered".into()),
        other => other,
    }
}

#[async_trait]
impl UserStore for PgStore {
    async fn create(&self, new_user: NewUser) -> Result<User, AppError> {
        let user = new_user.into_user();
        let sql = format!(
            "INSERT INTO users (id, name, email, password_hash, role, image_url, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(user.id)
            .bind(&user.name)
            .bind(&user.email)
            .bind(&user.password_hash)
            .bind(user.role)
            .bind(&user.image_url)
            .bind(user.created_at)
            .bind(user.updated_at)
            .fetch_one(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn find(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE id = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        let sql = format!("SELECT {USER_COLUMNS} FROM users WHERE email = $1");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn summaries(&self, ids: &[Uuid]) -> Result<Vec<UserSummary>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }
        Ok(sqlx::query_as::<_, UserSummary>(
            "SELECT id, name, email, image_url FROM users WHERE id = ANY($1)",
        )
        .bind(ids)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn list_members(&self, page: Page) -> Result<Vec<User>, AppError> {
        let sql = format!(
            "SELECT {USER_COLUMNS} FROM users WHERE role = 'member' ORDER BY seq LIMIT $1 OFFSET $2"
        );
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(page.limit)
            .bind(page.offset())
            .fetch_all(&self.pool)
            .await?)
    }

    async fn count_members(&self) -> Result<i64, AppError> {
        let (count,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM users WHERE role = 'member'")
                .fetch_one(&self.pool)
                .await?;
        Ok(count)
    }

    async fn update(&self, id: Uuid, changes: UserChanges) -> Result<Option<User>, AppError> {
        let sql = format!(
            "UPDATE users SET \
                 name = COALESCE($2, name), \
                 email = COALESCE($3, email), \
                 password_hash = COALESCE($4, password_hash), \
                 image_url = COALESCE($5, image_url), \
                 updated_at = now() \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        );
        sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .bind(changes.name)
            .bind(changes.email)
            .bind(changes.password_hash)
            .bind(changes.image_url)
            .fetch_optional(&self.pool)
            .await
            .map_err(email_conflict)
    }

    async fn delete(&self, id: Uuid) -> Result<Option<User>, AppError> {
        let sql = format!("DELETE FROM users WHERE id = $1 RETURNING {USER_COLUMNS}");
        Ok(sqlx::query_as::<_, User>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }
}

#[async_trait]
impl TaskStore for PgStore {
    async fn create(&self, task: Task) -> Result<Task, AppError> {
        let sql = format!(
            "INSERT INTO tasks ({TASK_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) \
             RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.due_date)
            .bind(&task.assigned_to)
            .bind(task.created_by)
            .bind(&task.attachments)
            .bind(Json(&task.todo_checklist))
            .bind(task.progress)
            .bind(task.created_at)
            .bind(task.updated_at)
            .fetch_one(&self.pool)
            .await?;
        Ok(row.into())
    }

    async fn find(&self, id: Uuid) -> Result<Option<Task>, AppError> {
        let sql = format!("SELECT {TASK_COLUMNS} FROM tasks WHERE id = $1");
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn list(&self, filter: TaskFilter, page: Page) -> Result<Vec<Task>, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new(format!("SELECT {TASK_COLUMNS} FROM tasks"));
        push_task_filter(&mut builder, &filter);
        builder
            .push(" ORDER BY created_at DESC, id LIMIT ")
            .push_bind(page.limit)
            .push(" OFFSET ")
            .push_bind(page.offset());

        let rows = builder
            .build_query_as::<TaskRow>()
            .fetch_all(&self.pool)
            .await?;
        Ok(rows.into_iter().map(Task::from).collect())
    }

    async fn count(&self, filter: TaskFilter) -> Result<i64, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT COUNT(*) FROM tasks");
        push_task_filter(&mut builder, &filter);

        let (count,) = builder
            .build_query_as::<(i64,)>()
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn status_counts(&self, filter: TaskFilter) -> Result<StatusCounts, AppError> {
        let mut builder = QueryBuilder::<Postgres>::new("SELECT status, COUNT(*) FROM tasks");
        push_task_filter(&mut builder, &filter);
        builder.push(" GROUP BY status");

        let rows = builder
            .build_query_as::<(TaskStatus, i64)>()
            .fetch_all(&self.pool)
            .await?;

        let mut counts = StatusCounts::default();
        for (status, count) in rows {
            counts.add(status, count);
        }
        Ok(counts)
    }

    async fn update(&self, task: &Task) -> Result<Option<Task>, AppError> {
        let sql = format!(
            "UPDATE tasks SET \
                 title = $2, description = $3, priority = $4, status = $5, due_date = $6, \
                 assigned_to = $7, attachments = $8, todo_checklist = $9, progress = $10, \
                 updated_at = now() \
             WHERE id = $1 RETURNING {TASK_COLUMNS}"
        );
        let row = sqlx::query_as::<_, TaskRow>(&sql)
            .bind(task.id)
            .bind(&task.title)
            .bind(&task.description)
            .bind(task.priority)
            .bind(task.status)
            .bind(task.due_date)
            .bind(&task.assigned_to)
            .bind(&task.attachments)
            .bind(Json(&task.todo_checklist))
            .bind(task.progress)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(Task::from))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query("DELETE FROM tasks WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}
