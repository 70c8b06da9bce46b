use std::collections::HashMap;

use crate::{
    auth::{policy, AdminUser, AuthenticatedUser},
    error::AppError,
    models::{
        ChecklistUpdateInput, CreateTaskInput, StatusUpdateInput, Task, TaskStatus, TaskView,
        UpdateTaskInput, UserSummary,
    },
    progress,
    reporting::{self, Scope},
    response,
    state::AppState,
    store::{Page, StatusCounts, UserStore},
};
use actix_web::{delete, get, patch, post, web, HttpResponse};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// `GET /api/tasks` query string.
#[derive(Debug, Default, Deserialize)]
pub struct TaskListQuery {
    pub page: Option<i64>,
    pub limit: Option<i64>,
    pub status: Option<TaskStatus>,
}

impl TaskListQuery {
    fn page(&self) -> Page {
        let defaults = Page::default();
        Page::new(
            self.page.unwrap_or(defaults.page),
            self.limit.unwrap_or(defaults.limit),
        )
    }
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskListData {
    pub tasks: Vec<TaskView>,
    pub page: i64,
    pub limit: i64,
    /// Tasks in scope matching the status filter.
    pub total_tasks: i64,
    /// Tasks in scope regardless of the status filter.
    pub tasks_count: i64,
    pub status_summary: StatusCounts,
}

fn scope_for(caller: &AuthenticatedUser) -> Scope {
    if caller.is_admin() {
        Scope::All
    } else {
        Scope::AssignedTo(caller.id)
    }
}

/// Resolves `assignedTo` / `createdBy` ids with a single user lookup.
async fn populate(users: &dyn UserStore, tasks: Vec<Task>) -> Result<Vec<TaskView>, AppError> {
    let mut ids: Vec<Uuid> = tasks.iter().flat_map(|task| task.referenced_users()).collect();
    ids.sort();
    ids.dedup();

    let summaries: HashMap<Uuid, UserSummary> = users
        .summaries(&ids)
        .await?
        .into_iter()
        .map(|summary| (summary.id, summary))
        .collect();

    Ok(tasks
        .into_iter()
        .map(|task| TaskView::new(task, &summaries))
        .collect())
}

async fn populate_one(users: &dyn UserStore, task: Task) -> Result<TaskView, AppError> {
    populate(users, vec![task])
        .await?
        .pop()
        .ok_or_else(|| AppError::Internal("Task view was not built".into()))
}

async fn find_task(state: &AppState, task_id: Uuid) -> Result<Task, AppError> {
    state
        .tasks
        .find(task_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))
}

async fn save_task(state: &AppState, task: &Task) -> Result<TaskView, AppError> {
    let saved = state
        .tasks
        .update(task)
        .await?
        .ok_or_else(|| AppError::NotFound("Task not found".into()))?;
    populate_one(state.users.as_ref(), saved).await
}

/// Lists tasks visible to the caller.
///
/// Admins see every task; members see the tasks assigned to them. Tasks are ordered
/// newest first.
///
/// ## Query Parameters:
/// - `status` (optional): `Pending`, `In Progress` or `Completed`.
/// - `page` (optional, default 1), `limit` (optional, default 5, at most 100).
///
/// ## Responses:
/// - `200 OK`: `{ tasks, page, limit, totalTasks, tasksCount, statusSummary }`
/// - `401 Unauthorized`: If the request lacks a valid authentication token.
/// - `422 Unprocessable Entity`: If `page` or `limit` are out of range.
#[get("")]
pub async fn get_tasks(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    query: web::Query<TaskListQuery>,
) -> Result<HttpResponse, AppError> {
    let page = query.page();
    page.validate()?;

    let scope = scope_for(&caller).filter();
    let filtered = scope.with_status(query.status);

    let (tasks, total_tasks, status_summary) = futures::try_join!(
        state.tasks.list(filtered, page),
        state.tasks.count(filtered),
        state.tasks.status_counts(scope),
    )?;
    let tasks = populate(state.users.as_ref(), tasks).await?;

    Ok(response::ok(
        "Tasks retrieved successfully",
        TaskListData {
            tasks,
            page: page.page,
            limit: page.limit,
            total_tasks,
            tasks_count: status_summary.total(),
            status_summary,
        },
    ))
}

/// Creates a task (admin only)
///
/// `createdBy` is the caller. Progress and status are derived from `todoChecklist`;
/// an explicit `status` is applied on top, and `Completed` completes the checklist.
///
/// ## Responses:
/// - `201 Created`: `{ task }`
/// - `400 Bad Request`: Malformed JSON, unknown enum value or unparsable `dueDate`.
/// - `403 Forbidden`: If the caller is not an admin.
/// - `422 Unprocessable Entity`: If title, description, due date or checklist fail validation.
#[post("")]
pub async fn create_task(
    state: web::Data<AppState>,
    admin: AdminUser,
    task_data: web::Json<CreateTaskInput>,
) -> Result<HttpResponse, AppError> {
    task_data.validate()?;

    let task = state
        .tasks
        .create(Task::new(task_data.into_inner(), admin.0.id))
        .await?;
    log::info!("Admin {} created task {}", admin.0.id, task.id);

    let view = populate_one(state.users.as_ref(), task).await?;
    Ok(response::created(
        "Task created successfully",
        json!({ "task": view }),
    ))
}

/// Aggregates over every task (admin only).
#[get("/dashboard-data")]
pub async fn dashboard_data(
    state: web::Data<AppState>,
    _admin: AdminUser,
) -> Result<HttpResponse, AppError> {
    let summary = reporting::summary(state.tasks.as_ref(), Scope::All, Utc::now()).await?;
    Ok(response::ok("Dashboard data retrieved", summary))
}

/// Aggregates over the tasks assigned to the caller.
#[get("/user-data")]
pub async fn user_dashboard_data(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
) -> Result<HttpResponse, AppError> {
    let summary =
        reporting::summary(state.tasks.as_ref(), Scope::AssignedTo(caller.id), Utc::now())
            .await?;
    Ok(response::ok("User dashboard data retrieved", summary))
}

/// Retrieves a single task by id.
///
/// ## Responses:
/// - `200 OK`: `{ task }` with users populated.
/// - `400 Bad Request`: If the id is not a UUID.
/// - `404 Not Found`: If the task does not exist.
#[get("/{id}")]
pub async fn get_task(
    state: web::Data<AppState>,
    _caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let task = find_task(&state, task_id.into_inner()).await?;
    let view = populate_one(state.users.as_ref(), task).await?;
    Ok(response::ok("Task retrieved successfully", json!({ "task": view })))
}

/// Partially updates a task (admin only)
///
/// Absent fields are left untouched. A new `todoChecklist` re-derives progress and
/// status; an explicit `status` goes through the status override afterwards.
///
/// ## Responses:
/// - `200 OK`: `{ task }`
/// - `403 Forbidden`: If the caller is not an admin.
/// - `404 Not Found`: If the task does not exist.
/// - `422 Unprocessable Entity`: If a supplied field fails validation.
#[patch("/{id}")]
pub async fn update_task(
    state: web::Data<AppState>,
    _admin: AdminUser,
    task_id: web::Path<Uuid>,
    task_data: web::Json<UpdateTaskInput>,
) -> Result<HttpResponse, AppError> {
    task_data.validate()?;

    let mut task = find_task(&state, task_id.into_inner()).await?;
    task.apply_update(task_data.into_inner());
    let view = save_task(&state, &task).await?;

    Ok(response::ok("Task updated successfully", json!({ "task": view })))
}

/// Sets the status of a task (assignees and admins)
///
/// Setting `Completed` marks every checklist item done and progress to 100. Other
/// statuses leave the checklist and progress as they are.
///
/// ## Responses:
/// - `200 OK`: `{ task }`
/// - `403 Forbidden`: If the caller is neither an admin nor assigned to the task.
/// - `404 Not Found`: If the task does not exist.
#[patch("/status/{id}")]
pub async fn update_task_status(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    status_data: web::Json<StatusUpdateInput>,
) -> Result<HttpResponse, AppError> {
    let mut task = find_task(&state, task_id.into_inner()).await?;
    policy::authorize_task_mutation(&task, &caller)?;

    let status = status_data.into_inner().status;
    progress::apply_status_override(&mut task, status);
    let view = save_task(&state, &task).await?;
    log::info!("User {} set task {} to {}", caller.id, task.id, task.status);

    Ok(response::ok("Task status updated", json!({ "task": view })))
}

/// Replaces the checklist of a task (assignees and admins)
///
/// Progress and status are re-derived from the new checklist.
///
/// ## Responses:
/// - `200 OK`: `{ task }`
/// - `403 Forbidden`: If the caller is neither an admin nor assigned to the task.
/// - `404 Not Found`: If the task does not exist.
/// - `422 Unprocessable Entity`: If a checklist item has no text.
#[patch("/checklist/{id}")]
pub async fn update_task_checklist(
    state: web::Data<AppState>,
    caller: AuthenticatedUser,
    task_id: web::Path<Uuid>,
    checklist_data: web::Json<ChecklistUpdateInput>,
) -> Result<HttpResponse, AppError> {
    checklist_data.validate()?;

    let mut task = find_task(&state, task_id.into_inner()).await?;
    policy::authorize_task_mutation(&task, &caller)?;

    progress::apply_checklist_update(&mut task, checklist_data.into_inner().todo_checklist);
    let view = save_task(&state, &task).await?;

    Ok(response::ok("Task checklist updated", json!({ "task": view })))
}

/// Deletes a task (admin only).
#[delete("/{id}")]
pub async fn delete_task(
    state: web::Data<AppState>,
    admin: AdminUser,
    task_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let task_id = task_id.into_inner();
    if !state.tasks.delete(task_id).await? {
        return Err(AppError::NotFound("Task not found".into()));
    }
    log::info!("Admin {} deleted task {}", admin.0.id, task_id);

    Ok(response::ok("Task deleted successfully", ()))
}
