use crate::{
    auth::{AdminUser, AuthenticatedUser},
    error::AppError,
    reporting,
    response,
    state::AppState,
    store::Page,
};
use actix_web::{delete, get, web, HttpResponse};
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

/// Lists members with their task workload (admin only).
///
/// ## Query Parameters:
/// - `page` (optional, default 1)
/// - `limit` (optional, default 5, at most 100)
///
/// ## Responses:
/// - `200 OK`: `{ users, page, limit, totalUsers }`. An empty page is still a success,
///   with the message "No users found".
/// - `403 Forbidden`: If the caller is not an admin.
/// - `422 Unprocessable Entity`: If `page` or `limit` are out of range.
#[get("")]
pub async fn list_users(
    state: web::Data<AppState>,
    _admin: AdminUser,
    page: web::Query<Page>,
) -> Result<HttpResponse, AppError> {
    let page = page.into_inner();
    page.validate()?;

    let listing =
        reporting::users_with_workload(state.users.as_ref(), state.tasks.as_ref(), page).await?;
    let message = if listing.users.is_empty() {
        "No users found"
    } else {
        "Users retrieved successfully"
    };

    Ok(response::ok(message, listing))
}

/// Fetches a single member. Admin accounts are reported as not found.
#[get("/{id}")]
pub async fn get_user(
    state: web::Data<AppState>,
    _caller: AuthenticatedUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .find(user_id.into_inner())
        .await?
        .filter(|user| !user.is_admin())
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;

    Ok(response::ok("User retrieved successfully", json!({ "user": user })))
}

/// Deletes a user (admin only)
///
/// Tasks that reference the user keep the dangling id; task responses simply omit it.
///
/// ## Responses:
/// - `200 OK`: `{ user }`, the deleted record.
/// - `403 Forbidden`: If the caller is not an admin.
/// - `404 Not Found`: If no such user exists.
#[delete("/{id}")]
pub async fn delete_user(
    state: web::Data<AppState>,
    admin: AdminUser,
    user_id: web::Path<Uuid>,
) -> Result<HttpResponse, AppError> {
    let user = state
        .users
        .delete(user_id.into_inner())
        .await?
        .ok_or_else(|| AppError::NotFound("User not found".into()))?;
    log::info!("Admin {} deleted user {}", admin.0.id, user.id);

    Ok(response::ok("User deleted successfully", json!({ "user": user })))
}
