//! Role and relationship checks applied after authentication.

use crate::auth::extractors::AuthenticatedUser;
use crate::error::AppError;
use crate::models::Task;

pub fn authorize_admin(caller: &AuthenticatedUser) -> Result<(), AppError> {
    if caller.is_admin() {
        Ok(())
    } else {
        Err(AppError::Forbidden("Access denied, admin only".into()))
    }
}

/// Status and checklist updates are open to admins and to the task's assignees.
pub fn authorize_task_mutation(task: &Task, caller: &AuthenticatedUser) -> Result<(), AppError> {
    if caller.is_admin() || task.is_assigned_to(caller.id) {
        Ok(())
    } else {
        Err(AppError::Forbidden("Not authorized to update this task".into()))
    }
}
