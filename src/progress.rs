//! Checklist-driven progress tracking.
//!
//! `progress` is the half-up rounded percentage of completed checklist items and
//! `status` is a function of it. The status override is the single exception: forcing
//! a task to `Completed` completes the whole checklist instead.

use crate::models::{ChecklistItem, Task, TaskStatus};

/// Result of deriving progress from a checklist.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Derived {
    pub progress: i32,
    pub status: TaskStatus,
}

/// Computes `{progress, status}` from checklist completion. Empty checklists are `{0, Pending}`.
pub fn derive_from_checklist(checklist: &[ChecklistItem]) -> Derived {
    let total = checklist.len() as u64;
    let done = checklist.iter().filter(|item| item.completed).count() as u64;

    // round(done / total * 100), half-up, without floats
    let progress = if total == 0 {
        0
    } else {
        ((done * 200 + total) / (total * 2)) as i32
    };

    Derived {
        progress,
        status: status_for_progress(progress),
    }
}

pub fn status_for_progress(progress: i32) -> TaskStatus {
    match progress {
        p if p <= 0 => TaskStatus::Pending,
        p if p >= 100 => TaskStatus::Completed,
        _ => TaskStatus::InProgress,
    }
}

/// Sets an explicit status. `None` leaves the task unchanged; `Completed` marks every
/// checklist item done and pins progress to 100.
pub fn apply_status_override(task: &mut Task, new_status: Option<TaskStatus>) {
    let Some(status) = new_status else {
        return;
    };

    task.status = status;
    if status == TaskStatus::Completed {
        for item in task.todo_checklist.iter_mut() {
            item.completed = true;
        }
        task.progress = 100;
    }
}

/// Replaces the checklist (when one is given) and re-derives progress and status.
pub fn apply_checklist_update(task: &mut Task, checklist: Option<Vec<ChecklistItem>>) {
    if let Some(checklist) = checklist {
        task.todo_checklist = checklist;
    }
    task.recompute_progress();
}
