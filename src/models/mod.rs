pub mod task;
pub mod user;

pub use task::{
    parse_due_date, ChecklistItem, ChecklistUpdateInput, CreateTaskInput, StatusUpdateInput, Task,
    TaskPriority, TaskStatus, TaskView, UpdateTaskInput,
};
pub use user::{NewUser, Role, User, UserChanges, UserSummary};
