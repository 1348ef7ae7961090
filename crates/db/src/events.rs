pub const EVENT_TASK_CREATED: &str = "task.created";
pub const EVENT_TASK_UPDATED: &str = "task.updated";
pub const EVENT_TASK_DELETED: &str = "task.deleted";

pub const EVENT_SHARED_TASK_CREATED: &str = "shared_task.created";
pub const EVENT_SHARED_TASK_UPDATED: &str = "shared_task.updated";
pub const EVENT_SHARED_TASK_DELETED: &str = "shared_task.deleted";
