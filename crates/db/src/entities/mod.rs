pub mod shared_task;
pub mod task;
