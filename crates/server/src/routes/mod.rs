pub mod board;
pub mod health;
pub mod notifications;
pub mod session;
pub mod shared_tasks;
pub mod tasks;
