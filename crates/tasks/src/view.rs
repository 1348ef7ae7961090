//! Display-ready projection of both task collections.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumString};
use ts_rs::TS;
use uuid::Uuid;

use crate::record::{SharedTask, Task, TaskStatus};

#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, Display, EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Priority {
    Low,
    #[default]
    Medium,
    High,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
pub struct TaskView {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub priority: Priority,
    pub completed: bool,
    pub status: TaskStatus,
    pub created_at: DateTime<Utc>,
    pub owner: String,
    pub shared: bool,
    pub collaborators: Vec<String>,
    pub due_date: Option<DateTime<Utc>>,
}

impl From<&Task> for TaskView {
    fn from(task: &Task) -> Self {
        Self {
            id: task.id,
            title: task.title.clone(),
            description: task.description.clone().unwrap_or_default(),
            priority: Priority::default(),
            completed: task.status.is_completed(),
            status: task.status,
            created_at: task.created_at,
            owner: task.owner_id.clone(),
            shared: false,
            collaborators: Vec::new(),
            due_date: task.due_date,
        }
    }
}

impl From<&SharedTask> for TaskView {
    fn from(task: &SharedTask) -> Self {
        Self {
            id: task.id,
            title: task.task_title.clone(),
            description: task.task_description.clone().unwrap_or_default(),
            priority: Priority::default(),
            completed: task.status.is_completed(),
            status: task.status,
            created_at: task.created_at,
            owner: task.created_by.clone(),
            shared: true,
            collaborators: task.shared_with.clone(),
            due_date: None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TaskSource<'a> {
    Personal(&'a [Task]),
    Shared(&'a [SharedTask]),
}

pub fn normalize(source: TaskSource<'_>) -> Vec<TaskView> {
    match source {
        TaskSource::Personal(tasks) => tasks.iter().map(TaskView::from).collect(),
        TaskSource::Shared(tasks) => tasks.iter().map(TaskView::from).collect(),
    }
}

#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    TS,
    Display,
    EnumString,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Filter {
    #[default]
    All,
    Pending,
    Completed,
    Shared,
}

impl Filter {
    /// Unknown keys select everything.
    pub fn from_key(key: &str) -> Self {
        key.trim().to_ascii_lowercase().parse().unwrap_or_default()
    }

    pub fn matches(self, view: &TaskView) -> bool {
        match self {
            Filter::All => true,
            Filter::Pending => !view.completed,
            Filter::Completed => view.completed,
            Filter::Shared => view.shared,
        }
    }
}

pub fn filter(views: &[TaskView], filter: Filter) -> Vec<TaskView> {
    views
        .iter()
        .filter(|view| filter.matches(view))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS)]
pub struct TaskCounts {
    pub all: usize,
    pub pending: usize,
    pub completed: usize,
    pub shared: usize,
}

pub fn count_by_category(views: &[TaskView]) -> TaskCounts {
    views.iter().fold(TaskCounts::default(), |mut counts, view| {
        counts.all += 1;
        if view.completed {
            counts.completed += 1;
        } else {
            counts.pending += 1;
        }
        if view.shared {
            counts.shared += 1;
        }
        counts
    })
}
