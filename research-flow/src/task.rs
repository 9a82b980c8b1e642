use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{context::Context, error::Result};

/// Result of a task execution
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResult {
    /// Id of the task that produced this result, filled in by the graph
    pub task_id: String,
    /// Short human-readable progress note
    pub status_message: Option<String>,
    /// Next action to take
    pub next_action: NextAction,
}

impl TaskResult {
    pub fn new(next_action: NextAction) -> Self {
        Self {
            task_id: String::new(),
            status_message: None,
            next_action,
        }
    }

    pub fn new_with_status(next_action: NextAction, status_message: impl Into<String>) -> Self {
        Self {
            task_id: String::new(),
            status_message: Some(status_message.into()),
            next_action,
        }
    }
}

/// Defines what should happen after a task completes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum NextAction {
    /// Follow the first matching outgoing edge
    Continue,
    /// Jump to a specific task by id
    GoTo(String),
    /// Stop; this task is terminal
    End,
}

/// Core trait that all tasks must implement
#[async_trait]
pub trait Task: Send + Sync {
    /// Unique identifier for this task
    fn id(&self) -> &str;

    /// Execute the task with the given context
    async fn run(&self, context: Context) -> Result<TaskResult>;
}
