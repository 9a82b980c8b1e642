use thiserror::Error;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Errors raised while wiring or driving a task graph
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("task not found: {0}")]
    TaskNotFound(String),

    #[error("graph '{0}' has no start task")]
    MissingStartTask(String),

    #[error("context error: {0}")]
    ContextError(String),

    #[error("graph exceeded {0} steps without reaching an end task")]
    StepLimitExceeded(usize),

    #[error("task '{task_id}' failed: {source}")]
    TaskFailed {
        task_id: String,
        #[source]
        source: BoxError,
    },
}

impl GraphError {
    pub fn task_failed(task_id: impl Into<String>, source: impl Into<BoxError>) -> Self {
        Self::TaskFailed {
            task_id: task_id.into(),
            source: source.into(),
        }
    }

    /// Borrow the error a task failed with, typed as `E` if it is one.
    pub fn task_source<E: std::error::Error + 'static>(&self) -> Option<&E> {
        match self {
            Self::TaskFailed { source, .. } => source.downcast_ref::<E>(),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, GraphError>;
