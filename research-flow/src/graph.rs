use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    context::Context,
    error::{GraphError, Result},
    task::{NextAction, Task},
};

/// Upper bound on task executions per run; guards against cyclic wiring.
pub const DEFAULT_MAX_STEPS: usize = 64;

/// Type alias for edge condition functions
pub type EdgeCondition = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// Edge between tasks in the graph
#[derive(Clone)]
pub struct Edge {
    pub from: String,
    pub to: String,
    pub condition: Option<EdgeCondition>,
}

/// A graph of tasks that can be executed
pub struct Graph {
    pub id: String,
    tasks: HashMap<String, Arc<dyn Task>>,
    edges: Vec<Edge>,
    start_task_id: Option<String>,
    max_steps: usize,
}

/// Outcome of driving a graph to a terminal task
#[derive(Debug, Clone)]
pub struct ExecutionResult {
    /// Task ids in the order they ran
    pub visited: Vec<String>,
    /// Status message of the last task, if it left one
    pub status_message: Option<String>,
}

impl ExecutionResult {
    pub fn final_task_id(&self) -> Option<&str> {
        self.visited.last().map(String::as_str)
    }
}

impl Graph {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            tasks: HashMap::new(),
            edges: Vec::new(),
            start_task_id: None,
            max_steps: DEFAULT_MAX_STEPS,
        }
    }

    /// Run from the start task until a task ends the run.
    ///
    /// Tasks execute strictly one after another and share `context`. A task
    /// returning `Continue` with no matching outgoing edge also ends the run.
    pub async fn execute(&self, context: Context) -> Result<ExecutionResult> {
        let start = self
            .start_task_id
            .clone()
            .ok_or_else(|| GraphError::MissingStartTask(self.id.clone()))?;
        self.execute_from(&start, context).await
    }

    pub async fn execute_from(&self, task_id: &str, context: Context) -> Result<ExecutionResult> {
        let mut current = task_id.to_string();
        let mut visited = Vec::new();

        loop {
            if visited.len() >= self.max_steps {
                return Err(GraphError::StepLimitExceeded(self.max_steps));
            }

            let task = self
                .tasks
                .get(&current)
                .ok_or_else(|| GraphError::TaskNotFound(current.clone()))?;

            debug!(graph = %self.id, task = %current, "running task");
            let mut result = task.run(context.clone()).await?;
            result.task_id = current.clone();
            visited.push(current.clone());

            let next = match &result.next_action {
                NextAction::End => None,
                NextAction::GoTo(target) => {
                    if !self.tasks.contains_key(target) {
                        return Err(GraphError::TaskNotFound(target.clone()));
                    }
                    Some(target.clone())
                }
                NextAction::Continue => {
                    let next = self.find_next_task(&current, &context);
                    if next.is_none() {
                        warn!(graph = %self.id, task = %current, "no outgoing edge, ending run");
                    }
                    next
                }
            };

            match next {
                Some(next_task_id) => current = next_task_id,
                None => {
                    return Ok(ExecutionResult {
                        visited,
                        status_message: result.status_message,
                    });
                }
            }
        }
    }

    /// First edge leaving `current_task_id` whose condition holds, in wiring order.
    pub fn find_next_task(&self, current_task_id: &str, context: &Context) -> Option<String> {
        self.edges
            .iter()
            .filter(|edge| edge.from == current_task_id)
            .find(|edge| match &edge.condition {
                Some(condition) => condition(context),
                None => true,
            })
            .map(|edge| edge.to.clone())
    }

    pub fn start_task_id(&self) -> Option<&str> {
        self.start_task_id.as_deref()
    }
}

/// Builder for creating graphs
pub struct GraphBuilder {
    graph: Graph,
}

impl GraphBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            graph: Graph::new(id),
        }
    }

    /// Register a task; the first one added becomes the start task.
    pub fn add_task(mut self, task: Arc<dyn Task>) -> Self {
        let task_id = task.id().to_string();
        if self.graph.tasks.is_empty() {
            self.graph.start_task_id = Some(task_id.clone());
        }
        self.graph.tasks.insert(task_id, task);
        self
    }

    pub fn add_edge(mut self, from: impl Into<String>, to: impl Into<String>) -> Self {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: None,
        });
        self
    }

    /// Conditional edges are consulted in the order they were added, so add
    /// them before the unconditional default for the same source task.
    pub fn add_conditional_edge<F>(
        mut self,
        from: impl Into<String>,
        to: impl Into<String>,
        condition: F,
    ) -> Self
    where
        F: Fn(&Context) -> bool + Send + Sync + 'static,
    {
        self.graph.edges.push(Edge {
            from: from.into(),
            to: to.into(),
            condition: Some(Arc::new(condition)),
        });
        self
    }

    pub fn set_start_task(mut self, task_id: impl Into<String>) -> Self {
        let task_id = task_id.into();
        if self.graph.tasks.contains_key(&task_id) {
            self.graph.start_task_id = Some(task_id);
        }
        self
    }

    pub fn max_steps(mut self, max_steps: usize) -> Self {
        self.graph.max_steps = max_steps;
        self
    }

    pub fn build(self) -> Graph {
        self.graph
    }
}
